/// One of the six held-key movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Movement {
    /// WASD for the ground plane, E/Q for up/down. Case-insensitive.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(Self::Forward),
            's' => Some(Self::Backward),
            'a' => Some(Self::Left),
            'd' => Some(Self::Right),
            'e' => Some(Self::Up),
            'q' => Some(Self::Down),
            _ => None,
        }
    }
}

/// A high-level navigation action produced from raw input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Rotate the view by the given angles in radians.
    Look { pitch: f32, yaw: f32 },
    /// A movement key went down or up.
    Move { movement: Movement, pressed: bool },
    /// Input that is not bound to anything.
    Noop,
}

impl Action {
    /// Map a key press/release to an action.
    pub fn from_key(key: char, pressed: bool) -> Self {
        match Movement::from_key(key) {
            Some(movement) => Self::Move { movement, pressed },
            None => Self::Noop,
        }
    }
}
