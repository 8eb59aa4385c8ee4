use glam::{Mat4, Vec3};
use heightscape_common::{Camera, Extent};

use crate::action::{Action, Movement};

/// Drag sensitivity: radians per full window width/height of pointer travel.
const DRAG_SENSITIVITY: f32 = 1.025;

/// Pitch is clamped to this many radians above/below the horizon.
const PITCH_LIMIT: f32 = 1.5;

/// Which movement keys are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MovementFlags {
    pub fn set(&mut self, movement: Movement, pressed: bool) {
        let flag = match movement {
            Movement::Forward => &mut self.forward,
            Movement::Backward => &mut self.backward,
            Movement::Left => &mut self.left,
            Movement::Right => &mut self.right,
            Movement::Up => &mut self.up,
            Movement::Down => &mut self.down,
        };
        *flag = pressed;
    }

    /// Sum of the held directions. Not normalized: diagonal movement is faster.
    pub fn direction(&self, forward: Vec3, right: Vec3) -> Vec3 {
        let mut m = Vec3::ZERO;
        if self.forward {
            m += forward;
        }
        if self.backward {
            m -= forward;
        }
        if self.right {
            m += right;
        }
        if self.left {
            m -= right;
        }
        if self.up {
            m += Vec3::Y;
        }
        if self.down {
            m -= Vec3::Y;
        }
        m
    }
}

/// Pointer button state and last known position, for drag-to-look.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerDrag {
    pressed: bool,
    last_x: f32,
    last_y: f32,
}

impl PointerDrag {
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn on_click(&mut self, x: f32, y: f32, down: bool) {
        self.last_x = x;
        self.last_y = y;
        self.pressed = down;
    }

    /// Pointer moved to `(x, y)` on a surface of size `extent`.
    ///
    /// Moving up pitches up and moving left yaws left, scaled so that a drag
    /// across the whole surface turns by [`DRAG_SENSITIVITY`] radians.
    pub fn on_drag(&mut self, x: f32, y: f32, extent: Extent) -> Action {
        if !self.pressed {
            return Action::Noop;
        }
        let extent = extent.at_least_one();
        let pitch = DRAG_SENSITIVITY * (self.last_y - y) / extent.height as f32;
        let yaw = DRAG_SENSITIVITY * (self.last_x - x) / extent.width as f32;
        self.last_x = x;
        self.last_y = y;
        Action::Look { pitch, yaw }
    }
}

/// First-person navigation state applied to a [`Camera`] once per frame.
#[derive(Debug, Clone)]
pub struct Navigator {
    pitch: f32,
    yaw: f32,
    pitch_delta: f32,
    yaw_delta: f32,
    pub flags: MovementFlags,
    pub pointer: PointerDrag,
    /// World units moved per update while a key is held.
    pub speed: f32,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            pitch: 0.4,
            yaw: 0.0,
            pitch_delta: 0.0,
            yaw_delta: 0.0,
            flags: MovementFlags::default(),
            pointer: PointerDrag::default(),
            speed: 0.5,
        }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Feed one action. Look deltas accumulate until the next [`Navigator::update`].
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Look { pitch, yaw } => {
                self.pitch_delta += pitch;
                self.yaw_delta += yaw;
            }
            Action::Move { movement, pressed } => {
                tracing::trace!(?movement, pressed, "movement key");
                self.flags.set(movement, pressed);
            }
            Action::Noop => {}
        }
    }

    /// Apply the accumulated look deltas and held movement keys to `camera`.
    pub fn update(&mut self, camera: &mut Camera) {
        self.pitch = (self.pitch + self.pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw += self.yaw_delta;
        self.pitch_delta = 0.0;
        self.yaw_delta = 0.0;

        let rotation = Mat4::from_rotation_y(self.yaw) * Mat4::from_rotation_x(self.pitch);
        let location = camera.location();
        camera.set_target(location - Vec3::Z);
        camera.rotate(rotation);

        let forward = camera.forward();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let movement = self.flags.direction(forward, right);
        if movement.length_squared() > 0.0 {
            camera.move_by(movement * self.speed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(location: Vec3) -> Camera {
        let mut camera = Camera::new();
        camera.set_location(location);
        camera
    }

    #[test]
    fn drag_produces_scaled_look() {
        let mut pointer = PointerDrag::default();
        assert_eq!(pointer.on_drag(5.0, 5.0, Extent::new(100, 50)), Action::Noop);

        pointer.on_click(50.0, 25.0, true);
        let action = pointer.on_drag(40.0, 35.0, Extent::new(100, 50));
        let Action::Look { pitch, yaw } = action else {
            panic!("expected look, got {action:?}");
        };
        assert!((pitch - 1.025 * -10.0 / 50.0).abs() < 1e-6);
        assert!((yaw - 1.025 * 10.0 / 100.0).abs() < 1e-6);

        pointer.on_click(0.0, 0.0, false);
        assert!(!pointer.is_pressed());
    }

    #[test]
    fn pitch_is_clamped() {
        let mut nav = Navigator::new();
        let mut camera = camera_at(Vec3::new(0.0, 30.0, 0.0));
        nav.apply(Action::Look {
            pitch: 10.0,
            yaw: 0.0,
        });
        nav.update(&mut camera);
        assert_eq!(nav.pitch(), 1.5);

        nav.apply(Action::Look {
            pitch: -20.0,
            yaw: 0.0,
        });
        nav.update(&mut camera);
        assert_eq!(nav.pitch(), -1.5);
    }

    #[test]
    fn level_view_looks_down_negative_z() {
        let mut nav = Navigator::new();
        nav.apply(Action::Look {
            pitch: -0.4,
            yaw: 0.0,
        });
        let mut camera = camera_at(Vec3::new(0.0, 30.0, 0.0));
        nav.update(&mut camera);
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn initial_pitch_looks_up() {
        let mut nav = Navigator::new();
        let mut camera = camera_at(Vec3::new(0.0, 30.0, 0.0));
        nav.update(&mut camera);
        let f = camera.forward();
        assert!((f.y - 0.4_f32.sin()).abs() < 1e-5);
        assert!((f.z + 0.4_f32.cos()).abs() < 1e-5);
    }

    #[test]
    fn held_keys_move_camera() {
        let mut nav = Navigator::new();
        nav.apply(Action::Look {
            pitch: -0.4,
            yaw: 0.0,
        });
        nav.apply(Action::from_key('w', true));
        nav.apply(Action::from_key('e', true));
        let mut camera = camera_at(Vec3::new(0.0, 30.0, 0.0));
        nav.update(&mut camera);
        assert!(camera.location().abs_diff_eq(Vec3::new(0.0, 30.5, -0.5), 1e-5));

        nav.apply(Action::from_key('w', false));
        nav.apply(Action::from_key('e', false));
        let before = camera.location();
        nav.update(&mut camera);
        assert_eq!(camera.location(), before);
    }

    #[test]
    fn strafe_uses_right_vector() {
        let mut flags = MovementFlags::default();
        flags.set(Movement::Right, true);
        flags.set(Movement::Down, true);
        let forward = Vec3::NEG_Z;
        let right = forward.cross(Vec3::Y);
        assert_eq!(flags.direction(forward, right), Vec3::new(1.0, -1.0, 0.0));
    }
}
