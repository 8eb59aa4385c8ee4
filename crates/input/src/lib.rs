//! Input: pointer drags and WASD+EQ keys mapped to camera navigation.
//!
//! # Invariants
//! - Raw window events never reach the camera directly; they become
//!   [`Action`]s, and only [`Navigator::update`] moves the camera.
//! - Navigation is frame-stepped: one `update` per displayed frame.

pub mod action;
pub mod navigation;

pub use action::{Action, Movement};
pub use navigation::{MovementFlags, Navigator, PointerDrag};

pub fn crate_info() -> &'static str {
    "heightscape-input v0.1.0"
}
