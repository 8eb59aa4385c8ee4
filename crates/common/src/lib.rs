//! Shared types used across the heightscape crates.
//!
//! # Invariants
//! - Nothing here touches the GPU; every type is plain data plus math.
//! - The camera is a provider of view/projection matrices only. Input mapping
//!   lives in `heightscape-input`, drawing in the render crates.

pub mod camera;
pub mod types;

pub use camera::Camera;
pub use types::{Extent, Transform};
