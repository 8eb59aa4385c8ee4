//! Terrain: heightmap-driven grid mesh generation.
//!
//! # Invariants
//! - Vertex normals come from the 4-neighbourhood heights only (finite
//!   differences), never from triangle geometry.
//! - Heights are all known before the first normal is computed.
//! - A heightmap that fails to load degrades to flat terrain; it never aborts.

mod heightmap;
mod mesh;

pub use heightmap::Heightmap;
pub use mesh::{HeightSource, HeightfieldMesh, MeshStats, SEA_LEVEL_BIAS, TerrainConfig};

use std::path::PathBuf;

/// Errors from terrain generation.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("failed to load heightmap {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid terrain configuration: {0}")]
    InvalidConfig(String),
}

pub fn crate_info() -> &'static str {
    "heightscape-terrain v0.1.0"
}
