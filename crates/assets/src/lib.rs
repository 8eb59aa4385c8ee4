//! Asset loading: ground/cube textures and sky cube faces.
//!
//! Assets are plain files under one root directory. Every loader here has a
//! documented fallback so a missing file never stops the demo from starting:
//!
//! - ground texture missing: a 1x1 colour-filled texture
//! - cube texture missing: the ground texture is reused
//! - any sky face missing or mismatched: a 1x1 solid cube map
//!
//! The renderer consumes the decoded RGBA8 images; nothing here touches the GPU.

use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Cube-map face suffixes in GPU layer order: +X, -X, +Y, -Y, +Z, -Z.
pub const SKY_FACE_SUFFIXES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// Fill colour for a missing ground texture.
pub const GROUND_FALLBACK_RGBA: [u8; 4] = [110, 118, 96, 255];

/// Fill colour for a missing sky.
pub const SKY_FALLBACK_RGBA: [u8; 4] = [150, 180, 215, 255];

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("sky face {path} is {actual:?}, expected square {expected}x{expected}")]
    FaceMismatch {
        path: PathBuf,
        expected: u32,
        actual: (u32, u32),
    },
}

/// File locations of the demo's assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub heightmap: String,
    pub ground_texture: String,
    pub cube_texture: String,
    /// Prefix of the six sky faces, e.g. `sky-cube-map-` → `sky-cube-map-px.jpg`.
    pub sky_prefix: String,
    pub sky_extension: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::with_root("assets")
    }
}

impl AssetPaths {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            heightmap: "height-map.png".into(),
            ground_texture: "ground.jpg".into(),
            cube_texture: "Stone.jpg".into(),
            sky_prefix: "sky-cube-map-".into(),
            sky_extension: "jpg".into(),
        }
    }

    pub fn heightmap_path(&self) -> PathBuf {
        self.root.join(&self.heightmap)
    }

    pub fn ground_texture_path(&self) -> PathBuf {
        self.root.join(&self.ground_texture)
    }

    pub fn cube_texture_path(&self) -> PathBuf {
        self.root.join(&self.cube_texture)
    }

    /// Paths of the six sky faces in layer order.
    pub fn sky_face_paths(&self) -> [PathBuf; 6] {
        SKY_FACE_SUFFIXES.map(|suffix| {
            self.root
                .join(format!("{}{suffix}.{}", self.sky_prefix, self.sky_extension))
        })
    }
}

pub fn crate_info() -> &'static str {
    "heightscape-assets v0.1.0"
}

/// Decode an image file to RGBA8.
pub fn load_rgba(path: impl AsRef<Path>) -> Result<RgbaImage, AssetError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgba8())
}

/// Decode six square faces of identical size.
pub fn load_cube_faces(paths: &[PathBuf; 6]) -> Result<[RgbaImage; 6], AssetError> {
    let mut faces: [RgbaImage; 6] = std::array::from_fn(|_| RgbaImage::new(0, 0));
    let mut side = None;
    for (slot, path) in faces.iter_mut().zip(paths) {
        let face = load_rgba(path)?;
        // The first face decides the size every other face must match.
        let expected = *side.get_or_insert(face.width());
        if face.dimensions() != (expected, expected) {
            return Err(AssetError::FaceMismatch {
                path: path.clone(),
                expected,
                actual: face.dimensions(),
            });
        }
        *slot = face;
    }
    Ok(faces)
}

/// 1x1 image of a single colour.
pub fn solid_rgba(rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(1, 1, image::Rgba(rgba))
}

/// All textures the scene samples, already decoded.
#[derive(Debug, Clone)]
pub struct SceneTextures {
    pub ground: RgbaImage,
    pub cube: RgbaImage,
    pub sky_faces: [RgbaImage; 6],
    /// The cube texture failed to load and `cube` is a copy of `ground`.
    pub cube_reuses_ground: bool,
    pub ground_is_fallback: bool,
    pub sky_is_fallback: bool,
}

impl SceneTextures {
    /// Load every texture, falling back per asset. Never fails.
    pub fn load(paths: &AssetPaths) -> Self {
        let (ground, ground_is_fallback) = match load_rgba(paths.ground_texture_path()) {
            Ok(img) => (img, false),
            Err(e) => {
                tracing::error!("{e}; using a colour-filled ground texture");
                (solid_rgba(GROUND_FALLBACK_RGBA), true)
            }
        };

        let (cube, cube_reuses_ground) = match load_rgba(paths.cube_texture_path()) {
            Ok(img) => (img, false),
            Err(e) => {
                tracing::error!("{e}; cube reuses the ground texture");
                (ground.clone(), true)
            }
        };

        let (sky_faces, sky_is_fallback) = match load_cube_faces(&paths.sky_face_paths()) {
            Ok(faces) => (faces, false),
            Err(e) => {
                tracing::error!("{e}; using a solid sky");
                (std::array::from_fn(|_| solid_rgba(SKY_FALLBACK_RGBA)), true)
            }
        };

        tracing::info!(
            ground = ?ground.dimensions(),
            cube = ?cube.dimensions(),
            sky = sky_faces[0].width(),
            "scene textures loaded"
        );

        Self {
            ground,
            cube,
            sky_faces,
            cube_reuses_ground,
            ground_is_fallback,
            sky_is_fallback,
        }
    }
}
