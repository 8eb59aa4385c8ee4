use glam::{Mat3, Vec2, Vec3, Vec4};

/// Two triangles covering NDC as `[x, y, u, v]`.
///
/// Texture coordinates use a top-left origin: NDC `(-1, 1)` samples `(0, 0)`.
pub const FULLSCREEN_QUAD: [[f32; 4]; 6] = [
    [-1.0, 1.0, 0.0, 0.0],
    [-1.0, -1.0, 0.0, 1.0],
    [1.0, -1.0, 1.0, 1.0],
    [-1.0, 1.0, 0.0, 0.0],
    [1.0, -1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0, 0.0],
];

/// CPU reference of the full-screen sepia + vignette effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SepiaVignette;

impl SepiaVignette {
    pub const SEPIA_R: Vec3 = Vec3::new(0.393, 0.769, 0.189);
    pub const SEPIA_G: Vec3 = Vec3::new(0.349, 0.686, 0.168);
    pub const SEPIA_B: Vec3 = Vec3::new(0.272, 0.534, 0.131);
    pub const VIGNETTE_SCALE: f32 = 15.0;
    pub const VIGNETTE_POWER: f32 = 0.25;

    /// Rows are the output channels. Not clamped.
    pub fn sepia_matrix() -> Mat3 {
        Mat3::from_cols(Self::SEPIA_R, Self::SEPIA_G, Self::SEPIA_B).transpose()
    }

    pub fn sepia(rgb: Vec3) -> Vec3 {
        Self::sepia_matrix() * rgb
    }

    /// 1 near the centre, falling to 0 on every edge.
    pub fn vignette(texcoord: Vec2) -> f32 {
        let uv = texcoord * (Vec2::ONE - Vec2::new(texcoord.y, texcoord.x));
        (uv.x * uv.y * Self::VIGNETTE_SCALE).powf(Self::VIGNETTE_POWER)
    }

    /// Output colour for `color` sampled at `texcoord`; alpha is always 1.
    pub fn apply(color: Vec4, texcoord: Vec2) -> Vec4 {
        (Self::sepia(color.truncate()) * Self::vignette(texcoord)).extend(1.0)
    }
}
