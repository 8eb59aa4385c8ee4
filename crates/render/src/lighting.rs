use glam::{Mat4, Vec3, Vec4};

/// One directional light plus a constant ambient term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// World-space direction the light travels in.
    pub direction: Vec3,
    pub color: Vec3,
    pub ambient: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.5, -1.0, 0.5),
            color: Vec3::new(1.0, 0.95, 0.9),
            ambient: Vec3::new(0.2, 0.2, 0.3),
        }
    }
}

impl DirectionalLight {
    /// Light direction in view space (`w = 0`, so translation is ignored).
    pub fn view_direction(&self, view: &Mat4) -> Vec3 {
        view.transform_vector3(self.direction)
    }

    /// Fragment colour for a view-space normal, mirroring the scene shader.
    pub fn shade(&self, normal: Vec3, light_dir: Vec3, texel: Vec4, alpha: f32) -> Vec4 {
        let n = normal.normalize_or_zero();
        let diffuse = n.dot((-light_dir).normalize_or_zero()).max(0.0);
        let rgb = (self.ambient + diffuse * self.color) * texel.truncate();
        rgb.extend(texel.w * alpha)
    }
}
