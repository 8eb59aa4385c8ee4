use glam::{Mat4, Vec3};

/// Look-at camera with a location, a target point and perspective parameters.
///
/// The renderer only reads [`Camera::view_matrix`] and
/// [`Camera::projection_matrix`]. Navigation code moves the location and
/// target through `rotate`/`move_by`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    location: Vec3,
    target: Vec3,
    pub fov: f32,
    pub ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            target: Vec3::NEG_Z,
            fov: 60.0_f32.to_radians(),
            ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_location(&mut self, location: Vec3) {
        self.location = location;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
    }

    /// Unit vector from the location towards the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.location).normalize_or(Vec3::NEG_Z)
    }

    /// Rotate the target around the location by `rotation`.
    pub fn rotate(&mut self, rotation: Mat4) {
        let offset = self.target - self.location;
        self.target = self.location + rotation.transform_vector3(offset);
    }

    /// Translate location and target together.
    pub fn move_by(&mut self, delta: Vec3) {
        self.location += delta;
        self.target += delta;
    }

    /// World-to-view matrix (the inverse of the camera's own transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.location, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.ratio, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = Camera::default();
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
        assert_eq!(cam.forward(), Vec3::NEG_Z);
    }

    #[test]
    fn view_matrix_inverts_camera_transform() {
        let mut cam = Camera::new();
        cam.set_location(Vec3::new(0.0, 30.0, 0.0));
        cam.set_target(Vec3::new(0.0, 30.0, -1.0));
        let eye_in_view = cam.view_matrix().transform_point3(cam.location());
        assert!(eye_in_view.abs_diff_eq(Vec3::ZERO, 1e-5));
        let ahead = cam.view_matrix().transform_point3(Vec3::new(0.0, 30.0, -5.0));
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));
    }

    #[test]
    fn move_by_keeps_direction() {
        let mut cam = Camera::new();
        let before = cam.forward();
        cam.move_by(Vec3::new(3.0, 1.0, -2.0));
        assert_eq!(cam.location(), Vec3::new(3.0, 1.0, -2.0));
        assert!(cam.forward().abs_diff_eq(before, 1e-6));
    }

    #[test]
    fn rotate_turns_target_about_location() {
        let mut cam = Camera::new();
        cam.set_location(Vec3::new(1.0, 2.0, 3.0));
        cam.set_target(Vec3::new(1.0, 2.0, 2.0));
        cam.rotate(Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2));
        assert!(cam.target().abs_diff_eq(Vec3::new(0.0, 2.0, 3.0), 1e-5));
        assert_eq!(cam.location(), Vec3::new(1.0, 2.0, 3.0));
    }
}
