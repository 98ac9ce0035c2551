use glam::{Mat4, Vec3};

use crate::types::{CameraParams, MeshPlacement};

/// Camera position and orientation, mutated once per frame by the animation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    view: Mat4,
}

impl CameraState {
    pub fn new(params: &CameraParams) -> Self {
        let position = Vec3::new(0.0, params.height, params.distance);
        Self {
            position,
            view: Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y),
        }
    }

    /// Moves `x` a `smoothing` fraction of the way toward `target_x`.
    pub fn follow_x(&mut self, target_x: f32, smoothing: f32) {
        self.position.x += (target_x - self.position.x) * smoothing;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.view = Mat4::look_at_rh(self.position, target, Vec3::Y);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }
}

/// Perspective lens owned by the scene; only the aspect ratio changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(params: &CameraParams, width: u32, height: u32) -> Self {
        let mut projection = Self {
            fov_y_deg: params.fov_deg,
            aspect: 1.0,
            near: params.near,
            far: params.far,
        };
        projection.set_viewport(width, height);
        projection
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Right-handed perspective with wgpu's `[0, 1]` depth range.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }
}

/// Model transform of the grid: translate, then tilt about X.
pub fn model_matrix(placement: &MeshPlacement) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, placement.offset_y, 0.0))
        * Mat4::from_rotation_x(placement.tilt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_configured_position() {
        let camera = CameraState::new(&CameraParams::default());
        assert_eq!(camera.position, Vec3::new(0.0, -100.0, 1500.0));
    }

    #[test]
    fn follow_moves_a_fraction_of_the_gap() {
        let mut camera = CameraState::new(&CameraParams::default());
        camera.follow_x(100.0, 0.01);
        assert!((camera.position.x - 1.0).abs() < 1e-5);
        assert_eq!(camera.position.y, -100.0);
        assert_eq!(camera.position.z, 1500.0);
    }

    #[test]
    fn look_at_origin_projects_origin_to_screen_centre() {
        let mut camera = CameraState::new(&CameraParams::default());
        camera.position.x = 250.0;
        camera.look_at(Vec3::ZERO);
        let projection = Projection::new(&CameraParams::default(), 1920, 1080);
        let clip = projection.matrix() * camera.view_matrix() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn projection_ignores_empty_viewports() {
        let mut projection = Projection::new(&CameraParams::default(), 800, 400);
        assert_eq!(projection.aspect, 2.0);
        projection.set_viewport(0, 400);
        assert_eq!(projection.aspect, 2.0);
        projection.set_viewport(300, 300);
        assert_eq!(projection.aspect, 1.0);
    }

    #[test]
    fn model_matrix_lowers_the_mesh() {
        let model = model_matrix(&MeshPlacement::default());
        let origin = model.transform_point3(Vec3::ZERO);
        assert!((origin.y + 400.0).abs() < 1e-4);
    }
}
