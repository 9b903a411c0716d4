//! Perspective camera and the uniform block it uploads.

use glam::{Mat4, Quat, Vec3};

/// GPU-side camera data, bound once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix, column major.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world position (w unused, pads to 16 bytes).
    pub camera_pos: [f32; 4],
}

/// A perspective camera that generates view and projection matrices.
///
/// Projection uses reverse-Z: the near plane maps to depth 1 and the far
/// plane to depth 0, which spreads float precision across the huge
/// near-1 / far-10000 range this scene needs.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World position.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// Camera at `position` with the given perspective parameters, facing -Z.
    pub fn perspective(position: Vec3, fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Point the camera at `target`, keeping `up` as the vertical reference.
    ///
    /// `target` must not coincide with the camera position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let view = Mat4::look_at_rh(self.position, target, up);
        self.rotation = Quat::from_mat4(&view).inverse();
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        let rotation_matrix = Mat4::from_quat(self.rotation);
        let translation_matrix = Mat4::from_translation(self.position);
        (translation_matrix * rotation_matrix).inverse()
    }

    /// Compute the projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        // Reverse-Z is achieved by swapping near/far in the projection.
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    /// Compute the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Update the aspect ratio after a window resize.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect_ratio = width / height;
    }

    /// Convert the camera to a uniform suitable for GPU upload.
    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            camera_pos: [self.position.x, self.position.y, self.position.z, 0.0],
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: 60.0_f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 1.0,
            far: 10000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_camera_uniform_size_and_alignment() {
        assert_eq!(
            std::mem::size_of::<CameraUniform>(),
            80,
            "CameraUniform must stay 80 bytes to match the WGSL struct"
        );
        assert_eq!(std::mem::align_of::<CameraUniform>(), 4);
    }

    #[test]
    fn test_identity_camera_looks_down_neg_z() {
        let camera = Camera::default();
        let forward = camera.forward();
        assert!((forward.x).abs() < 1e-6);
        assert!((forward.y).abs() < 1e-6);
        assert!((forward.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut camera = Camera::perspective(
            Vec3::new(0.0, 0.0, 500.0),
            60.0_f32.to_radians(),
            16.0 / 9.0,
            1.0,
            10000.0,
        );
        camera.look_at(Vec3::ZERO, Vec3::Y);
        let forward = camera.forward();
        let expected = (Vec3::ZERO - camera.position).normalize();
        assert!(
            forward.abs_diff_eq(expected, 1e-5),
            "Camera should face the origin, forward was {forward}"
        );
        assert!(
            camera.up().dot(Vec3::Y) > 0.99,
            "Up should stay aligned with +Y for a horizontal view"
        );
    }

    #[test]
    fn test_set_aspect_ratio() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_reverse_z_depth_mapping() {
        let camera = Camera::default();
        let proj = camera.projection_matrix();

        // A point on the near plane projects to depth ~1, far plane to ~0.
        let near_point = proj * Vec4::new(0.0, 0.0, -camera.near, 1.0);
        let far_point = proj * Vec4::new(0.0, 0.0, -camera.far, 1.0);
        let near_depth = near_point.z / near_point.w;
        let far_depth = far_point.z / far_point.w;

        assert!(
            (near_depth - 1.0).abs() < 1e-4,
            "Near plane should map to depth 1, got {near_depth}"
        );
        assert!(
            far_depth.abs() < 1e-4,
            "Far plane should map to depth 0, got {far_depth}"
        );
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_transform() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(10.0, 20.0, 30.0);
        camera.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let view = camera.view_matrix();
        let inv_view = view.inverse();

        let reconstructed_pos = inv_view.col(3).truncate();
        assert!((reconstructed_pos - camera.position).length() < 1e-4);
    }

    #[test]
    fn test_view_matrix_matches_look_at_construction() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(0.0, 200.0, 500.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);

        let expected = Mat4::look_at_rh(camera.position, Vec3::ZERO, Vec3::Y);
        let view = camera.view_matrix();
        for col in 0..4 {
            for row in 0..4 {
                assert!(
                    (view.col(col)[row] - expected.col(col)[row]).abs() < 1e-4,
                    "mismatch at col={col}, row={row}"
                );
            }
        }
    }

    #[test]
    fn test_up_right_forward_orthogonal() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(100.0, 50.0, 300.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);
        let f = camera.forward();
        let u = camera.up();
        let r = camera.right();

        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!((u.length() - 1.0).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);

        assert!(f.dot(u).abs() < 1e-5);
        assert!(f.dot(r).abs() < 1e-5);
        assert!(u.dot(r).abs() < 1e-5);
    }

    #[test]
    fn test_uniform_carries_position() {
        let camera = Camera {
            position: Vec3::new(0.0, 0.0, 500.0),
            ..Camera::default()
        };
        let uniform = camera.to_uniform();
        assert_eq!(uniform.camera_pos, [0.0, 0.0, 500.0, 0.0]);
    }
}
