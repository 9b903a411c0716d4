//! Mouse-driven orbit controls.
//!
//! The camera rides on a sphere around a focus point: left drag rotates,
//! right drag pans the focus, and the scroll wheel dollies in and out. Drag
//! directions follow the grab-the-scene convention, so dragging right spins
//! the scene to the right.

use glam::Vec3;
use orrery_input::MouseState;
use orrery_render::Camera;
use winit::event::MouseButton;

/// Rotation applied per pixel of drag, in radians.
const ROTATE_SPEED: f32 = 0.005;

/// Pan distance per pixel of drag, as a fraction of the orbit radius.
const PAN_SPEED: f32 = 0.002;

/// Radius multiplier per scroll line. Scrolling up zooms in.
const DOLLY_FACTOR: f32 = 0.9;

/// Keep the pitch strictly inside the poles so the view basis stays defined.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Spherical-coordinate orbit rig around a focus point.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    yaw: f32,
    pitch: f32,
    radius: f32,
    min_radius: f32,
    max_radius: f32,
}

impl OrbitControls {
    /// Build controls whose initial pose matches a camera at `position`
    /// looking at the origin.
    pub fn from_camera_position(position: Vec3) -> Self {
        let radius = position.length().max(1e-3);
        let pitch = (position.y / radius).clamp(-1.0, 1.0).asin();
        let yaw = position.x.atan2(position.z);

        Self {
            target: Vec3::ZERO,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            radius,
            min_radius: 1.0,
            max_radius: f32::INFINITY,
        }
    }

    /// Constrain how close and how far the dolly may travel.
    pub fn with_radius_limits(mut self, min_radius: f32, max_radius: f32) -> Self {
        self.min_radius = min_radius;
        self.max_radius = max_radius;
        self.radius = self.radius.clamp(min_radius, max_radius);
        self
    }

    /// Apply one frame of accumulated mouse input.
    pub fn handle_input(&mut self, mouse: &MouseState) {
        let delta = mouse.delta();

        if mouse.is_button_pressed(MouseButton::Left) {
            self.yaw -= delta.x * ROTATE_SPEED;
            self.pitch = (self.pitch + delta.y * ROTATE_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        if mouse.is_button_pressed(MouseButton::Right) {
            let pan_scale = self.radius * PAN_SPEED;
            let (right, up) = self.view_basis();
            self.target += up * (delta.y * pan_scale) - right * (delta.x * pan_scale);
        }

        let scroll = mouse.scroll();
        if scroll != 0.0 {
            self.radius =
                (self.radius * DOLLY_FACTOR.powf(scroll)).clamp(self.min_radius, self.max_radius);
        }
    }

    /// Move the camera onto the orbit sphere and aim it at the focus.
    pub fn update_camera(&self, camera: &mut Camera) {
        camera.position = self.target + self.orbit_offset();
        camera.look_at(self.target, Vec3::Y);
    }

    /// Current focus point.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Current distance from the focus.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Offset from the focus to the camera, in world space.
    fn orbit_offset(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        ) * self.radius
    }

    /// Camera-space right and up vectors for panning.
    ///
    /// The pitch clamp keeps the view direction off the vertical axis, so
    /// the cross products below never degenerate.
    fn view_basis(&self) -> (Vec3, Vec3) {
        let forward = -self.orbit_offset().normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        (right, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::ElementState;

    fn drag(mouse: &mut MouseState, button: MouseButton, dx: f64, dy: f64) {
        mouse.on_button(button, ElementState::Pressed);
        mouse.clear_transients();
        mouse.on_cursor_moved(dx, dy);
    }

    #[test]
    fn test_initial_pose_matches_camera_position() {
        let controls = OrbitControls::from_camera_position(Vec3::new(0.0, 0.0, 500.0));
        assert!((controls.radius() - 500.0).abs() < 1e-3);

        let mut camera = Camera::perspective(Vec3::ZERO, 1.0, 1.0, 1.0, 10000.0);
        controls.update_camera(&mut camera);
        assert!(
            (camera.position - Vec3::new(0.0, 0.0, 500.0)).length() < 1e-2,
            "camera should start where the config placed it, got {}",
            camera.position
        );
    }

    #[test]
    fn test_left_drag_orbits_around_target() {
        let mut controls = OrbitControls::from_camera_position(Vec3::new(0.0, 0.0, 500.0));
        let mut mouse = MouseState::new();
        drag(&mut mouse, MouseButton::Left, 100.0, 0.0);
        controls.handle_input(&mouse);

        let mut camera = Camera::perspective(Vec3::ZERO, 1.0, 1.0, 1.0, 10000.0);
        controls.update_camera(&mut camera);
        assert!(
            camera.position.x.abs() > 1.0,
            "horizontal drag should move the camera off the Z axis"
        );
        assert!(
            (camera.position.length() - 500.0).abs() < 1e-2,
            "orbiting must preserve the radius"
        );
    }

    #[test]
    fn test_pitch_is_clamped_short_of_poles() {
        let mut controls = OrbitControls::from_camera_position(Vec3::new(0.0, 0.0, 500.0));
        let mut mouse = MouseState::new();
        drag(&mut mouse, MouseButton::Left, 0.0, 1_000_000.0);
        controls.handle_input(&mouse);

        assert!(
            controls.pitch <= PITCH_LIMIT,
            "pitch {} must stay below the pole limit {PITCH_LIMIT}",
            controls.pitch
        );
    }

    #[test]
    fn test_scroll_dollies_within_limits() {
        let mut controls = OrbitControls::from_camera_position(Vec3::new(0.0, 0.0, 500.0))
            .with_radius_limits(100.0, 1000.0);

        let mut mouse = MouseState::new();
        mouse.on_scroll(winit::event::MouseScrollDelta::LineDelta(0.0, 3.0));
        controls.handle_input(&mouse);
        assert!(controls.radius() < 500.0, "scrolling up should zoom in");

        let mut mouse = MouseState::new();
        mouse.on_scroll(winit::event::MouseScrollDelta::LineDelta(0.0, 500.0));
        controls.handle_input(&mouse);
        assert!(
            (controls.radius() - 100.0).abs() < 1e-3,
            "dolly must stop at the minimum radius"
        );
    }

    #[test]
    fn test_right_drag_pans_target() {
        let mut controls = OrbitControls::from_camera_position(Vec3::new(0.0, 0.0, 500.0));
        let mut mouse = MouseState::new();
        drag(&mut mouse, MouseButton::Right, 50.0, 0.0);
        controls.handle_input(&mouse);

        assert!(
            controls.target().length() > 1e-3,
            "panning should move the focus point"
        );
    }

    #[test]
    fn test_radius_limits_apply_at_construction() {
        let controls = OrbitControls::from_camera_position(Vec3::new(0.0, 0.0, 5000.0))
            .with_radius_limits(10.0, 800.0);
        assert!((controls.radius() - 800.0).abs() < 1e-3);
    }
}
