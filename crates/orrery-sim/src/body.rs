//! Per-body transform state and the frame-driven spin/revolve update rule.

use glam::{Quat, Vec3};

use crate::system::BodyId;

/// Angular step applied once per rendered frame, scaled by a body's rotation
/// or revolution rate. The step is fixed per frame, never wall-clock scaled,
/// so simulation speed follows the display refresh rate.
pub const FRAME_ANGULAR_STEP: f32 = 0.1;

/// Construction parameters for a celestial body.
///
/// No validation is performed on the numeric fields. A zero or negative
/// diameter produces a degenerate mesh on the render side but never a crash.
#[derive(Clone, Debug)]
pub struct BodyParams {
    /// Display name, also used to resolve parent references in scene data.
    pub name: String,
    /// Sphere diameter in world units. The mesh radius is half of this.
    pub diameter: f32,
    /// Offset along +X from the parent's position at construction time.
    pub distance_from_parent: f32,
    /// Spin rate about the body's local vertical axis, in units of the
    /// per-frame angular step.
    pub rotation_rate: f32,
    /// Orbit rate around the parent, in units of the per-frame angular step.
    pub revolution_rate: f32,
    /// Whether the surface ignores scene lighting (the sun) or reacts to it.
    pub emits_own_light: bool,
    /// Body this one orbits. Must already exist when the body is spawned.
    pub parent: Option<BodyId>,
}

/// One simulated sphere with its own world transform.
///
/// A body with no parent never revolves; its position is fixed at its
/// constructed offset and only the spin applies.
#[derive(Clone, Debug)]
pub struct CelestialBody {
    name: String,
    position: Vec3,
    orientation: Quat,
    visual_radius: f32,
    distance_from_parent: f32,
    rotation_rate: f32,
    revolution_rate: f32,
    emits_own_light: bool,
    parent: Option<BodyId>,
    last_known_parent_position: Vec3,
}

impl CelestialBody {
    /// Build a body from its parameters and the parent's current world
    /// position (`None` for a root body).
    ///
    /// The initial position is `(distance_from_parent, 0, 0)` plus the
    /// parent's position, and that same parent position is cached as the
    /// last known one so the first update sees zero displacement.
    pub fn new(params: &BodyParams, parent_position: Option<Vec3>) -> Self {
        let anchor = parent_position.unwrap_or(Vec3::ZERO);
        Self {
            name: params.name.clone(),
            position: Vec3::new(params.distance_from_parent, 0.0, 0.0) + anchor,
            orientation: Quat::IDENTITY,
            visual_radius: params.diameter / 2.0,
            distance_from_parent: params.distance_from_parent,
            rotation_rate: params.rotation_rate,
            revolution_rate: params.revolution_rate,
            emits_own_light: params.emits_own_light,
            parent: params.parent,
            last_known_parent_position: anchor,
        }
    }

    /// Advance the body by one frame.
    ///
    /// `parent_position` is the parent's current world position, `None` when
    /// the body has no parent. Spins the body about its local vertical axis
    /// by `FRAME_ANGULAR_STEP * rotation_rate` radians, then, if a parent
    /// position is given: translates by the parent's displacement since the
    /// last update, revolves by `FRAME_ANGULAR_STEP * revolution_rate`
    /// radians around the parent's current position (axis = normalized
    /// displacement, falling back to +Y when the parent did not move), and
    /// caches the parent position for the next frame.
    pub fn update(&mut self, parent_position: Option<Vec3>) {
        let spin = Quat::from_rotation_y(FRAME_ANGULAR_STEP * self.rotation_rate);
        self.orientation = self.orientation * spin;

        if let Some(parent_position) = parent_position {
            let displacement = parent_position - self.last_known_parent_position;
            self.position += displacement;

            let axis = if displacement.length_squared() == 0.0 {
                Vec3::Y
            } else {
                displacement.normalize()
            };
            self.revolve_around(
                parent_position,
                axis,
                FRAME_ANGULAR_STEP * self.revolution_rate,
            );
            self.last_known_parent_position = parent_position;
        }

        self.orientation = self.orientation.normalize();
    }

    /// Rotate the body's position around `point` by `angle` radians about
    /// `axis` (unit length), carrying the orientation along so the body turns
    /// with its orbit instead of sliding through it.
    pub fn revolve_around(&mut self, point: Vec3, axis: Vec3, angle: f32) {
        let rotation = Quat::from_axis_angle(axis, angle);
        self.position = point + rotation * (self.position - point);
        self.orientation = rotation * self.orientation;
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current world position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current world orientation.
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Mesh radius (half the configured diameter).
    pub fn visual_radius(&self) -> f32 {
        self.visual_radius
    }

    /// Construction-time offset from the parent along +X.
    pub fn distance_from_parent(&self) -> f32 {
        self.distance_from_parent
    }

    /// Whether the body's surface ignores scene lighting.
    pub fn emits_own_light(&self) -> bool {
        self.emits_own_light
    }

    /// Body this one orbits, if any.
    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }

    /// Parent position cached at the end of the previous update.
    pub fn last_known_parent_position(&self) -> Vec3 {
        self.last_known_parent_position
    }
}
