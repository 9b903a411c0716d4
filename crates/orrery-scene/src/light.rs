//! Point light and shadow caster data shared by the lit body shader.
//!
//! The scene carries a single point light at the sun's center. Shadowing is
//! analytic: every shadow-casting body is described to the shader as an
//! occluder sphere, and lit fragments test the segment toward the light
//! against each occluder.

use bytemuck::{Pod, Zeroable};

/// CPU-side point light descriptor.
#[derive(Clone, Debug)]
pub struct PointLight {
    /// Position in world coordinates.
    pub position: glam::Vec3,
    /// Linear RGB color.
    pub color: glam::Vec3,
    /// Light intensity multiplier.
    pub intensity: f32,
}

impl PointLight {
    /// Build the light from its scene configuration, placed at the origin.
    pub fn from_config(config: &orrery_config::LightConfig) -> Self {
        Self {
            position: glam::Vec3::ZERO,
            color: glam::Vec3::from_array(config.color),
            intensity: config.intensity,
        }
    }
}

/// An occluder sphere for the analytic shadow test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowCaster {
    /// Sphere center in world coordinates.
    pub center: glam::Vec3,
    /// Sphere radius.
    pub radius: f32,
}

/// Maximum number of occluder spheres sent to the GPU per frame.
pub const MAX_SHADOW_CASTERS: usize = 8;

/// GPU uniform with the light and the occluder list, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneLightUniform {
    /// xyz = light position in world space, w unused.
    pub position: [f32; 4],
    /// xyz = linear RGB color, w = intensity.
    pub color_intensity: [f32; 4],
    /// Number of active occluders in `casters`.
    pub caster_count: u32,
    /// Padding so the caster array lands on a 16-byte boundary.
    pub _pad: [u32; 3],
    /// xyz = occluder center, w = occluder radius.
    pub casters: [[f32; 4]; MAX_SHADOW_CASTERS],
}

impl SceneLightUniform {
    /// Pack the light and occluder list for upload. Occluders beyond
    /// [`MAX_SHADOW_CASTERS`] are dropped.
    pub fn pack(light: &PointLight, casters: &[ShadowCaster]) -> Self {
        let mut uniform = Self {
            position: [light.position.x, light.position.y, light.position.z, 0.0],
            color_intensity: [light.color.x, light.color.y, light.color.z, light.intensity],
            caster_count: casters.len().min(MAX_SHADOW_CASTERS) as u32,
            _pad: [0; 3],
            casters: [[0.0; 4]; MAX_SHADOW_CASTERS],
        };

        for (slot, caster) in casters.iter().take(MAX_SHADOW_CASTERS).enumerate() {
            uniform.casters[slot] = [
                caster.center.x,
                caster.center.y,
                caster.center.z,
                caster.radius,
            ];
        }

        uniform
    }
}
