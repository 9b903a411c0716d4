//! GPU pipelines for the celestial body spheres.
//!
//! Two variants share the same vertex flow: a lit pipeline with point light
//! N·L shading and analytic occluder shadows, and an unlit pipeline for
//! bodies that emit their own light. Camera is bound at `@group(0)`, the
//! body texture at `@group(1)`, the per-body uniform at `@group(2)`, and the
//! scene light (lit variant only) at `@group(3)`.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use orrery_render::{DepthBuffer, VertexPositionNormalUv};

use crate::light::SceneLightUniform;

/// Slot value meaning "this body is not in the occluder list".
pub const NO_CASTER_SLOT: u32 = u32::MAX;

/// Per-body GPU uniform.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BodyUniform {
    /// Model matrix (translation × rotation × scale).
    pub model: [[f32; 4]; 4],
    /// Nonzero when the body darkens under occluder shadows.
    pub receive_shadows: u32,
    /// This body's slot in the occluder list, or [`NO_CASTER_SLOT`].
    /// Lets the shader skip the self-shadow test.
    pub caster_index: u32,
    /// Padding to a 16-byte multiple.
    pub _pad: [u32; 2],
}

/// Compute the model matrix for a body sphere.
pub fn body_model_matrix(center: Vec3, orientation: Quat, radius: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::splat(radius), orientation, center)
}

/// WGSL source for the lit body shader.
pub const LIT_BODY_SHADER_SOURCE: &str = r#"
const AMBIENT: f32 = 0.04;

struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
};

struct BodyUniform {
    model: mat4x4<f32>,
    receive_shadows: u32,
    caster_index: u32,
};

struct SceneLight {
    position: vec4<f32>,
    color_intensity: vec4<f32>,
    caster_count: u32,
    casters: array<vec4<f32>, 8>,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniform;

@group(1) @binding(0)
var body_texture: texture_2d<f32>;
@group(1) @binding(1)
var body_sampler: sampler;

@group(2) @binding(0)
var<uniform> body: BodyUniform;

@group(3) @binding(0)
var<uniform> light: SceneLight;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

// --- Occluder shadow test ---

fn occluder_visibility(world_pos: vec3<f32>, caster: vec4<f32>) -> f32 {
    let to_light = light.position.xyz - world_pos;
    let dist_to_light = length(to_light);
    let dir = to_light / dist_to_light;
    let to_center = caster.xyz - world_pos;
    let along = dot(to_center, dir);
    if along <= 0.0 || along >= dist_to_light {
        return 1.0;
    }
    let miss = length(to_center - dir * along);
    // Narrow smoothstep band softens the umbra edge.
    return smoothstep(caster.w * 0.98, caster.w * 1.02, miss);
}

// --- Vertex & Fragment ---

@vertex
fn vs_body(in: VertexInput) -> VertexOutput {
    let world = body.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_position = world.xyz;
    // Uniform scale, so the model matrix is safe for normals.
    out.world_normal = (body.model * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_body(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(body_texture, body_sampler, in.uv).rgb;
    let normal = normalize(in.world_normal);
    let to_light = light.position.xyz - in.world_position;
    let n_dot_l = max(dot(normal, normalize(to_light)), 0.0);

    var visibility = 1.0;
    if body.receive_shadows != 0u {
        for (var i = 0u; i < light.caster_count; i++) {
            if i == body.caster_index { continue; }
            visibility = min(visibility, occluder_visibility(in.world_position, light.casters[i]));
        }
    }

    let direct = light.color_intensity.xyz * light.color_intensity.w * n_dot_l * visibility;
    let color = albedo * (direct + vec3<f32>(AMBIENT));
    return vec4<f32>(color, 1.0);
}
"#;

/// WGSL source for the unlit body shader (bodies that emit their own light).
pub const UNLIT_BODY_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
};

struct BodyUniform {
    model: mat4x4<f32>,
    receive_shadows: u32,
    caster_index: u32,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniform;

@group(1) @binding(0)
var body_texture: texture_2d<f32>;
@group(1) @binding(1)
var body_sampler: sampler;

@group(2) @binding(0)
var<uniform> body: BodyUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_body(in: VertexInput) -> VertexOutput {
    let world = body.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_body(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(body_texture, body_sampler, in.uv).rgb;
    return vec4<f32>(albedo, 1.0);
}
"#;

/// Render pipelines for the body spheres, plus the bind group layouts the
/// scene needs to build its frame bindings.
pub struct BodyPipelines {
    /// Lit variant: N·L point light shading with occluder shadows.
    pub lit: wgpu::RenderPipeline,
    /// Unlit variant for emissive bodies.
    pub unlit: wgpu::RenderPipeline,
    /// Camera uniform bind group layout (group 0).
    pub camera_bind_group_layout: wgpu::BindGroupLayout,
    /// Per-body uniform bind group layout (group 2).
    pub body_bind_group_layout: wgpu::BindGroupLayout,
    /// Scene light bind group layout (group 3, lit variant only).
    pub light_bind_group_layout: wgpu::BindGroupLayout,
}

impl BodyPipelines {
    /// Create both body pipelines. `texture_bind_group_layout` is the shared
    /// texture + sampler layout from the texture manager (group 1).
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("body-camera-bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(80), // CameraUniform: mat4x4 + vec4
                    },
                    count: None,
                }],
            });

        let body_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("body-uniform-bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<BodyUniform>() as u64
                        ),
                    },
                    count: None,
                }],
            });

        let light_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("body-light-bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<SceneLightUniform>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lit-body-pipeline-layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                texture_bind_group_layout,
                &body_bind_group_layout,
                &light_bind_group_layout,
            ],
            immediate_size: 0,
        });

        let unlit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("unlit-body-pipeline-layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                texture_bind_group_layout,
                &body_bind_group_layout,
            ],
            immediate_size: 0,
        });

        let lit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lit-body-shader"),
            source: wgpu::ShaderSource::Wgsl(LIT_BODY_SHADER_SOURCE.into()),
        });

        let unlit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("unlit-body-shader"),
            source: wgpu::ShaderSource::Wgsl(UNLIT_BODY_SHADER_SOURCE.into()),
        });

        let lit = build_sphere_pipeline(
            device,
            "lit-body-pipeline",
            &lit_layout,
            &lit_shader,
            surface_format,
        );
        let unlit = build_sphere_pipeline(
            device,
            "unlit-body-pipeline",
            &unlit_layout,
            &unlit_shader,
            surface_format,
        );

        Self {
            lit,
            unlit,
            camera_bind_group_layout,
            body_bind_group_layout,
            light_bind_group_layout,
        }
    }
}

/// Build one sphere pipeline: opaque, back-face culled, reverse-Z depth.
fn build_sphere_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_body"),
            buffers: &[VertexPositionNormalUv::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: DepthBuffer::COMPARE_FUNCTION, // reverse-Z
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_body"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None, // opaque
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_uniform_size_alignment() {
        assert_eq!(std::mem::size_of::<BodyUniform>(), 80);
        assert_eq!(std::mem::size_of::<BodyUniform>() % 16, 0);
    }

    #[test]
    fn test_model_matrix_matches_explicit_chain() {
        let center = Vec3::new(108.0, 0.0, 0.0);
        let orientation = Quat::from_rotation_y(0.7);
        let radius = 5.0;

        let model = body_model_matrix(center, orientation, radius);
        let chain = Mat4::from_translation(center)
            * Mat4::from_quat(orientation)
            * Mat4::from_scale(Vec3::splat(radius));

        assert!(
            model.abs_diff_eq(chain, 1e-5),
            "scale-rotation-translation should equal the explicit product"
        );
    }

    #[test]
    fn test_model_matrix_moves_equator_point() {
        let m0 = body_model_matrix(Vec3::ZERO, Quat::IDENTITY, 1.0);
        let m1 = body_model_matrix(Vec3::ZERO, Quat::from_rotation_y(0.5), 1.0);

        let equator_point = glam::Vec4::new(1.0, 0.0, 0.0, 1.0);
        let diff = (m0 * equator_point - m1 * equator_point).length();
        assert!(diff > 0.01, "Equator point should move under spin, diff = {diff}");
    }

    #[test]
    fn test_model_matrix_scales_and_translates() {
        let model = body_model_matrix(Vec3::new(0.0, 0.0, 20.0), Quat::IDENTITY, 2.5);
        let north_pole = model * glam::Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert!(
            north_pole.abs_diff_eq(glam::Vec4::new(0.0, 2.5, 20.0, 1.0), 1e-5),
            "unit north pole should land at center + radius, got {north_pole}"
        );
    }

    #[test]
    fn test_pipelines_build() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let manager = orrery_render::TextureManager::new(&device);

        let pipelines = BodyPipelines::new(
            &device,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            manager.bind_group_layout(),
        );

        // Shader modules validated during creation; reaching here means both
        // WGSL sources compiled.
        let _ = (&pipelines.lit, &pipelines.unlit);
    }

    fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok()?;

            adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()
        })
    }
}
