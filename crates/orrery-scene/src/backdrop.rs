//! Backdrop renderer: a giant inward-facing textured sphere enclosing the
//! whole scene.
//!
//! The sphere sits at the origin and never moves. It is drawn first with
//! depth writes disabled so every body renders in front of it, and with
//! front-face culling so only the inside of the shell is visible.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use orrery_render::{BufferAllocator, DepthBuffer, IndexData, ManagedTexture, MeshBuffer};

/// Latitude and longitude tessellation of the backdrop shell.
const BACKDROP_RINGS: u32 = 32;
const BACKDROP_SEGMENTS: u32 = 64;

/// Uniform for the backdrop: its model matrix (pure scale).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BackdropUniform {
    pub model: [[f32; 4]; 4],
}

/// WGSL shader source for the backdrop pass.
pub const BACKDROP_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
};

struct BackdropUniform {
    model: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniform;

@group(1) @binding(0)
var backdrop_texture: texture_2d<f32>;
@group(1) @binding(1)
var backdrop_sampler: sampler;

@group(2) @binding(0)
var<uniform> backdrop: BackdropUniform;

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
fn vs_backdrop(in: VertexInput) -> VertexOutput {
    let world = backdrop.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_backdrop(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(backdrop_texture, backdrop_sampler, in.uv);
    return vec4<f32>(color.rgb, 1.0);
}
"#;

/// GPU renderer for the backdrop shell.
pub struct BackdropRenderer {
    pipeline: wgpu::RenderPipeline,
    mesh: MeshBuffer,
    uniform_bind_group: wgpu::BindGroup,
    texture: Arc<ManagedTexture>,
}

impl BackdropRenderer {
    /// Create the backdrop renderer with the given shell radius.
    ///
    /// `camera_bind_group_layout` and `texture_bind_group_layout` are the
    /// shared layouts used by the body pipelines, so the camera bind group
    /// stays valid across the whole scene pass.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
        texture: Arc<ManagedTexture>,
        radius: f32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("backdrop-shader"),
            source: wgpu::ShaderSource::Wgsl(BACKDROP_SHADER_SOURCE.into()),
        });

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("backdrop-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("backdrop-pipeline-layout"),
            bind_group_layouts: &[
                camera_bind_group_layout,
                texture_bind_group_layout,
                &uniform_bgl,
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("backdrop-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_backdrop"),
                buffers: &[orrery_render::VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // The camera sits inside the shell, so only back faces show.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                // No depth writes: the shell must never occlude scene bodies.
                depth_write_enabled: false,
                depth_compare: DepthBuffer::COMPARE_FUNCTION,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_backdrop"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let sphere = orrery_render::generate_uv_sphere(BACKDROP_RINGS, BACKDROP_SEGMENTS);
        let vertices = sphere.vertices();
        let mesh = BufferAllocator::new(device).create_mesh(
            "backdrop",
            bytemuck::cast_slice(&vertices),
            IndexData::U32(&sphere.indices),
        );

        use wgpu::util::DeviceExt;
        let uniform = BackdropUniform {
            model: Mat4::from_scale(Vec3::splat(radius)).to_cols_array_2d(),
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("backdrop-uniform"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("backdrop-uniform-bg"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        log::info!(
            "Backdrop shell initialized: radius {radius}, {} triangles",
            mesh.index_count / 3
        );

        Self {
            pipeline,
            mesh,
            uniform_bind_group,
            texture,
        }
    }

    /// Render the backdrop. Must be the first draw in the scene pass.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, camera_bind_group: &'a wgpu::BindGroup) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera_bind_group, &[]);
        pass.set_bind_group(1, &self.texture.bind_group, &[]);
        pass.set_bind_group(2, &self.uniform_bind_group, &[]);
        self.mesh.bind(pass);
        self.mesh.draw(pass);
    }
}
