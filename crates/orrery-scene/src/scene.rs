//! Scene assembly: simulation bodies wired to their GPU resources.
//!
//! [`SolarScene`] owns the body hierarchy, the shared sphere mesh, per-body
//! uniform buffers, the backdrop shell, and the scene light. Each frame the
//! caller advances the simulation, uploads uniforms, and records draws into
//! an open render pass.

use std::sync::Arc;

use orrery_config::{BodyConfig, SceneConfig};
use orrery_render::{
    BufferAllocator, Camera, CameraUniform, IndexData, ManagedTexture, MeshBuffer, TextureError,
    TextureManager, generate_uv_sphere,
};
use orrery_sim::{BodyId, BodyParams, SolarSystem, SystemError};

use crate::backdrop::BackdropRenderer;
use crate::fallback::{backdrop_fallback_rgba8, body_fallback_rgba8};
use crate::light::{MAX_SHADOW_CASTERS, PointLight, SceneLightUniform, ShadowCaster};
use crate::pipeline::{BodyPipelines, BodyUniform, NO_CASTER_SLOT, body_model_matrix};

/// Sphere tessellation shared by all bodies.
const BODY_RINGS: u32 = 24;
const BODY_SEGMENTS: u32 = 48;

/// Resolution of procedurally generated stand-in textures.
const BODY_FALLBACK_SIZE: u32 = 256;
const BACKDROP_FALLBACK_WIDTH: u32 = 1024;
const BACKDROP_FALLBACK_HEIGHT: u32 = 512;
const BACKDROP_FALLBACK_SEED: u64 = 42;

/// Errors raised while assembling a scene from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum SceneBuildError {
    /// A body names a parent that appears nowhere earlier in the body list.
    #[error("body '{body}' references unknown parent '{parent}'")]
    UnknownParent { body: String, parent: String },

    /// The body hierarchy was rejected by the simulation.
    #[error(transparent)]
    System(#[from] SystemError),

    /// A texture upload failed.
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Per-body GPU state, parallel to the simulation's body list.
struct BodyDraw {
    id: BodyId,
    texture: Arc<ManagedTexture>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    /// False for self-luminous bodies, which skip the lighting path.
    lit: bool,
    receive_shadows: bool,
    casts_shadow: bool,
    /// Slot in the light's occluder list, or [`NO_CASTER_SLOT`].
    caster_index: u32,
}

/// The complete animated scene: hierarchy, light, backdrop, and draw state.
pub struct SolarScene {
    system: SolarSystem,
    bodies: Vec<BodyDraw>,
    mesh: MeshBuffer,
    pipelines: BodyPipelines,
    backdrop: BackdropRenderer,
    textures: TextureManager,
    light: PointLight,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
}

impl SolarScene {
    /// Assemble the scene described by `config`.
    ///
    /// Bodies are spawned in list order, so parents must appear before their
    /// children. Missing texture files are replaced with generated stand-ins
    /// rather than failing the build.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        config: &SceneConfig,
    ) -> Result<Self, SceneBuildError> {
        let mut textures = TextureManager::new(device);
        let pipelines = BodyPipelines::new(device, surface_format, textures.bind_group_layout());

        let backdrop_texture = match &config.backdrop.texture {
            Some(path) => match textures.load_file(device, queue, "backdrop", path) {
                Ok(texture) => texture,
                Err(err) => {
                    log::warn!("Backdrop texture unavailable ({err}), generating star field");
                    Self::procedural_backdrop(&mut textures, device, queue)?
                }
            },
            None => Self::procedural_backdrop(&mut textures, device, queue)?,
        };
        let backdrop = BackdropRenderer::new(
            device,
            surface_format,
            &pipelines.camera_bind_group_layout,
            textures.bind_group_layout(),
            backdrop_texture,
            config.backdrop.radius,
        );

        let mut system = SolarSystem::new();
        let mut bodies = Vec::with_capacity(config.bodies.len());
        let mut caster_slots = 0u32;

        for body_config in &config.bodies {
            let parent = match &body_config.parent {
                Some(parent_name) => Some(system.find(parent_name).ok_or_else(|| {
                    SceneBuildError::UnknownParent {
                        body: body_config.name.clone(),
                        parent: parent_name.clone(),
                    }
                })?),
                None => None,
            };

            let id = system.spawn(&BodyParams {
                name: body_config.name.clone(),
                diameter: body_config.diameter,
                distance_from_parent: body_config.distance_from_parent,
                rotation_rate: body_config.rotation_rate,
                revolution_rate: body_config.revolution_rate,
                emits_own_light: body_config.emits_light,
                parent,
            })?;

            let texture = Self::body_texture(&mut textures, device, queue, body_config)?;

            let caster_index = if body_config.cast_shadow
                && (caster_slots as usize) < MAX_SHADOW_CASTERS
            {
                let slot = caster_slots;
                caster_slots += 1;
                slot
            } else {
                if body_config.cast_shadow {
                    log::warn!(
                        "Occluder limit reached, '{}' will not cast shadows",
                        body_config.name
                    );
                }
                NO_CASTER_SLOT
            };

            let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{}-uniform", body_config.name)),
                size: std::mem::size_of::<BodyUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{}-uniform-bg", body_config.name)),
                layout: &pipelines.body_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

            bodies.push(BodyDraw {
                id,
                texture,
                uniform_buffer,
                uniform_bind_group,
                lit: !body_config.emits_light,
                receive_shadows: body_config.receive_shadow,
                casts_shadow: caster_index != NO_CASTER_SLOT,
                caster_index,
            });
        }

        let sphere = generate_uv_sphere(BODY_RINGS, BODY_SEGMENTS);
        let allocator = BufferAllocator::new(device);
        let mesh = allocator.create_mesh(
            "body-sphere",
            bytemuck::cast_slice(&sphere.vertices()),
            IndexData::U32(&sphere.indices),
        );

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-camera-uniform"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-camera-bg"),
            layout: &pipelines.camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let light = PointLight::from_config(&config.light);
        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-light-uniform"),
            size: std::mem::size_of::<SceneLightUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-light-bg"),
            layout: &pipelines.light_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        log::info!(
            "Scene assembled: {} bodies, {} shadow casters, backdrop radius {}",
            bodies.len(),
            caster_slots,
            config.backdrop.radius
        );

        Ok(Self {
            system,
            bodies,
            mesh,
            pipelines,
            backdrop,
            textures,
            light,
            camera_buffer,
            camera_bind_group,
            light_buffer,
            light_bind_group,
        })
    }

    fn procedural_backdrop(
        textures: &mut TextureManager,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Arc<ManagedTexture>, TextureError> {
        let pixels = backdrop_fallback_rgba8(
            BACKDROP_FALLBACK_SEED,
            BACKDROP_FALLBACK_WIDTH,
            BACKDROP_FALLBACK_HEIGHT,
        );
        textures.create_texture(
            device,
            queue,
            "backdrop-fallback",
            &pixels,
            BACKDROP_FALLBACK_WIDTH,
            BACKDROP_FALLBACK_HEIGHT,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            true,
        )
    }

    fn body_texture(
        textures: &mut TextureManager,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &BodyConfig,
    ) -> Result<Arc<ManagedTexture>, TextureError> {
        if let Some(path) = &config.texture {
            match textures.load_file(device, queue, &config.name, path) {
                Ok(texture) => return Ok(texture),
                Err(err) => {
                    log::warn!(
                        "Texture for '{}' unavailable ({err}), using generated stand-in",
                        config.name
                    );
                }
            }
        }
        let pixels = body_fallback_rgba8(&config.name, BODY_FALLBACK_SIZE);
        textures.create_texture(
            device,
            queue,
            &format!("{}-fallback", config.name),
            &pixels,
            BODY_FALLBACK_SIZE,
            BODY_FALLBACK_SIZE,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            true,
        )
    }

    /// Advance every body by one frame step.
    pub fn advance(&mut self) {
        self.system.step();
    }

    /// Write the camera, light, and per-body uniforms for the current frame.
    pub fn upload(&self, queue: &wgpu::Queue, camera: &Camera) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&camera.to_uniform()),
        );

        // Occluders are collected in caster slot order, which is the body
        // list order restricted to casting bodies.
        let casters: Vec<ShadowCaster> = self
            .bodies
            .iter()
            .filter(|draw| draw.casts_shadow)
            .map(|draw| {
                let body = self.system.body(draw.id);
                ShadowCaster {
                    center: body.position(),
                    radius: body.visual_radius(),
                }
            })
            .collect();
        let light_uniform = SceneLightUniform::pack(&self.light, &casters);
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&light_uniform));

        for draw in &self.bodies {
            let body = self.system.body(draw.id);
            let uniform = BodyUniform {
                model: body_model_matrix(body.position(), body.orientation(), body.visual_radius())
                    .to_cols_array_2d(),
                receive_shadows: draw.receive_shadows as u32,
                caster_index: draw.caster_index,
                _pad: [0; 2],
            };
            queue.write_buffer(&draw.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    /// Record all scene draws into an open render pass.
    ///
    /// The backdrop goes first: it does not write depth, so anything drawn
    /// earlier would be painted over.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        self.backdrop.render(pass, &self.camera_bind_group);

        self.mesh.bind(pass);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);

        pass.set_pipeline(&self.pipelines.unlit);
        for draw in self.bodies.iter().filter(|d| !d.lit) {
            pass.set_bind_group(1, &draw.texture.bind_group, &[]);
            pass.set_bind_group(2, &draw.uniform_bind_group, &[]);
            self.mesh.draw(pass);
        }

        pass.set_pipeline(&self.pipelines.lit);
        pass.set_bind_group(3, &self.light_bind_group, &[]);
        for draw in self.bodies.iter().filter(|d| d.lit) {
            pass.set_bind_group(1, &draw.texture.bind_group, &[]);
            pass.set_bind_group(2, &draw.uniform_bind_group, &[]);
            self.mesh.draw(pass);
        }
    }

    /// Read access to the underlying simulation.
    pub fn system(&self) -> &SolarSystem {
        &self.system
    }

    /// The scene's point light.
    pub fn light(&self) -> &PointLight {
        &self.light
    }

    /// Number of bodies in the scene.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of textures held by the scene's texture cache.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}
