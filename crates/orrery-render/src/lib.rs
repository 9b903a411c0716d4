//! wgpu rendering plumbing: surface management, camera and depth state,
//! mesh and texture upload, and per-frame pass encoding.

pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod pass;
pub mod sphere;
pub mod texture;

pub use buffer::{BufferAllocator, IndexData, MeshBuffer, VertexPositionNormalUv};
pub use camera::{Camera, CameraUniform};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pass::{DEEP_SPACE, DepthAttachmentConfig, FrameEncoder, RenderPassBuilder};
pub use sphere::{SphereMesh, generate_uv_sphere};
pub use texture::{ManagedTexture, TextureError, TextureManager, mip_level_count};
