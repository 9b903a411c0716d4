//! Scene direction: body pipelines, the backdrop shell, lighting, and the
//! frame loop's advance/upload/render cycle.

pub mod backdrop;
pub mod fallback;
pub mod light;
pub mod pipeline;
pub mod scene;

pub use backdrop::BackdropRenderer;
pub use fallback::{
    BackdropImage, StarPoint, StarfieldGenerator, WispField, backdrop_fallback_rgba8,
    blackbody_to_rgb, body_fallback_rgba8,
};
pub use light::{MAX_SHADOW_CASTERS, PointLight, SceneLightUniform, ShadowCaster};
pub use pipeline::{BodyPipelines, BodyUniform, NO_CASTER_SLOT, body_model_matrix};
pub use scene::{SceneBuildError, SolarScene};
