//! Configuration system for the orrery viewer.
//!
//! Provides runtime-configurable settings that persist to disk as RON files,
//! CLI overrides via clap, and the data-driven scene description the viewer
//! is built from.

mod cli;
mod config;
mod error;
mod scene;

pub use cli::CliArgs;
pub use config::{CameraConfig, Config, DebugConfig, WindowConfig};
pub use error::ConfigError;
pub use scene::{BackdropConfig, BodyConfig, LightConfig, SceneConfig, SceneError};
