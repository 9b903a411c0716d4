//! Data-driven scene description: bodies, backdrop, and light.
//!
//! A scene is an ordered list of bodies. Parents are referenced by name and
//! must be declared before any body that orbits them, which keeps the flat
//! declaration order a valid parent-before-child update order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Structural problems in a scene description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// Two bodies share the same name.
    #[error("duplicate body name '{0}'")]
    DuplicateBodyName(String),

    /// A body names a parent that is not declared before it.
    #[error("body '{body}' references parent '{parent}' which is not declared before it")]
    UndeclaredParent { body: String, parent: String },
}

/// One celestial body in the scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    /// Unique display name, also the key parent references use.
    pub name: String,
    /// Sphere diameter in world units.
    pub diameter: f32,
    /// Offset along +X from the parent at construction time.
    pub distance_from_parent: f32,
    /// Spin rate about the body's own vertical axis.
    pub rotation_rate: f32,
    /// Orbit rate around the parent.
    pub revolution_rate: f32,
    /// Surface texture file. `None` uses the procedural fallback.
    pub texture: Option<PathBuf>,
    /// Whether the surface ignores scene lighting.
    pub emits_light: bool,
    /// Whether the body occludes light falling on other bodies.
    pub cast_shadow: bool,
    /// Whether other bodies' shadows darken this surface.
    pub receive_shadow: bool,
    /// Name of the body this one orbits. Must be declared earlier.
    pub parent: Option<String>,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            diameter: 1.0,
            distance_from_parent: 0.0,
            rotation_rate: 0.0,
            revolution_rate: 0.0,
            texture: None,
            emits_light: false,
            cast_shadow: true,
            receive_shadow: true,
            parent: None,
        }
    }
}

/// The static background sphere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackdropConfig {
    /// Sphere radius. Large enough to enclose every body and the camera.
    pub radius: f32,
    /// Background texture file. `None` uses the procedural star field.
    pub texture: Option<PathBuf>,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            radius: 9000.0,
            texture: Some(PathBuf::from("texture/space.jpg")),
        }
    }
}

/// The single point light at the origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    /// Light color in linear RGB.
    pub color: [f32; 3],
    /// Brightness multiplier.
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// Complete scene description.
///
/// The default reproduces the reference scene: a self-lit sun, a planet
/// orbiting it, and a moon orbiting the planet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Background sphere settings.
    pub backdrop: BackdropConfig,
    /// Point light settings.
    pub light: LightConfig,
    /// Bodies in declaration order (parents before children).
    pub bodies: Vec<BodyConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            backdrop: BackdropConfig::default(),
            light: LightConfig::default(),
            bodies: vec![
                BodyConfig {
                    name: "sun".to_string(),
                    diameter: 108.0,
                    rotation_rate: 0.001,
                    texture: Some(PathBuf::from("texture/sun.jpg")),
                    emits_light: true,
                    cast_shadow: false,
                    receive_shadow: false,
                    ..BodyConfig::default()
                },
                BodyConfig {
                    name: "earth".to_string(),
                    diameter: 10.0,
                    distance_from_parent: 108.0,
                    rotation_rate: 0.1,
                    revolution_rate: 0.01,
                    texture: Some(PathBuf::from("texture/earth.jpg")),
                    parent: Some("sun".to_string()),
                    ..BodyConfig::default()
                },
                BodyConfig {
                    name: "moon".to_string(),
                    diameter: 5.0,
                    distance_from_parent: 20.0,
                    rotation_rate: 0.1,
                    revolution_rate: 0.5,
                    texture: Some(PathBuf::from("texture/moon.jpg")),
                    parent: Some("earth".to_string()),
                    ..BodyConfig::default()
                },
            ],
        }
    }
}

impl SceneConfig {
    /// Load a scene from a standalone RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let scene: SceneConfig = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        scene.validate()?;
        log::info!("Loaded scene from {}", path.display());
        Ok(scene)
    }

    /// Check the structural invariants: body names are unique and every
    /// parent is declared before the bodies that orbit it.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for body in &self.bodies {
            if let Some(parent) = &body.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(SceneError::UndeclaredParent {
                        body: body.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            if !seen.insert(body.name.as_str()) {
                return Err(SceneError::DuplicateBodyName(body.name.clone()));
            }
        }
        Ok(())
    }
}
