//! Solar-system simulation core: hierarchical celestial bodies advanced once
//! per rendered frame by a fixed spin-and-revolve rule.

mod body;
mod system;

pub use body::{BodyParams, CelestialBody, FRAME_ANGULAR_STEP};
pub use system::{BodyId, SolarSystem, SystemError};
