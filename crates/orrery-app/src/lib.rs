//! Orrery viewer application framework.
//!
//! Provides window creation, event handling, orbit controls, and the main
//! application loop.

pub mod orbit;
pub mod window;

pub use orbit::OrbitControls;
pub use window::{AppState, run_with_config, window_attributes_from_config};
