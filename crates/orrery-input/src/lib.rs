//! Input abstraction: frame-coherent mouse and keyboard state for the viewer.

pub mod keyboard;
pub mod mouse;

pub use keyboard::{KeyboardState, RawKeyEvent};
pub use mouse::MouseState;
