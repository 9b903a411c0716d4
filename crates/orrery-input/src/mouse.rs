//! Frame-coherent mouse state tracker.
//!
//! [`MouseState`] accumulates winit mouse events during a frame and exposes a
//! clean query API for position, drag delta, button states, and the scroll
//! wheel. The orbit controls read from here once per frame; the cursor is
//! never captured, so deltas always come from `CursorMoved` positions.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Per-button press/release tracking for a single frame.
#[derive(Debug, Clone, Copy, Default)]
struct ButtonFrame {
    pressed: bool,
    just_pressed: bool,
    just_released: bool,
}

/// Maps a [`MouseButton`] to an index 0..4.
fn button_index(button: MouseButton) -> usize {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
        MouseButton::Back => 3,
        MouseButton::Forward => 4,
        MouseButton::Other(_) => 4,
    }
}

/// Frame-coherent mouse state.
///
/// # Usage
///
/// 1. Forward winit events via the `on_*` methods during event collection.
/// 2. Query state with the public accessors.
/// 3. Call [`clear_transients`](Self::clear_transients) at end of frame.
#[derive(Debug, Clone)]
pub struct MouseState {
    position: Vec2,
    delta: Vec2,
    buttons: [ButtonFrame; 5],
    scroll: f32,
}

impl Default for MouseState {
    fn default() -> Self {
        Self::new()
    }
}

impl MouseState {
    /// Creates a new `MouseState` with all fields zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            delta: Vec2::ZERO,
            buttons: [ButtonFrame::default(); 5],
            scroll: 0.0,
        }
    }

    /// Process a `CursorMoved` event.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        self.delta += new_pos - self.position;
        self.position = new_pos;
    }

    /// Process a `MouseInput` event.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        let idx = button_index(button);
        match state {
            ElementState::Pressed => {
                self.buttons[idx].pressed = true;
                self.buttons[idx].just_pressed = true;
            }
            ElementState::Released => {
                self.buttons[idx].pressed = false;
                self.buttons[idx].just_released = true;
            }
        }
    }

    /// Process a `MouseWheel` event.
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => {
                self.scroll += y;
            }
            MouseScrollDelta::PixelDelta(pos) => {
                // Normalize pixel delta: ~40 pixels ≈ 1 line
                self.scroll += (pos.y / 40.0) as f32;
            }
        }
    }

    /// Clears per-frame transients: delta, scroll, just_pressed, just_released.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
        for b in &mut self.buttons {
            b.just_pressed = false;
            b.just_released = false;
        }
    }

    /// Current cursor position in window-logical coordinates.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Movement delta since last frame clear.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    /// Whether a mouse button is currently held.
    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].pressed
    }

    /// Whether a mouse button was pressed this frame.
    #[must_use]
    pub fn just_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].just_pressed
    }

    /// Whether a mouse button was released this frame.
    #[must_use]
    pub fn just_button_released(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].just_released
    }

    /// Scroll wheel delta accumulated this frame (positive = scroll up).
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }
}
