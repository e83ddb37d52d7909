//! Panel hook surface.
//!
//! A panel exposes its bounds and reacts to input through hooks. Every hook
//! has a no-op default, so a panel only implements what it cares about.
//!
//! All coordinates passed to hooks are logical and relative to the panel's
//! origin.
//!
//! # Example
//!
//! ```ignore
//! struct Editor {
//!     bounds: PanelBounds,
//!     text: String,
//! }
//!
//! impl Panel for Editor {
//!     fn bounds(&self) -> PanelBounds {
//!         self.bounds
//!     }
//!
//!     fn on_key_press(&mut self, c: char) {
//!         self.text.push(c);
//!     }
//! }
//! ```

use crate::types::PanelBounds;

/// A panel driven by the main dispatcher.
///
/// Hooks run on the tick thread and are expected to return promptly. A hook
/// that panics aborts the rest of the tick; the dispatcher does not catch it.
pub trait Panel {
    /// Rectangle the panel occupies in the console.
    fn bounds(&self) -> PanelBounds;

    /// Hit test for a panel-relative point.
    fn is_point_inside(&self, x: i32, y: i32) -> bool {
        self.bounds().contains(x, y)
    }

    /// Per-tick panel update, run before any input is dispatched.
    fn update(&mut self) {}

    /// A typed character. Not gated by the pointer position.
    fn on_key_press(&mut self, _c: char) {}

    /// Every tick the tracked button is held over the panel.
    fn on_mouse_down(&mut self, _x: i32, _y: i32) {}

    /// The tick the tracked button went down over the panel.
    fn on_mouse_press(&mut self, _x: i32, _y: i32) {}

    /// The tick the tracked button went up over the panel.
    fn on_mouse_release(&mut self, _x: i32, _y: i32) {}

    /// Every tick, wherever the pointer is.
    fn on_mouse_inside(&mut self, _x: i32, _y: i32) {}

    /// Accumulated wheel rotation while the pointer is over the panel.
    fn on_mouse_scroll(&mut self, _x: i32, _y: i32, _delta: i32) {}
}
