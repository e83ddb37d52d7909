//! Pipeline Module - Per-tick input dispatch
//!
//! ```text
//! DisplaySnapshot ─┐
//! KeySampler ──────┼─► to_logical ─► MainPanelDispatcher ─► Panel hooks
//! CharQueue ───────┤
//! WheelAccumulator ┘
//! ```

pub mod dispatcher;
pub mod transform;

pub use dispatcher::MainPanelDispatcher;
pub use transform::to_logical;
