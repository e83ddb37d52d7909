//! # luag-panel
//!
//! Per-tick input sampling and dispatch for panels inside a fixed-resolution
//! virtual console.
//!
//! ## Architecture
//!
//! Raw input arrives asynchronously from the host (an OS or terminal event
//! thread) and is only ever buffered there. The tick loop owns all dispatch:
//!
//! ```text
//! host thread:  RawInput → CharSender / WheelSender / DeviceFeed
//!                                   │ (thread-safe buffers)
//! tick thread:  refresh → transform → keys → buttons → wheel → Panel hooks
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Logical points, panel bounds, console config, display snapshot
//! - [`state`] - Device tracker, character queue, wheel accumulator
//! - [`panel`] - The panel hook trait
//! - [`pipeline`] - Coordinate transform and the main panel dispatcher
//! - [`host`] - Host trait, in-memory host, crossterm adapter

pub mod error;
pub mod host;
pub mod panel;
pub mod pipeline;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{ConfigError, InputError, Result};

pub use host::{
    HostHandle, InputHost, InputListeners, ListenerId, RawInput, VirtualHost,
    terminal::{TerminalReader, translate},
};

pub use panel::Panel;

pub use pipeline::{MainPanelDispatcher, to_logical};

pub use state::{
    // Device
    ButtonEdge, DeviceFeed, DeviceTracker, Key, KeySampler, MouseButton,
    // Keyboard
    CharQueue, CharSender, char_queue,
    // Scroll
    WheelAccumulator, WheelSender, wheel_accumulator,
};
