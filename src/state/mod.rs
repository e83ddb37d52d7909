//! State Module - Input state shared between the host and the tick loop
//!
//! - **Device** - Raw key/button/pointer state and per-tick edge detection
//! - **Keyboard** - Typed character buffer, filled asynchronously
//! - **Scroll** - Wheel rotation accumulator, filled asynchronously

pub mod device;
pub mod keyboard;
pub mod scroll;

pub use device::{ButtonEdge, DeviceFeed, DeviceTracker, Key, KeySampler, MouseButton};
pub use keyboard::{CharQueue, CharSender, char_queue};
pub use scroll::{WheelAccumulator, WheelSender, wheel_accumulator};
