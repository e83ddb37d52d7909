//! Host boundary - display geometry and raw event delivery.
//!
//! The host owns the physical window. It reports the display geometry as a
//! [`DisplaySnapshot`] and pushes raw input into whatever listener sets are
//! registered with it. Hooks are never called from here: listeners only
//! buffer, and the tick loop dispatches.
//!
//! ```text
//!  host event context                     tick loop
//!  ──────────────────                     ─────────
//!  RawInput ─► HostHandle::deliver ─┬─► CharSender  ─► CharQueue::drain
//!                                   ├─► WheelSender ─► WheelAccumulator::take
//!                                   └─► DeviceFeed  ─► DeviceTracker::refresh
//! ```

pub mod terminal;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::state::{CharSender, DeviceFeed, Key, WheelSender};
use crate::types::{ConsoleConfig, DisplaySnapshot};

// =============================================================================
// TYPES
// =============================================================================

/// Raw input as produced by a host, before any per-tick processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    /// A typed character.
    Char(char),
    /// Wheel rotation in notches, positive towards the user.
    Wheel(i32),
    /// A key or button changed state.
    Key { key: Key, down: bool },
    /// The pointer moved, in physical window coordinates.
    PointerMoved { x: i32, y: i32 },
    /// The physical window changed size.
    Resized { width: i32, height: i32 },
}

/// The listener set one dispatcher registers with a host.
#[derive(Debug, Clone)]
pub struct InputListeners {
    pub device: DeviceFeed,
    pub chars: CharSender,
    pub wheel: WheelSender,
}

impl InputListeners {
    /// Forward one raw input. Window changes are the host's concern and are
    /// ignored here.
    pub fn deliver(&self, input: RawInput) {
        let delivered = match input {
            RawInput::Char(c) => self.chars.push(c),
            RawInput::Wheel(delta) => self.wheel.add(delta),
            RawInput::Key { key, down } => self.device.set_key(key, down),
            RawInput::PointerMoved { x, y } => self.device.move_pointer(x, y),
            RawInput::Resized { .. } => true,
        };
        if !delivered {
            warn!(?input, "listener is gone, dropping input");
        }
    }
}

/// Identifies a registered listener set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A display host that panels register with.
pub trait InputHost {
    /// Current display geometry.
    fn display(&self) -> DisplaySnapshot;

    /// Start delivering raw input to `listeners`.
    fn register(&mut self, listeners: InputListeners) -> ListenerId;

    /// Stop delivering to a listener set. Unknown ids are ignored.
    fn deregister(&mut self, id: ListenerId);
}

// =============================================================================
// VIRTUAL HOST
// =============================================================================

#[derive(Debug)]
struct HostState {
    config: ConsoleConfig,
    window: (i32, i32),
    display: DisplaySnapshot,
    listeners: Vec<(ListenerId, InputListeners)>,
    next_id: u64,
}

/// In-memory host with a letterboxed console.
///
/// Raw input is injected through a [`HostHandle`], which can be moved to any
/// thread to play the role of the OS event context.
#[derive(Debug)]
pub struct VirtualHost {
    handle: HostHandle,
}

impl VirtualHost {
    /// Create a host with a window of the given physical size.
    pub fn new(
        config: ConsoleConfig,
        window_width: i32,
        window_height: i32,
    ) -> Result<Self, ConfigError> {
        let display = DisplaySnapshot::letterbox(window_width, window_height, &config)?;
        let state = HostState {
            config,
            window: (window_width, window_height),
            display,
            listeners: Vec::new(),
            next_id: 0,
        };
        Ok(Self {
            handle: HostHandle {
                state: Arc::new(Mutex::new(state)),
            },
        })
    }

    /// Handle for injecting raw input from any thread.
    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }

    /// Physical window size.
    pub fn window_size(&self) -> (i32, i32) {
        self.handle.lock().window
    }

    /// Number of registered listener sets.
    pub fn listener_count(&self) -> usize {
        self.handle.lock().listeners.len()
    }
}

impl InputHost for VirtualHost {
    fn display(&self) -> DisplaySnapshot {
        self.handle.lock().display
    }

    fn register(&mut self, listeners: InputListeners) -> ListenerId {
        let mut state = self.handle.lock();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, listeners));
        debug!(?id, "registered input listeners");
        id
    }

    fn deregister(&mut self, id: ListenerId) {
        let mut state = self.handle.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(listener_id, _)| *listener_id != id);
        if state.listeners.len() != before {
            debug!(?id, "deregistered input listeners");
        }
    }
}

/// Cloneable, thread-safe injection handle for a [`VirtualHost`].
#[derive(Debug, Clone)]
pub struct HostHandle {
    state: Arc<Mutex<HostState>>,
}

impl HostHandle {
    /// Deliver one raw input to every registered listener set.
    ///
    /// A resize recomputes the letterbox. If the new window cannot show the
    /// console the previous geometry is kept and the error returned.
    pub fn deliver(&self, input: RawInput) -> Result<(), ConfigError> {
        match input {
            RawInput::Resized { width, height } => self.resize(width, height),
            _ => {
                self.broadcast(input);
                Ok(())
            }
        }
    }

    pub fn type_char(&self, c: char) {
        self.broadcast(RawInput::Char(c));
    }

    pub fn type_str(&self, text: &str) {
        for c in text.chars() {
            self.type_char(c);
        }
    }

    pub fn rotate_wheel(&self, delta: i32) {
        self.broadcast(RawInput::Wheel(delta));
    }

    pub fn set_key(&self, key: Key, down: bool) {
        self.broadcast(RawInput::Key { key, down });
    }

    pub fn move_pointer(&self, x: i32, y: i32) {
        self.broadcast(RawInput::PointerMoved { x, y });
    }

    /// Recompute the letterbox for a new window size.
    pub fn resize(&self, width: i32, height: i32) -> Result<(), ConfigError> {
        let mut state = self.lock();
        let snapshot = DisplaySnapshot::letterbox(width, height, &state.config)?;
        state.window = (width, height);
        state.display = snapshot;
        debug!(width, height, scale = snapshot.scale_factor(), "window resized");
        Ok(())
    }

    /// Forward input to every listener set. Cannot fail.
    fn broadcast(&self, input: RawInput) {
        let state = self.lock();
        for (_, listeners) in &state.listeners {
            listeners.deliver(input);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// TESTS
// =============================================================================
