//! Device Module - Per-tick key and button state with edge detection
//!
//! The host writes raw device state through a [`DeviceFeed`] whenever events
//! arrive. Once per tick the [`DeviceTracker`] copies that raw state and
//! derives, for every tracked key, whether it is held, was pressed this tick
//! or was released this tick.
//!
//! # State machine
//!
//! ```text
//! tick:        Up→Down          held          Down→Up
//! flags:    DOWN | PRESSED      DOWN         RELEASED
//! ```
//!
//! A press and release that both land between two refreshes are coalesced:
//! the tick only sees the raw state at refresh time.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

// =============================================================================
// TYPES
// =============================================================================

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// A key or button tracked by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Left,
    Down,
    Right,
    Button(MouseButton),
}

impl Key {
    /// Number of tracked keys.
    pub const COUNT: usize = 7;

    pub const ALL: [Key; Key::COUNT] = [
        Key::Up,
        Key::Left,
        Key::Down,
        Key::Right,
        Key::Button(MouseButton::Left),
        Key::Button(MouseButton::Middle),
        Key::Button(MouseButton::Right),
    ];

    fn index(self) -> usize {
        match self {
            Key::Up => 0,
            Key::Left => 1,
            Key::Down => 2,
            Key::Right => 3,
            Key::Button(MouseButton::Left) => 4,
            Key::Button(MouseButton::Middle) => 5,
            Key::Button(MouseButton::Right) => 6,
        }
    }
}

bitflags::bitflags! {
    /// Edge state of one key for the current tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct ButtonEdge: u8 {
        /// Held at the last refresh.
        const DOWN = 1 << 0;
        /// Went down since the previous refresh.
        const PRESSED = 1 << 1;
        /// Went up since the previous refresh.
        const RELEASED = 1 << 2;
    }
}

impl ButtonEdge {
    /// Derive the edge set from the previous and current held state.
    pub fn between(was_down: bool, is_down: bool) -> Self {
        let mut edge = Self::empty();
        if is_down {
            edge |= Self::DOWN;
        }
        if is_down && !was_down {
            edge |= Self::PRESSED;
        }
        if !is_down && was_down {
            edge |= Self::RELEASED;
        }
        edge
    }

    pub fn is_down(self) -> bool {
        self.contains(Self::DOWN)
    }

    pub fn just_pressed(self) -> bool {
        self.contains(Self::PRESSED)
    }

    pub fn just_released(self) -> bool {
        self.contains(Self::RELEASED)
    }
}

// =============================================================================
// SAMPLER TRAIT
// =============================================================================

/// Per-tick key state consumed by the dispatcher.
///
/// The edge queries describe the one pointer button the dispatcher tracks.
pub trait KeySampler {
    /// Sample raw device state. Called once per tick, before any query.
    fn refresh(&mut self);

    /// Edge state of the tracked pointer button.
    fn edge(&self) -> ButtonEdge;

    fn is_down(&self) -> bool {
        self.edge().is_down()
    }

    fn just_pressed(&self) -> bool {
        self.edge().just_pressed()
    }

    fn just_released(&self) -> bool {
        self.edge().just_released()
    }

    /// Pointer position in physical window coordinates, as of the last refresh.
    fn raw_pointer_position(&self) -> (i32, i32);

    /// Handle the host writes raw device state into.
    fn feed(&self) -> DeviceFeed;

    /// Disconnect from the host and forget all state.
    fn release(&mut self) {}
}

// =============================================================================
// RAW STATE
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct RawDeviceState {
    down: [bool; Key::COUNT],
    pointer: (i32, i32),
}

/// Write handle for raw device state. Safe to use from any thread.
#[derive(Clone, Debug)]
pub struct DeviceFeed {
    raw: Weak<Mutex<RawDeviceState>>,
}

impl DeviceFeed {
    /// Record a key or button going down or up.
    pub fn set_key(&self, key: Key, down: bool) -> bool {
        self.with_raw(|raw| raw.down[key.index()] = down)
    }

    /// Record the pointer's physical position.
    pub fn move_pointer(&self, x: i32, y: i32) -> bool {
        self.with_raw(|raw| raw.pointer = (x, y))
    }

    pub fn is_connected(&self) -> bool {
        self.raw.strong_count() > 0
    }

    fn with_raw(&self, f: impl FnOnce(&mut RawDeviceState)) -> bool {
        let Some(raw) = self.raw.upgrade() else {
            return false;
        };
        let mut guard = raw.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard);
        true
    }
}

// =============================================================================
// TRACKER
// =============================================================================

/// Edge-detecting sampler over all tracked keys.
#[derive(Debug)]
pub struct DeviceTracker {
    raw: Arc<Mutex<RawDeviceState>>,
    was_down: [bool; Key::COUNT],
    edges: [ButtonEdge; Key::COUNT],
    pointer: (i32, i32),
    tracked: Key,
}

impl DeviceTracker {
    /// Create a tracker whose pointer button is `tracked`.
    pub fn new(tracked: Key) -> Self {
        Self {
            raw: Arc::new(Mutex::new(RawDeviceState::default())),
            was_down: [false; Key::COUNT],
            edges: [ButtonEdge::empty(); Key::COUNT],
            pointer: (0, 0),
            tracked,
        }
    }

    /// The pointer button reported through [`KeySampler::edge`].
    pub fn tracked(&self) -> Key {
        self.tracked
    }

    /// Edge state of any tracked key for the current tick.
    pub fn key(&self, key: Key) -> ButtonEdge {
        self.edges[key.index()]
    }

    /// Forget raw and derived state, as if every key were released long ago.
    pub fn reset(&mut self) {
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = RawDeviceState::default();
        self.was_down = [false; Key::COUNT];
        self.edges = [ButtonEdge::empty(); Key::COUNT];
        self.pointer = (0, 0);
    }
}

impl Default for DeviceTracker {
    fn default() -> Self {
        Self::new(Key::Button(MouseButton::Left))
    }
}

impl KeySampler for DeviceTracker {
    fn refresh(&mut self) {
        let raw = *self.raw.lock().unwrap_or_else(PoisonError::into_inner);

        for (i, &is_down) in raw.down.iter().enumerate() {
            self.edges[i] = ButtonEdge::between(self.was_down[i], is_down);
            self.was_down[i] = is_down;
        }
        self.pointer = raw.pointer;
    }

    fn edge(&self) -> ButtonEdge {
        self.key(self.tracked)
    }

    fn raw_pointer_position(&self) -> (i32, i32) {
        self.pointer
    }

    fn feed(&self) -> DeviceFeed {
        DeviceFeed {
            raw: Arc::downgrade(&self.raw),
        }
    }

    fn release(&mut self) {
        // Feeds handed out earlier point at the old state and go dead
        self.raw = Arc::new(Mutex::new(RawDeviceState::default()));
        self.reset();
        debug!("device tracker released");
    }
}

// =============================================================================
// TESTS
// =============================================================================
