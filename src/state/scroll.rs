//! Scroll Module - Wheel rotation accumulator
//!
//! The host adds wheel notches whenever they arrive; the tick loop takes the
//! sum once per tick and the counter starts again from zero.
//!
//! Positive deltas scroll towards the user (down), negative away (up).

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};

/// Create a connected sender and accumulator.
pub fn wheel_accumulator() -> (WheelSender, WheelAccumulator) {
    let accumulator = WheelAccumulator::new();
    (accumulator.sender(), accumulator)
}

/// Producer handle for the wheel counter. Safe to use from any thread.
#[derive(Clone, Debug)]
pub struct WheelSender {
    total: Weak<AtomicI32>,
}

impl WheelSender {
    /// A sender that is not connected to any accumulator.
    pub fn detached() -> Self {
        Self { total: Weak::new() }
    }

    /// Add wheel rotation. Returns false if the accumulator no longer exists.
    pub fn add(&self, delta: i32) -> bool {
        let Some(total) = self.total.upgrade() else {
            return false;
        };
        if delta != 0 {
            // Saturate instead of wrapping when a tick is very late
            let _ = total.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(delta))
            });
        }
        true
    }

    pub fn is_connected(&self) -> bool {
        self.total.strong_count() > 0
    }
}

/// Consumer side of the wheel counter. Owned by the tick loop.
#[derive(Debug, Default)]
pub struct WheelAccumulator {
    total: Arc<AtomicI32>,
}

impl WheelAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sender feeding this accumulator.
    pub fn sender(&self) -> WheelSender {
        WheelSender {
            total: Arc::downgrade(&self.total),
        }
    }

    /// Read the accumulated rotation and reset it to zero in one step.
    pub fn take(&self) -> i32 {
        self.total.swap(0, Ordering::AcqRel)
    }

    /// Discard the accumulated rotation and cut off existing senders.
    pub fn disconnect(&mut self) {
        self.total = Arc::default();
    }
}

// =============================================================================
// TESTS
// =============================================================================
