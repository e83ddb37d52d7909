//! Keyboard Module - Typed character buffer
//!
//! Characters arrive from the host's event context at arbitrary times and are
//! consumed by the tick loop exactly once per tick.
//!
//! # API
//!
//! - `char_queue()` - Create a connected producer/consumer pair
//! - `CharSender::push(c)` - Append a character (any thread)
//! - `CharQueue::drain()` - Take every pending character in arrival order
//!
//! # Example
//!
//! ```ignore
//! let (tx, queue) = keyboard::char_queue();
//!
//! std::thread::spawn(move || {
//!     tx.push('h');
//!     tx.push('i');
//! });
//!
//! for c in queue.drain() {
//!     panel.on_key_press(c);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::trace;

type Buffer = Mutex<VecDeque<char>>;

/// Create a connected sender and queue.
pub fn char_queue() -> (CharSender, CharQueue) {
    let queue = CharQueue::new();
    (queue.sender(), queue)
}

// =============================================================================
// PRODUCER
// =============================================================================

/// Producer handle for the character buffer.
///
/// Cheap to clone and safe to use from any thread. Holds only a weak
/// reference, so once the queue is gone every push is discarded.
#[derive(Clone, Debug)]
pub struct CharSender {
    buffer: Weak<Buffer>,
}

impl CharSender {
    /// A sender that is not connected to any queue.
    pub fn detached() -> Self {
        Self {
            buffer: Weak::new(),
        }
    }

    /// Append a character. Returns false if the queue no longer exists.
    pub fn push(&self, c: char) -> bool {
        let Some(buffer) = self.buffer.upgrade() else {
            return false;
        };
        buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(c);
        true
    }

    /// Whether the queue this sender feeds still exists.
    pub fn is_connected(&self) -> bool {
        self.buffer.strong_count() > 0
    }
}

// =============================================================================
// CONSUMER
// =============================================================================

/// Consumer side of the character buffer. Owned by the tick loop.
#[derive(Debug, Default)]
pub struct CharQueue {
    buffer: Arc<Buffer>,
}

impl CharQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sender feeding this queue.
    pub fn sender(&self) -> CharSender {
        CharSender {
            buffer: Arc::downgrade(&self.buffer),
        }
    }

    /// Take every pending character in arrival order.
    ///
    /// The buffer is swapped out under the lock, so a push racing with the
    /// drain lands either in the returned batch or in the next one.
    pub fn drain(&self) -> std::collections::vec_deque::IntoIter<char> {
        let batch = std::mem::take(&mut *self.lock());
        if !batch.is_empty() {
            trace!(count = batch.len(), "draining typed characters");
        }
        batch.into_iter()
    }

    /// Drop every pending character and cut off existing senders.
    ///
    /// Senders created before this call report themselves disconnected and
    /// their pushes return false. New senders feed the fresh buffer.
    pub fn disconnect(&mut self) {
        self.buffer = Arc::default();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<char>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// TESTS
// =============================================================================
