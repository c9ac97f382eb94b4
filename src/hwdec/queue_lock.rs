// SPDX-License-Identifier: GPL-3.0-only

//! Queue submission arbitration between the decoder and the renderer
//!
//! The decoder locks and unlocks queues through two separate callbacks, so a
//! guard-based mutex cannot be held across them. A raw mutex is taken in
//! [`QueueArbiter::lock`] and released in [`QueueArbiter::unlock`].

use crate::gpu::QueueOwner;
use parking_lot::RawMutex;
use parking_lot::lock_api::RawMutex as _;
use std::sync::Arc;
use tracing::{trace, warn};

/// Serializes queue submissions made through the decoder's lock hooks
///
/// Not reentrant: a thread must unlock before locking again.
pub struct QueueArbiter {
    mutex: RawMutex,
    queues: Arc<dyn QueueOwner>,
}

impl QueueArbiter {
    pub fn new(queues: Arc<dyn QueueOwner>) -> Self {
        Self {
            mutex: RawMutex::INIT,
            queues,
        }
    }

    /// Take the arbiter, then the renderer's native queue lock
    pub fn lock(&self, family: u32, index: u32) {
        self.mutex.lock();
        trace!(family, index, "Queue locked");
        self.queues.lock_queue(family, index);
    }

    /// Release the renderer's native queue lock, then the arbiter
    ///
    /// Must be paired with an earlier [`QueueArbiter::lock`] from the same
    /// submission. Only an unlock while nobody holds the arbiter is detected
    /// and ignored; a stray unlock while another submission holds it releases
    /// that submission's lock.
    pub fn unlock(&self, family: u32, index: u32) {
        if !self.mutex.is_locked() {
            warn!(family, index, "Queue unlock without matching lock");
            return;
        }
        self.queues.unlock_queue(family, index);
        // SAFETY: the mutex is held; lock/unlock pairs are issued by the same
        // logical submission and the arbiter is not reentrant.
        unsafe { self.mutex.unlock() };
        trace!(family, index, "Queue unlocked");
    }

    /// Whether some submission currently holds the arbiter
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }
}
