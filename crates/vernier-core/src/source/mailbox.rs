use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::frame::Frame;

/// Single-slot, last-writer-wins frame handoff between a source worker and
/// the consumer.
///
/// `ready` is only flipped while the slot lock is held, so a consumer that
/// observes `ready == true` and then takes the frame always gets the frame
/// that set the flag, or a newer one.
#[derive(Debug, Default)]
pub struct FrameMailbox {
    slot: Mutex<Option<Frame>>,
    ready: AtomicBool,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Frame>> {
        // A worker that panicked mid-publish never leaves a half-written
        // frame behind (the slot is assigned whole), so the data is usable.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the held frame and mark it ready. An unconsumed frame is
    /// silently overwritten.
    pub fn publish(&self, frame: Frame) {
        let previous = {
            let mut slot = self.lock();
            let previous = slot.replace(frame);
            self.ready.store(true, Ordering::Release);
            previous
        };
        // Release the old buffer outside the critical section.
        drop(previous);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Clear readiness and return the held frame.
    ///
    /// Callers are expected to check [`is_ready`](Self::is_ready) first; when
    /// the mailbox is not ready this returns the last frame again (possibly
    /// stale), or `None` if nothing was ever published.
    pub fn take(&self) -> Option<Frame> {
        let slot = self.lock();
        self.ready.store(false, Ordering::Release);
        slot.clone()
    }

    /// At-most-once read: returns the held frame only if it has not been
    /// consumed since it was published.
    pub fn take_ready(&self) -> Option<Frame> {
        let slot = self.lock();
        if self.ready.swap(false, Ordering::AcqRel) {
            slot.clone()
        } else {
            None
        }
    }

    /// Drop the held frame and clear readiness.
    pub fn clear(&self) {
        let previous = {
            let mut slot = self.lock();
            self.ready.store(false, Ordering::Release);
            slot.take()
        };
        drop(previous);
    }
}
