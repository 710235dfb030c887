//! Single-slot mailbox handoff between pipeline stages.
//!
//! Each mailbox holds at most one pending item. A mutex guards the slot and
//! two condvars give binary-semaphore semantics: `ready` wakes the consumer
//! when an item is published, `space` wakes a producer waiting for the slot
//! to drain. The producer never blocks on the consumer's processing; the
//! consumer marks itself busy while it works so producers can observe an
//! in-flight item.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

struct Slot<T> {
    payload: Option<T>,
    busy: bool,
}

/// A single-slot synchronized handoff point between two pipeline stages.
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
    space: Condvar,
}

impl<T> Mailbox<T> {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                payload: None,
                busy: false,
            }),
            ready: Condvar::new(),
            space: Condvar::new(),
        }
    }

    /// Publishes an item without blocking.
    ///
    /// Refuses to overwrite a pending (unread) item; the rejected item is
    /// handed back to the caller.
    pub fn try_publish(&self, item: T) -> Result<(), T> {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.payload.is_some() {
            return Err(item);
        }
        slot.payload = Some(item);
        drop(slot);
        self.ready.notify_one();
        Ok(())
    }

    /// Publishes an item, waiting up to `deadline` for the slot to drain.
    ///
    /// Used by the manual-stop flush path so a partial chunk is not silently
    /// dropped when the slot is momentarily occupied.
    pub fn publish_deadline(&self, mut item: T, deadline: Duration) -> Result<(), T> {
        let start = Instant::now();
        loop {
            item = match self.try_publish(item) {
                Ok(()) => return Ok(()),
                Err(rejected) => rejected,
            };

            let elapsed = start.elapsed();
            if elapsed >= deadline {
                return Err(item);
            }

            let mut slot = match self.slot.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if slot.payload.is_some() {
                let (guard, _timeout) = match self.space.wait_timeout(slot, deadline - elapsed) {
                    Ok(pair) => pair,
                    Err(poisoned) => poisoned.into_inner(),
                };
                slot = guard;
            }
            drop(slot);
        }
    }

    /// Waits up to `timeout` for an item, marking the consumer busy when one
    /// is taken.
    ///
    /// The caller processes the item outside the lock and must call
    /// [`finish`](Self::finish) when done.
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        while slot.payload.is_none() {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _timeout) = match self.ready.wait_timeout(slot, deadline - now) {
                Ok(pair) => pair,
                Err(poisoned) => poisoned.into_inner(),
            };
            slot = guard;
        }

        slot.busy = true;
        let item = slot.payload.take();
        drop(slot);
        // Slot is writable again even while processing continues
        self.space.notify_one();
        item
    }

    /// Marks the in-flight item as fully processed.
    pub fn finish(&self) {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.busy = false;
        drop(slot);
        self.space.notify_one();
    }

    /// True when the consumer is processing a previously taken item.
    pub fn is_busy(&self) -> bool {
        match self.slot.lock() {
            Ok(guard) => guard.busy,
            Err(poisoned) => poisoned.into_inner().busy,
        }
    }

    /// True when nothing is pending and nothing is being processed.
    pub fn is_idle(&self) -> bool {
        match self.slot.lock() {
            Ok(guard) => guard.payload.is_none() && !guard.busy,
            Err(poisoned) => {
                let guard = poisoned.into_inner();
                guard.payload.is_none() && !guard.busy
            }
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
