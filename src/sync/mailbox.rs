//! Single-slot latest-value handoff between a producer and one consumer thread
//!
//! `put` never waits for the consumer: a value that is still pending when a
//! new one arrives is replaced and handed back to the caller, so only the
//! freshest value is ever taken.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use super::cancel::CancelListener;

#[derive(Debug)]
struct Slot<T> {
    pending: Option<T>,
    closed: bool,
}

/// Outcome of [`Mailbox::put`]
#[derive(Debug)]
pub enum PutOutcome<T> {
    /// Stored in an empty slot
    Stored,
    /// Stored; the previous pending value was displaced and is returned
    Replaced(T),
    /// The mailbox is closed; the value is handed back untouched
    Closed(T),
}

/// One mutex and one condition variable guarding an optional value
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    /// Create an empty, open mailbox
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `value` as the pending value and wake the consumer
    ///
    /// The lock is held only for the swap.
    pub fn put(&self, value: T) -> PutOutcome<T> {
        let previous = {
            let mut slot = self.lock();
            if slot.closed {
                return PutOutcome::Closed(value);
            }
            slot.pending.replace(value)
        };
        self.ready.notify_one();

        match previous {
            Some(old) => PutOutcome::Replaced(old),
            None => PutOutcome::Stored,
        }
    }

    /// Block until a value is pending or the mailbox is closed
    ///
    /// Returns `None` once closed, even if a value is still pending.
    pub fn take(&self) -> Option<T> {
        let mut slot = self.lock();
        while slot.pending.is_none() && !slot.closed {
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if slot.closed {
            return None;
        }
        slot.pending.take()
    }

    /// Like [`take`](Self::take) but gives up after `timeout`
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let slot = self.lock();
        let (mut slot, _) = self
            .ready
            .wait_timeout_while(slot, timeout, |slot| {
                slot.pending.is_none() && !slot.closed
            })
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.closed {
            return None;
        }
        slot.pending.take()
    }

    /// Take the pending value without waiting
    pub fn try_take(&self) -> Option<T> {
        self.lock().pending.take()
    }

    /// Check whether a value is waiting
    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Refuse further puts and wake the consumer
    ///
    /// Returns the value that was still pending, if any.
    pub fn close(&self) -> Option<T> {
        let pending = {
            let mut slot = self.lock();
            slot.closed = true;
            slot.pending.take()
        };
        self.ready.notify_all();
        pending
    }

    /// Check whether the mailbox was closed
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T: Send> CancelListener for Mailbox<T> {
    fn on_cancel(&self) {
        // The displaced value is dropped here, outside the lock
        drop(self.close());
    }
}
