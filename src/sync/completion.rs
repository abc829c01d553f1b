//! One-shot completion signal between an engine callback and a blocked caller.
//!
//! # Cancel Safety
//!
//! The waiter and the callback race on a single slot:
//! - the callback stores the finished job unless the waiter already left;
//! - a waiter that leaves (interrupt or timeout) marks the slot abandoned, and
//!   the callback then gets the job back so it can release it.
//!
//! Exactly one side ends up owning the job, so it is released exactly once.

use crate::engine::Job;
use crate::sync::interrupt::Interrupt;
use crate::types::CancelReason;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

enum Slot {
    Pending,
    Completed(Job),
    Taken,
    Abandoned,
}

/// Result of [`CompletionSignal::wait`].
#[derive(Debug)]
pub enum WaitOutcome {
    /// The engine finished; the caller now owns the job.
    Completed(Job),
    /// The wait ended early; the job stays with the engine.
    Interrupted(CancelReason),
}

/// Result of [`CompletionSignal::complete`].
#[derive(Debug)]
pub enum Delivery {
    /// The waiter received the job.
    Delivered,
    /// The waiter had already left; the job comes back to the callback.
    Abandoned(Job),
}

/// A per-job completion slot with a condition variable.
pub struct CompletionSignal {
    slot: Mutex<Slot>,
    cond: Condvar,
}

impl CompletionSignal {
    /// Creates an empty signal.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot::Pending),
            cond: Condvar::new(),
        })
    }

    /// Hands the finished job to the waiter.
    pub fn complete(&self, job: Job) -> Delivery {
        let mut slot = self.slot.lock();
        match *slot {
            Slot::Pending => {
                *slot = Slot::Completed(job);
                self.cond.notify_all();
                Delivery::Delivered
            }
            Slot::Abandoned | Slot::Completed(_) | Slot::Taken => Delivery::Abandoned(job),
        }
    }

    /// Returns `true` once the waiter has given up.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Abandoned)
    }

    /// Wakes the waiter so it re-checks its interrupt.
    pub fn notify(&self) {
        let _slot = self.slot.lock();
        self.cond.notify_all();
    }

    /// Blocks until the job completes, `interrupt` fires, or `timeout` elapses.
    ///
    /// A completion that is already present wins over an interrupt or timeout
    /// observed at the same time.
    pub fn wait(self: &Arc<Self>, interrupt: Option<&Interrupt>, timeout: Option<Duration>) -> WaitOutcome {
        if let Some(interrupt) = interrupt {
            interrupt.register(self);
        }
        let deadline = timeout.map(|t| Instant::now() + t);

        let mut slot = self.slot.lock();
        loop {
            match std::mem::replace(&mut *slot, Slot::Taken) {
                Slot::Completed(job) => return WaitOutcome::Completed(job),
                other => *slot = other,
            }

            if let Some(reason) = interrupt.and_then(Interrupt::reason) {
                *slot = Slot::Abandoned;
                return WaitOutcome::Interrupted(reason);
            }

            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut slot, deadline).timed_out() {
                        if let Slot::Completed(_) = *slot {
                            continue;
                        }
                        *slot = Slot::Abandoned;
                        return WaitOutcome::Interrupted(CancelReason::timeout());
                    }
                }
                None => self.cond.wait(&mut slot),
            }
        }
    }
}

impl std::fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match *self.slot.lock() {
            Slot::Pending => "pending",
            Slot::Completed(_) => "completed",
            Slot::Taken => "taken",
            Slot::Abandoned => "abandoned",
        };
        f.debug_struct("CompletionSignal")
            .field("state", &state)
            .finish()
    }
}
