//! Host-side interruption of a blocked call.
//!
//! An [`Interrupt`] is a cloneable handle. The host keeps one clone and the
//! blocked call receives another; [`Interrupt::trigger`] wakes every wait
//! registered on it. Once triggered it stays triggered until [`reset`].
//!
//! [`reset`]: Interrupt::reset

use crate::sync::completion::CompletionSignal;
use crate::types::CancelReason;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

#[derive(Default)]
struct State {
    reason: Option<CancelReason>,
    waiters: Vec<Weak<CompletionSignal>>,
}

/// Cloneable interruption handle.
///
/// # Example
///
/// ```
/// use lanemac::sync::Interrupt;
/// use lanemac::types::CancelReason;
///
/// let interrupt = Interrupt::new();
/// let host = interrupt.clone();
/// assert!(!interrupt.is_triggered());
///
/// host.trigger(CancelReason::user("packet dropped"));
/// assert!(interrupt.is_triggered());
/// ```
#[derive(Clone, Default)]
pub struct Interrupt {
    state: Arc<Mutex<State>>,
}

impl Interrupt {
    /// Creates an untriggered interrupt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the interrupt and wakes every registered wait.
    ///
    /// A second trigger keeps the more severe reason.
    pub fn trigger(&self, reason: CancelReason) {
        let waiters = {
            let mut state = self.state.lock();
            let merged = match state.reason.take() {
                Some(mut existing) => {
                    existing.strengthen(&reason);
                    existing
                }
                None => reason,
            };
            state.reason = Some(merged);
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters.iter().filter_map(Weak::upgrade) {
            waiter.notify();
        }
    }

    /// Returns `true` once triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.state.lock().reason.is_some()
    }

    /// Returns the trigger reason, if triggered.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.state.lock().reason.clone()
    }

    /// Clears the trigger so the handle can guard another call.
    pub fn reset(&self) {
        self.state.lock().reason = None;
    }

    pub(crate) fn register(&self, signal: &Arc<CompletionSignal>) {
        let mut state = self.state.lock();
        state.waiters.retain(|w| w.strong_count() > 0);
        state.waiters.push(Arc::downgrade(signal));
    }

    #[cfg(test)]
    fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interrupt")
            .field("reason", &self.reason())
            .finish()
    }
}
