//! Outcome counters for a [`MacService`](super::MacService).

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotone counters, one per call outcome.
#[derive(Debug, Default)]
pub struct MacStats {
    /// Successful WRITE calls.
    pub generated: AtomicU64,
    /// READ calls whose tag matched.
    pub verified_ok: AtomicU64,
    /// READ calls whose tag did not match.
    pub verified_fail: AtomicU64,
    /// Sessions opened on behalf of a lane.
    pub sessions_created: AtomicU64,
    /// Failed session creations.
    pub session_failures: AtomicU64,
    /// Busy completions that were resubmitted.
    pub busy_retries: AtomicU64,
    /// Calls whose wait was interrupted or timed out.
    pub interrupted: AtomicU64,
    /// Calls that ended in `EngineUnavailable` or `EngineFailed`.
    pub engine_failures: AtomicU64,
    /// Calls rejected before reaching the engine.
    pub malformed: AtomicU64,
}

impl MacStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> MacStatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MacStatsSnapshot {
            generated: load(&self.generated),
            verified_ok: load(&self.verified_ok),
            verified_fail: load(&self.verified_fail),
            sessions_created: load(&self.sessions_created),
            session_failures: load(&self.session_failures),
            busy_retries: load(&self.busy_retries),
            interrupted: load(&self.interrupted),
            engine_failures: load(&self.engine_failures),
            malformed: load(&self.malformed),
        }
    }
}

/// Serializable snapshot of [`MacStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct MacStatsSnapshot {
    pub generated: u64,
    pub verified_ok: u64,
    pub verified_fail: u64,
    pub sessions_created: u64,
    pub session_failures: u64,
    pub busy_retries: u64,
    pub interrupted: u64,
    pub engine_failures: u64,
    pub malformed: u64,
}
