//! The asynchronous crypto-engine seam.
//!
//! The service never computes a MAC itself. It opens sessions, fills job
//! descriptors, and waits; an implementation of [`CryptoEngine`] does the
//! work on its own schedule and reports back through the job's callback.
//!
//! ```text
//! acquire_job ──▶ dispatch ──▶ (engine) ──▶ Job::complete(outcome)
//!                    ▲                             │
//!                    └──── Busy: resubmit ◀────────┤
//!                                                  ▼
//!                                 waiter wakes ──▶ release_job
//! ```
//!
//! [`soft::SoftEngine`] is an in-process implementation backed by the
//! `hmac` and `sha2` crates.

pub mod job;
pub mod soft;

pub use job::{Job, JobCallback, JobDescriptor, JobOutcome};
pub use soft::{SoftEngine, SoftEngineConfig};

use crate::security::AuthKey;
use crate::types::{JobId, SessionHandle};
use std::time::Duration;
use thiserror::Error;

/// Error codes shared by engines and the status boundary (BSD values).
pub mod errno {
    /// Input/output error.
    pub const EIO: i32 = 5;
    /// Interrupted wait.
    pub const EINTR: i32 = 4;
    /// Invalid argument.
    pub const EINVAL: i32 = 22;
    /// Resource temporarily unavailable; the engine's "try again".
    pub const EAGAIN: i32 = 35;
    /// No buffer space available.
    pub const ENOBUFS: i32 = 55;
    /// The engine is shutting down.
    pub const ESHUTDOWN: i32 = 58;
    /// Authentication error.
    pub const EAUTH: i32 = 80;
}

/// Completion code meaning "resubmit, no result yet".
pub const ENGINE_BUSY: i32 = errno::EAGAIN;

/// The fixed MAC algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgorithm {
    /// HMAC-SHA256, tag truncated to [`TAG_LENGTH`](crate::security::TAG_LENGTH).
    HmacSha256,
}

impl MacAlgorithm {
    /// The algorithm every lane session uses.
    pub const FIXED: Self = Self::HmacSha256;

    /// Numeric algorithm id passed across the engine boundary.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::HmacSha256 => 1,
        }
    }

    /// Required key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::HmacSha256 => crate::security::AUTH_KEY_SIZE,
        }
    }

    /// Full digest length in bytes.
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::HmacSha256 => 32,
        }
    }
}

/// Errors returned by engine session management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The key does not match the algorithm's key length.
    #[error("key length {actual} does not match {expected} required by the algorithm")]
    KeyLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// The engine has no room for another session.
    #[error("session table exhausted ({0} sessions)")]
    SessionsExhausted(usize),
    /// The engine is shutting down.
    #[error("engine shut down")]
    ShutDown,
    /// A failure injected for testing.
    #[error("injected failure")]
    Injected,
}

/// An asynchronous crypto engine.
///
/// Implementations must eventually call [`Job::complete`] exactly once for
/// every dispatched job, from any thread, unless [`cancel`](Self::cancel)
/// handed the job back first.
pub trait CryptoEngine: Send + Sync {
    /// Opens a session bound to `algorithm` and `key`.
    fn create_session(
        &self,
        algorithm: MacAlgorithm,
        key: &AuthKey,
    ) -> Result<SessionHandle, EngineError>;

    /// Takes a job from the engine's pool, or `None` when the pool is dry.
    fn acquire_job(&self, input_capacity: usize) -> Option<Job>;

    /// Queues `job` for asynchronous processing.
    fn dispatch(&self, job: Job);

    /// Queues `job` so processing starts no earlier than `delay` from now.
    ///
    /// Must not block the caller, which is usually a completion callback on
    /// the engine's own thread. The job stays cancellable while it waits.
    /// Engines without a deferred queue keep the default and dispatch at once.
    fn dispatch_after(&self, job: Job, delay: Duration) {
        let _ = delay;
        self.dispatch(job);
    }

    /// Returns `job` to the engine's pool.
    fn release_job(&self, job: Job);

    /// Withdraws a dispatched job that has not started processing.
    ///
    /// Engines without cancellation keep the default, and the job is
    /// released by its callback once it completes.
    fn cancel(&self, _id: JobId) -> Option<Job> {
        None
    }
}
