//! Resource accounting for engine jobs and sessions.
//!
//! Provides monotone counters for the job lifecycle (acquire, dispatch,
//! complete, release) and session creation, plus a live gauge of outstanding
//! jobs with its high-water mark. An engine that owns a `ResourceAccounting`
//! lets tests prove that no call path leaks a job.
//!
//! # Design Principles
//!
//! 1. **Monotone where expected**: acquisition, release, dispatch, and session
//!    counters never decrease. The outstanding gauge may.
//! 2. **Lock-free**: all counters are atomics with relaxed ordering.
//!
//! # Usage
//!
//! ```
//! use lanemac::observability::ResourceAccounting;
//!
//! let accounting = ResourceAccounting::new();
//! accounting.job_acquired();
//! accounting.job_acquired();
//! assert_eq!(accounting.jobs_outstanding(), 2);
//!
//! accounting.job_released();
//! assert_eq!(accounting.jobs_outstanding(), 1);
//! assert_eq!(accounting.jobs_peak(), 2);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Job and session accounting.
#[derive(Debug, Default)]
pub struct ResourceAccounting {
    // === Job lifecycle ===
    /// Jobs handed out by the pool.
    jobs_acquired: AtomicU64,
    /// Jobs returned to the pool.
    jobs_released: AtomicU64,
    /// Acquisitions refused because the pool was dry.
    acquire_failures: AtomicU64,
    /// Jobs queued, including busy resubmissions.
    dispatches: AtomicU64,
    /// Jobs answered with a busy outcome.
    busy_outcomes: AtomicU64,
    /// Jobs completed successfully.
    completions: AtomicU64,
    /// Jobs completed with a terminal failure.
    failures: AtomicU64,
    /// Jobs withdrawn before processing.
    cancellations: AtomicU64,

    // === Job gauge ===
    /// Jobs acquired and not yet released.
    outstanding: AtomicI64,
    /// Peak of `outstanding`.
    outstanding_peak: AtomicI64,

    // === Sessions ===
    /// Sessions opened.
    sessions_created: AtomicU64,
    /// Session requests refused.
    session_failures: AtomicU64,
}

impl ResourceAccounting {
    /// Creates an accounting instance with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ================================================================
    // Recording
    // ================================================================

    /// Record that a job left the pool.
    pub fn job_acquired(&self) {
        self.jobs_acquired.fetch_add(1, Ordering::Relaxed);
        let now = self.outstanding.fetch_add(1, Ordering::Relaxed) + 1;
        update_peak(&self.outstanding_peak, now);
    }

    /// Record that a job returned to the pool.
    pub fn job_released(&self) {
        self.jobs_released.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a refused acquisition.
    pub fn acquire_failed(&self) {
        self.acquire_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dispatch.
    pub fn job_dispatched(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a busy answer.
    pub fn job_busy(&self) {
        self.busy_outcomes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful completion.
    pub fn job_completed(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a terminal failure.
    pub fn job_failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cancellation.
    pub fn job_cancelled(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an opened session.
    pub fn session_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a refused session.
    pub fn session_failed(&self) {
        self.session_failures.fetch_add(1, Ordering::Relaxed);
    }

    // ================================================================
    // Queries
    // ================================================================

    /// Total jobs acquired.
    #[must_use]
    pub fn jobs_acquired(&self) -> u64 {
        self.jobs_acquired.load(Ordering::Relaxed)
    }

    /// Total jobs released.
    #[must_use]
    pub fn jobs_released(&self) -> u64 {
        self.jobs_released.load(Ordering::Relaxed)
    }

    /// Jobs currently outside the pool.
    #[must_use]
    pub fn jobs_outstanding(&self) -> i64 {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Highest number of jobs ever outside the pool at once.
    #[must_use]
    pub fn jobs_peak(&self) -> i64 {
        self.outstanding_peak.load(Ordering::Relaxed)
    }

    /// Total refused acquisitions.
    #[must_use]
    pub fn acquire_failures(&self) -> u64 {
        self.acquire_failures.load(Ordering::Relaxed)
    }

    /// Total dispatches.
    #[must_use]
    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    /// Total busy answers.
    #[must_use]
    pub fn busy_outcomes(&self) -> u64 {
        self.busy_outcomes.load(Ordering::Relaxed)
    }

    /// Total sessions opened.
    #[must_use]
    pub fn sessions_created(&self) -> u64 {
        self.sessions_created.load(Ordering::Relaxed)
    }

    /// Total session refusals.
    #[must_use]
    pub fn session_failures(&self) -> u64 {
        self.session_failures.load(Ordering::Relaxed)
    }

    /// Takes a consistent-enough copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> AccountingSnapshot {
        AccountingSnapshot {
            jobs_acquired: self.jobs_acquired(),
            jobs_released: self.jobs_released(),
            jobs_outstanding: self.jobs_outstanding(),
            jobs_peak: self.jobs_peak(),
            acquire_failures: self.acquire_failures(),
            dispatches: self.dispatches(),
            busy_outcomes: self.busy_outcomes(),
            completions: self.completions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            sessions_created: self.sessions_created(),
            session_failures: self.session_failures(),
        }
    }
}

/// Point-in-time copy of [`ResourceAccounting`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccountingSnapshot {
    /// Jobs handed out by the pool.
    pub jobs_acquired: u64,
    /// Jobs returned to the pool.
    pub jobs_released: u64,
    /// Jobs acquired and not yet released.
    pub jobs_outstanding: i64,
    /// Peak of `jobs_outstanding`.
    pub jobs_peak: i64,
    /// Acquisitions refused because the pool was dry.
    pub acquire_failures: u64,
    /// Jobs queued, including busy resubmissions.
    pub dispatches: u64,
    /// Jobs answered with a busy outcome.
    pub busy_outcomes: u64,
    /// Jobs completed successfully.
    pub completions: u64,
    /// Jobs completed with a terminal failure.
    pub failures: u64,
    /// Jobs withdrawn before processing.
    pub cancellations: u64,
    /// Sessions opened.
    pub sessions_created: u64,
    /// Session requests refused.
    pub session_failures: u64,
}

fn update_peak(peak: &AtomicI64, value: i64) {
    let mut current = peak.load(Ordering::Relaxed);
    while value > current {
        match peak.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }
}
