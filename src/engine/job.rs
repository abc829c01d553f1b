//! Engine job descriptors.
//!
//! A [`Job`] is acquired from the engine's pool, filled by the service,
//! handed to [`CryptoEngine::dispatch`](super::CryptoEngine::dispatch), and
//! comes back through its callback when the engine calls [`Job::complete`].
//! It always ends in [`CryptoEngine::release_job`](super::CryptoEngine::release_job).

use crate::engine::MacAlgorithm;
use crate::engine::errno;
use crate::security::AuthKey;
use crate::types::{JobId, SessionHandle};
use core::fmt;
use std::sync::Arc;

/// Completion handler invoked by the engine with the finished job.
pub type JobCallback = Arc<dyn Fn(Job) + Send + Sync>;

/// State of a job as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOutcome {
    /// Not yet processed.
    Pending,
    /// The MAC was computed and written to the output region.
    Done,
    /// The engine could not take the job now; resubmit it.
    Busy,
    /// Terminal failure with an engine error code.
    Failed(i32),
}

impl JobOutcome {
    /// Returns the error code of an unsuccessful outcome.
    ///
    /// `Busy` and `Pending` map to [`errno::EAGAIN`]: a job that comes back in
    /// either state never produced a result.
    #[must_use]
    pub const fn error_code(self) -> Option<i32> {
        match self {
            Self::Done => None,
            Self::Failed(code) => Some(code),
            Self::Busy | Self::Pending => Some(errno::EAGAIN),
        }
    }
}

/// Parameters of one MAC computation.
#[derive(Clone)]
pub struct JobDescriptor {
    /// Session opened for the calling lane.
    pub session: SessionHandle,
    /// Algorithm the session was opened with.
    pub algorithm: MacAlgorithm,
    /// Key the session was opened with.
    pub key: Arc<AuthKey>,
    /// Input bytes to skip before the MAC'd range.
    pub skip: usize,
    /// Number of input bytes covered by the MAC.
    pub length: usize,
    /// Offset in the output region where the digest is written.
    pub inject: usize,
}

impl JobDescriptor {
    /// Key length in bytes.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.key.len()
    }
}

impl fmt::Debug for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDescriptor")
            .field("session", &self.session)
            .field("algorithm", &self.algorithm)
            .field("key", &self.key)
            .field("skip", &self.skip)
            .field("length", &self.length)
            .field("inject", &self.inject)
            .finish()
    }
}

/// A transient engine job: descriptor, input and output regions, outcome,
/// and completion callback.
pub struct Job {
    id: JobId,
    descriptor: Option<JobDescriptor>,
    input: Vec<u8>,
    output: Vec<u8>,
    outcome: JobOutcome,
    busy_retries: u32,
    callback: Option<JobCallback>,
}

impl Job {
    /// Creates an empty job whose input region can hold `input_capacity` bytes
    /// without reallocating. Engines call this to fill their pools.
    #[must_use]
    pub fn new(input_capacity: usize) -> Self {
        Self {
            id: JobId::next(),
            descriptor: None,
            input: Vec::with_capacity(input_capacity),
            output: Vec::new(),
            outcome: JobOutcome::Pending,
            busy_retries: 0,
            callback: None,
        }
    }

    /// Returns the job id.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the descriptor, if one was installed.
    #[must_use]
    pub const fn descriptor(&self) -> Option<&JobDescriptor> {
        self.descriptor.as_ref()
    }

    /// Installs the descriptor.
    pub fn set_descriptor(&mut self, descriptor: JobDescriptor) {
        self.descriptor = Some(descriptor);
    }

    /// Installs the completion callback.
    pub fn set_callback(&mut self, callback: JobCallback) {
        self.callback = Some(callback);
    }

    /// The input region.
    #[must_use]
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// The input region, mutably.
    pub fn input_mut(&mut self) -> &mut Vec<u8> {
        &mut self.input
    }

    /// The output region.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// The output region, mutably.
    pub fn output_mut(&mut self) -> &mut Vec<u8> {
        &mut self.output
    }

    /// The outcome recorded by the engine.
    #[must_use]
    pub const fn outcome(&self) -> JobOutcome {
        self.outcome
    }

    /// Overrides the outcome before the job reaches its waiter.
    pub fn set_outcome(&mut self, outcome: JobOutcome) {
        self.outcome = outcome;
    }

    /// Number of times this job was resubmitted after a busy outcome.
    #[must_use]
    pub const fn busy_retries(&self) -> u32 {
        self.busy_retries
    }

    /// Counts a busy resubmission and rearms the job for dispatch.
    pub fn rearm_after_busy(&mut self) {
        self.busy_retries = self.busy_retries.saturating_add(1);
        self.outcome = JobOutcome::Pending;
    }

    /// Records `outcome` and hands the job to its callback.
    ///
    /// Engines call this exactly once per dispatch. A job without a callback
    /// was never dispatched by the service and is dropped.
    pub fn complete(mut self, outcome: JobOutcome) {
        self.outcome = outcome;
        if let Some(callback) = self.callback.clone() {
            callback(self);
        }
    }

    /// Clears everything but the buffer capacity so the job can go back into
    /// a pool.
    ///
    /// The job gets a fresh id, so an id held by a previous owner can never
    /// name the recycled job.
    pub fn reset(&mut self) {
        self.id = JobId::next();
        self.descriptor = None;
        self.input.clear();
        self.output.clear();
        self.outcome = JobOutcome::Pending;
        self.busy_retries = 0;
        self.callback = None;
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("input_len", &self.input.len())
            .field("output_len", &self.output.len())
            .field("outcome", &self.outcome)
            .field("busy_retries", &self.busy_retries)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
