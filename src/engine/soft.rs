//! In-process software engine.
//!
//! [`SoftEngine`] owns a worker thread that drains a FIFO of dispatched jobs,
//! computes HMAC-SHA256 over each job's input window, and completes the job
//! through its callback. It exists so the service can run without hardware
//! and so tests can script the engine's failure modes:
//!
//! - [`SoftEngine::inject_session_failures`]: the next N `create_session`
//!   calls fail.
//! - [`SoftEngine::inject_busy`]: the next N processed jobs complete `Busy`.
//! - [`SoftEngine::inject_job_failures`]: the next N processed jobs fail with
//!   a chosen code.
//! - [`SoftEngine::pause`] / [`SoftEngine::resume`]: hold dispatched jobs in
//!   the queue so a caller stays blocked.
//!
//! Jobs queued through `dispatch_after` wait in the same queue until their
//! delay passes. They stay cancellable, and jobs behind them are not held up.

use crate::engine::errno;
use crate::engine::{CryptoEngine, EngineError, Job, JobOutcome, MacAlgorithm};
use crate::observability::ResourceAccounting;
use crate::security::{AuthKey, TAG_LENGTH};
use crate::tracing_compat::{debug, trace};
use crate::types::{JobId, SessionHandle};
use hmac::Hmac;
use hmac::digest::KeyInit;
use hmac::Mac as _;
use parking_lot::{Condvar, Mutex};
use sha2::Sha256;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

type HmacSha256 = Hmac<Sha256>;

/// Capacity limits of a [`SoftEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftEngineConfig {
    /// Jobs that may be outstanding (acquired but not released) at once.
    pub job_capacity: usize,
    /// Sessions the engine will open before refusing.
    pub session_capacity: usize,
}

impl Default for SoftEngineConfig {
    fn default() -> Self {
        Self {
            job_capacity: 64,
            session_capacity: 256,
        }
    }
}

struct Queued {
    job: Job,
    not_before: Option<Instant>,
}

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Queued>,
    paused: bool,
    shutdown: bool,
}

impl Queue {
    /// Removes the oldest job whose delay has passed.
    fn pop_ready(&mut self, now: Instant) -> Option<Job> {
        let index = self
            .jobs
            .iter()
            .position(|q| q.not_before.is_none_or(|at| at <= now))?;
        self.jobs.remove(index).map(|q| q.job)
    }

    /// Earliest pending delay, if any job is deferred.
    fn next_deadline(&self) -> Option<Instant> {
        self.jobs.iter().filter_map(|q| q.not_before).min()
    }
}

#[derive(Default)]
struct Pool {
    free: Vec<Job>,
    outstanding: usize,
}

#[derive(Default)]
struct Faults {
    fail_sessions: u32,
    busy: u32,
    job_failures: u32,
    job_failure_code: i32,
}

struct Shared {
    config: SoftEngineConfig,
    queue: Mutex<Queue>,
    ready: Condvar,
    sessions: Mutex<HashMap<SessionHandle, (MacAlgorithm, AuthKey)>>,
    next_session: AtomicU64,
    pool: Mutex<Pool>,
    faults: Mutex<Faults>,
    accounting: ResourceAccounting,
}

/// Software HMAC-SHA256 engine with a dedicated worker thread.
///
/// Dropping the engine stops the worker; jobs still queued complete with
/// `Failed(ESHUTDOWN)`.
pub struct SoftEngine {
    shared: Arc<Shared>,
}

impl SoftEngine {
    /// Starts an engine with the given limits.
    pub fn new(config: SoftEngineConfig) -> io::Result<Arc<Self>> {
        let shared = Arc::new(Shared {
            config,
            queue: Mutex::new(Queue::default()),
            ready: Condvar::new(),
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
            pool: Mutex::new(Pool::default()),
            faults: Mutex::new(Faults::default()),
            accounting: ResourceAccounting::new(),
        });

        let worker = Arc::clone(&shared);
        thread::Builder::new()
            .name("lanemac-soft-engine".to_string())
            .spawn(move || worker_loop(&worker))?;

        debug!(
            job_capacity = config.job_capacity,
            session_capacity = config.session_capacity,
            "soft engine started"
        );
        Ok(Arc::new(Self { shared }))
    }

    /// Starts an engine with default limits.
    pub fn with_defaults() -> io::Result<Arc<Self>> {
        Self::new(SoftEngineConfig::default())
    }

    /// Resource counters for jobs and sessions.
    #[must_use]
    pub fn accounting(&self) -> &ResourceAccounting {
        &self.shared.accounting
    }

    /// Number of sessions currently open.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.shared.sessions.lock().len()
    }

    /// Jobs dispatched but not yet picked up by the worker.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.shared.queue.lock().jobs.len()
    }

    /// Makes the next `count` session creations fail.
    pub fn inject_session_failures(&self, count: u32) {
        self.shared.faults.lock().fail_sessions = count;
    }

    /// Makes the next `count` processed jobs complete `Busy`.
    pub fn inject_busy(&self, count: u32) {
        self.shared.faults.lock().busy = count;
    }

    /// Makes the next `count` processed jobs fail with `code`.
    pub fn inject_job_failures(&self, count: u32, code: i32) {
        let mut faults = self.shared.faults.lock();
        faults.job_failures = count;
        faults.job_failure_code = code;
    }

    /// Clears every pending fault.
    pub fn clear_faults(&self) {
        *self.shared.faults.lock() = Faults::default();
    }

    /// Stops the worker from taking new jobs off the queue.
    pub fn pause(&self) {
        self.shared.queue.lock().paused = true;
    }

    /// Lets the worker drain the queue again.
    pub fn resume(&self) {
        self.shared.queue.lock().paused = false;
        self.shared.ready.notify_all();
    }

    /// Stops the worker. Queued and later dispatched jobs fail with
    /// `ESHUTDOWN`.
    pub fn shutdown(&self) {
        self.shared.queue.lock().shutdown = true;
        self.shared.ready.notify_all();
    }
}

impl CryptoEngine for SoftEngine {
    fn create_session(
        &self,
        algorithm: MacAlgorithm,
        key: &AuthKey,
    ) -> Result<SessionHandle, EngineError> {
        let shared = &self.shared;
        {
            let mut faults = shared.faults.lock();
            if faults.fail_sessions > 0 {
                faults.fail_sessions -= 1;
                shared.accounting.session_failed();
                return Err(EngineError::Injected);
            }
        }
        if shared.queue.lock().shutdown {
            shared.accounting.session_failed();
            return Err(EngineError::ShutDown);
        }
        if key.len() != algorithm.key_len() {
            shared.accounting.session_failed();
            return Err(EngineError::KeyLength {
                expected: algorithm.key_len(),
                actual: key.len(),
            });
        }

        let mut sessions = shared.sessions.lock();
        if sessions.len() >= shared.config.session_capacity {
            shared.accounting.session_failed();
            return Err(EngineError::SessionsExhausted(sessions.len()));
        }
        let handle = SessionHandle::from_raw(shared.next_session.fetch_add(1, Ordering::Relaxed));
        sessions.insert(handle, (algorithm, key.clone()));
        drop(sessions);

        shared.accounting.session_created();
        debug!(session = %handle, algorithm = algorithm.id(), "session created");
        Ok(handle)
    }

    fn acquire_job(&self, input_capacity: usize) -> Option<Job> {
        let shared = &self.shared;
        let mut pool = shared.pool.lock();
        if pool.outstanding >= shared.config.job_capacity {
            drop(pool);
            shared.accounting.acquire_failed();
            return None;
        }
        pool.outstanding += 1;
        let job = pool.free.pop();
        drop(pool);

        let mut job = job.unwrap_or_else(|| Job::new(input_capacity));
        job.input_mut().reserve(input_capacity);
        shared.accounting.job_acquired();
        Some(job)
    }

    fn dispatch(&self, job: Job) {
        self.enqueue(job, None);
    }

    fn dispatch_after(&self, job: Job, delay: Duration) {
        let not_before = (!delay.is_zero()).then(|| Instant::now() + delay);
        self.enqueue(job, not_before);
    }

    fn release_job(&self, mut job: Job) {
        job.reset();
        let mut pool = self.shared.pool.lock();
        pool.outstanding = pool.outstanding.saturating_sub(1);
        if pool.free.len() < self.shared.config.job_capacity {
            pool.free.push(job);
        }
        drop(pool);
        self.shared.accounting.job_released();
    }

    fn cancel(&self, id: JobId) -> Option<Job> {
        let mut queue = self.shared.queue.lock();
        let index = queue.jobs.iter().position(|q| q.job.id() == id)?;
        let job = queue.jobs.remove(index).map(|q| q.job);
        drop(queue);
        if job.is_some() {
            self.shared.accounting.job_cancelled();
            debug!(job = %id, "queued job cancelled");
        }
        job
    }
}

impl SoftEngine {
    fn enqueue(&self, job: Job, not_before: Option<Instant>) {
        let shared = &self.shared;
        shared.accounting.job_dispatched();
        let mut queue = shared.queue.lock();
        if queue.shutdown {
            drop(queue);
            shared.accounting.job_failed();
            job.complete(JobOutcome::Failed(errno::ESHUTDOWN));
            return;
        }
        trace!(
            job = %job.id(),
            depth = queue.jobs.len(),
            deferred = not_before.is_some(),
            "job queued"
        );
        queue.jobs.push_back(Queued { job, not_before });
        drop(queue);
        shared.ready.notify_one();
    }
}

impl Drop for SoftEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SoftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftEngine")
            .field("config", &self.shared.config)
            .field("queued", &self.queued_len())
            .field("sessions", &self.session_count())
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Worker
// =========================================================================

enum Next {
    Run(Job),
    Drain(Vec<Job>),
}

fn worker_loop(shared: &Shared) {
    loop {
        let next = {
            let mut queue = shared.queue.lock();
            loop {
                if queue.shutdown {
                    break Next::Drain(queue.jobs.drain(..).map(|q| q.job).collect());
                }
                if queue.paused {
                    shared.ready.wait(&mut queue);
                    continue;
                }
                if let Some(job) = queue.pop_ready(Instant::now()) {
                    break Next::Run(job);
                }
                match queue.next_deadline() {
                    Some(deadline) => {
                        shared.ready.wait_until(&mut queue, deadline);
                    }
                    None => shared.ready.wait(&mut queue),
                }
            }
        };

        match next {
            Next::Run(mut job) => {
                let outcome = process(shared, &mut job);
                match outcome {
                    JobOutcome::Done => shared.accounting.job_completed(),
                    JobOutcome::Busy => shared.accounting.job_busy(),
                    JobOutcome::Failed(_) | JobOutcome::Pending => shared.accounting.job_failed(),
                }
                trace!(job = %job.id(), ?outcome, "job processed");
                job.complete(outcome);
            }
            Next::Drain(jobs) => {
                debug!(drained = jobs.len(), "soft engine stopping");
                for job in jobs {
                    shared.accounting.job_failed();
                    job.complete(JobOutcome::Failed(errno::ESHUTDOWN));
                }
                return;
            }
        }
    }
}

fn process(shared: &Shared, job: &mut Job) -> JobOutcome {
    {
        let mut faults = shared.faults.lock();
        if faults.busy > 0 {
            faults.busy -= 1;
            return JobOutcome::Busy;
        }
        if faults.job_failures > 0 {
            faults.job_failures -= 1;
            return JobOutcome::Failed(faults.job_failure_code);
        }
    }

    let Some(desc) = job.descriptor() else {
        return JobOutcome::Failed(errno::EINVAL);
    };
    let (session, skip, length, inject) = (desc.session, desc.skip, desc.length, desc.inject);
    if desc.key_len() != desc.algorithm.key_len() {
        return JobOutcome::Failed(errno::EINVAL);
    }
    let Some(end) = skip.checked_add(length).filter(|end| *end <= job.input().len()) else {
        return JobOutcome::Failed(errno::EINVAL);
    };

    let tag = {
        let sessions = shared.sessions.lock();
        let Some((_, key)) = sessions.get(&session) else {
            return JobOutcome::Failed(errno::EINVAL);
        };
        match compute_tag(key, &job.input()[skip..end]) {
            Some(tag) => tag,
            None => return JobOutcome::Failed(errno::EIO),
        }
    };

    let output = job.output_mut();
    output.clear();
    output.resize(inject, 0);
    output.extend_from_slice(&tag);
    JobOutcome::Done
}

fn compute_tag(key: &AuthKey, data: &[u8]) -> Option<[u8; TAG_LENGTH]> {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(key.as_bytes()).ok()?;
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    let mut tag = [0u8; TAG_LENGTH];
    tag.copy_from_slice(&digest[..TAG_LENGTH]);
    Some(tag)
}
