//! One engine round trip: acquire, fill, dispatch, wait, release.
//!
//! The job's callback runs on whatever thread the engine completes on. It
//! resubmits busy completions within the [`RetryPolicy`], deferring the
//! resubmission by the policy's backoff instead of sleeping on the engine's
//! thread. Otherwise it hands the job to the blocked caller. If the caller
//! has already left, the callback releases the job itself.

use super::stats::MacStats;
use super::MacService;
use crate::config::RetryPolicy;
use crate::engine::{CryptoEngine, ENGINE_BUSY, Job, JobDescriptor, JobOutcome, MacAlgorithm, errno};
use crate::security::{MacError, MacResult, MacTag, Regions};
use crate::sync::{CompletionSignal, Delivery, Interrupt, WaitOutcome};
use crate::tracing_compat::{debug, trace, warn};
use crate::types::{LaneId, SessionHandle};
use std::sync::{Arc, Weak};

struct Completion {
    engine: Weak<dyn CryptoEngine>,
    signal: Arc<CompletionSignal>,
    retry: RetryPolicy,
    stats: Arc<MacStats>,
}

impl Completion {
    fn on_complete(&self, mut job: Job) {
        if job.outcome() == JobOutcome::Busy && !self.signal.is_abandoned() {
            if self.retry.allows(job.busy_retries()) {
                if let Some(engine) = self.engine.upgrade() {
                    job.rearm_after_busy();
                    MacStats::bump(&self.stats.busy_retries);
                    trace!(job = %job.id(), attempt = job.busy_retries(), "engine busy, resubmitting");
                    let backoff = self.retry.busy_backoff();
                    if backoff.is_zero() {
                        engine.dispatch(job);
                    } else {
                        engine.dispatch_after(job, backoff);
                    }
                    return;
                }
            } else {
                warn!(job = %job.id(), retries = job.busy_retries(), "busy retries exhausted");
                job.set_outcome(JobOutcome::Failed(ENGINE_BUSY));
            }
        }

        if let Delivery::Abandoned(job) = self.signal.complete(job) {
            trace!(job = %job.id(), "releasing job abandoned by its caller");
            if let Some(engine) = self.engine.upgrade() {
                engine.release_job(job);
            }
        }
    }
}

impl MacService {
    /// Computes the tag over the payload region of `buffer` on `lane`.
    pub(super) fn run(
        &self,
        lane: LaneId,
        session: SessionHandle,
        regions: &Regions,
        buffer: &[u8],
        interrupt: Option<&Interrupt>,
    ) -> MacResult<MacTag> {
        let Some(mut job) = self.engine.acquire_job(regions.payload_len()) else {
            MacStats::bump(&self.stats.engine_failures);
            return Err(MacError::engine_unavailable().with_context(format!("{lane}: no job available")));
        };

        regions.copy_payload_masked(buffer, job.input_mut());
        job.set_descriptor(JobDescriptor {
            session,
            algorithm: MacAlgorithm::FIXED,
            key: Arc::clone(&self.key),
            skip: 0,
            length: regions.payload_len(),
            inject: 0,
        });

        let signal = CompletionSignal::new();
        let completion = Completion {
            engine: Arc::downgrade(&self.engine),
            signal: Arc::clone(&signal),
            retry: self.config.retry,
            stats: Arc::clone(&self.stats),
        };
        job.set_callback(Arc::new(move |job: Job| completion.on_complete(job)));

        let id = job.id();
        self.engine.dispatch(job);

        let job = match signal.wait(interrupt, self.config.wait_timeout()) {
            WaitOutcome::Completed(job) => job,
            WaitOutcome::Interrupted(reason) => {
                MacStats::bump(&self.stats.interrupted);
                debug!(%lane, job = %id, %reason, "wait interrupted");
                if let Some(job) = self.engine.cancel(id) {
                    self.engine.release_job(job);
                }
                return Err(MacError::interrupted().with_context(reason.to_string()));
            }
        };

        let result = match job.outcome() {
            JobOutcome::Done => job
                .output()
                .get(job.descriptor().map_or(0, |d| d.inject)..)
                .and_then(MacTag::from_prefix)
                .ok_or_else(|| {
                    MacError::engine_failed(errno::EIO).with_context("engine output shorter than a tag")
                }),
            outcome => {
                let code = match outcome.error_code() {
                    Some(code) if code > 0 => code,
                    _ => errno::EIO,
                };
                debug!(%lane, job = %id, code, "engine job failed");
                Err(MacError::engine_failed(code))
            }
        };
        if result.is_err() {
            MacStats::bump(&self.stats.engine_failures);
        }
        self.engine.release_job(job);
        result
    }
}
