//! The per-lane MAC service.
//!
//! [`MacService`] turns one asynchronous engine round trip into a blocking
//! call. Every call follows the same path:
//!
//! ```text
//! authenticate(lane, cmd, &mut len, buf)
//!   │
//!   ├─ lane lookup ─────────────── InvalidLane
//!   ├─ WireLayout::split ───────── MalformedRequest (no engine activity)
//!   ├─ LaneState::ensure_session ─ SessionCreationFailed
//!   ├─ run: acquire ─ dispatch ─ wait ─ release
//!   │        │                     └── WaitInterrupted / EngineFailed
//!   │        └── EngineUnavailable
//!   └─ Write: tag → buffer
//!      Read:  cache tag, compare ── AuthenticationMismatch (len = 0)
//! ```

mod dispatch;
pub mod registry;
pub mod stats;
pub mod status;

pub use registry::{LaneState, LaneTable};
pub use stats::{MacStats, MacStatsSnapshot};
pub use status::{Command, SyscallStatus, UnknownCommand};

use crate::config::{ConfigError, RetryPolicy, ServiceConfig};
use crate::engine::CryptoEngine;
use crate::security::{AuthKey, MacError, MacResult, MacTag, Regions, WireLayout};
use crate::sync::Interrupt;
use crate::tracing_compat::{debug, info, warn};
use crate::types::{LaneId, SessionHandle};
use std::sync::Arc;
use std::time::Duration;

/// Keyed-MAC generation and verification over a [`CryptoEngine`].
///
/// The service is `Send + Sync`; share it behind an `Arc` and call it from
/// as many threads as there are lanes.
pub struct MacService {
    engine: Arc<dyn CryptoEngine>,
    key: Arc<AuthKey>,
    lanes: LaneTable,
    config: ServiceConfig,
    stats: Arc<MacStats>,
}

impl MacService {
    /// Creates a service with the default configuration.
    #[must_use]
    pub fn new(engine: Arc<dyn CryptoEngine>, key: AuthKey) -> Self {
        Self::from_parts(engine, key, ServiceConfig::default())
    }

    /// Starts a builder for a service over `engine`.
    #[must_use]
    pub fn builder(engine: Arc<dyn CryptoEngine>) -> MacServiceBuilder {
        MacServiceBuilder {
            engine,
            key: None,
            config: ServiceConfig::default(),
        }
    }

    fn from_parts(engine: Arc<dyn CryptoEngine>, key: AuthKey, config: ServiceConfig) -> Self {
        info!(
            lanes = config.lane_count,
            prefix = config.layout.reference_prefix_len,
            tag_offset = config.layout.tag_offset,
            "mac service ready"
        );
        Self {
            engine,
            key: Arc::new(key),
            lanes: LaneTable::new(config.lane_count),
            config,
            stats: Arc::new(MacStats::default()),
        }
    }

    /// Number of lanes.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Outcome counters.
    #[must_use]
    pub fn stats(&self) -> &MacStats {
        &self.stats
    }

    /// The lane table.
    #[must_use]
    pub const fn lanes(&self) -> &LaneTable {
        &self.lanes
    }

    /// The lane's session, if opened.
    pub fn session(&self, lane: u8) -> MacResult<Option<SessionHandle>> {
        Ok(self.lanes.get(LaneId::new(lane))?.session())
    }

    /// The tag most recently computed by a READ on the lane.
    pub fn cached_tag(&self, lane: u8) -> MacResult<MacTag> {
        Ok(self.lanes.get(LaneId::new(lane))?.cached_tag())
    }

    /// Opens the lane's session now instead of on its first call.
    pub fn ensure_session(&self, lane: u8) -> MacResult<SessionHandle> {
        let lane = self.lanes.get(LaneId::new(lane))?;
        self.open_session(lane)
    }

    // =====================================================================
    // Syscall surface
    // =====================================================================

    /// Handles one raw request.
    ///
    /// `length` is the request length inside `buffer`. A tag mismatch sets it
    /// to zero; every other outcome leaves it unchanged.
    ///
    /// ```
    /// use lanemac::engine::SoftEngine;
    /// use lanemac::security::AuthKey;
    /// use lanemac::service::{Command, MacService, SyscallStatus};
    ///
    /// let engine = SoftEngine::with_defaults().unwrap();
    /// let service = MacService::new(engine, AuthKey::from_seed(7));
    ///
    /// let mut buffer = [0u8; 25];
    /// buffer[20..].copy_from_slice(b"hello");
    /// let mut length = 25u16;
    ///
    /// let status = service.authenticate(0, Command::Write, &mut length, &mut buffer);
    /// assert_eq!(status, SyscallStatus::Success);
    /// let status = service.authenticate(0, Command::Read, &mut length, &mut buffer);
    /// assert_eq!(status, SyscallStatus::Success);
    ///
    /// buffer[19] ^= 1;
    /// let status = service.authenticate(0, Command::Read, &mut length, &mut buffer);
    /// assert_eq!(status, SyscallStatus::AuthenticationMismatch);
    /// assert_eq!(length, 0);
    /// ```
    pub fn authenticate(
        &self,
        lane: u8,
        command: Command,
        length: &mut u16,
        buffer: &mut [u8],
    ) -> SyscallStatus {
        self.authenticate_inner(None, lane, command, length, buffer)
    }

    /// Like [`authenticate`](Self::authenticate), but the wait ends early when
    /// `interrupt` fires.
    pub fn authenticate_with(
        &self,
        interrupt: &Interrupt,
        lane: u8,
        command: Command,
        length: &mut u16,
        buffer: &mut [u8],
    ) -> SyscallStatus {
        self.authenticate_inner(Some(interrupt), lane, command, length, buffer)
    }

    fn authenticate_inner(
        &self,
        interrupt: Option<&Interrupt>,
        lane: u8,
        command: Command,
        length: &mut u16,
        buffer: &mut [u8],
    ) -> SyscallStatus {
        let lane = LaneId::new(lane);
        let total = usize::from(*length);
        let result = match command {
            Command::Write => self.generate_inner(interrupt, lane, buffer, total),
            Command::Read => self.verify_inner(interrupt, lane, buffer, total),
        };
        if result.as_ref().is_err_and(MacError::is_mismatch) {
            *length = 0;
        }
        SyscallStatus::from_result(&result)
    }

    // =====================================================================
    // Typed surface
    // =====================================================================

    /// Computes the tag over `buffer[..length]` and writes it into the tag
    /// region.
    pub fn generate(&self, lane: u8, buffer: &mut [u8], length: usize) -> MacResult<()> {
        self.generate_inner(None, LaneId::new(lane), buffer, length)
    }

    /// Interruptible [`generate`](Self::generate).
    pub fn generate_with(
        &self,
        interrupt: &Interrupt,
        lane: u8,
        buffer: &mut [u8],
        length: usize,
    ) -> MacResult<()> {
        self.generate_inner(Some(interrupt), LaneId::new(lane), buffer, length)
    }

    /// Recomputes the tag over `buffer[..length]` and compares it with the
    /// tag region.
    pub fn verify(&self, lane: u8, buffer: &[u8], length: usize) -> MacResult<()> {
        self.verify_inner(None, LaneId::new(lane), buffer, length)
    }

    /// Interruptible [`verify`](Self::verify).
    pub fn verify_with(
        &self,
        interrupt: &Interrupt,
        lane: u8,
        buffer: &[u8],
        length: usize,
    ) -> MacResult<()> {
        self.verify_inner(Some(interrupt), LaneId::new(lane), buffer, length)
    }

    fn generate_inner(
        &self,
        interrupt: Option<&Interrupt>,
        lane: LaneId,
        buffer: &mut [u8],
        length: usize,
    ) -> MacResult<()> {
        let (state, regions) = self.prepare(lane, buffer, length)?;
        let session = self.open_session(state)?;
        let tag = self.run(lane, session, &regions, buffer, interrupt)?;
        regions.tag_mut(buffer).copy_from_slice(tag.as_bytes());
        MacStats::bump(&self.stats.generated);
        Ok(())
    }

    fn verify_inner(
        &self,
        interrupt: Option<&Interrupt>,
        lane: LaneId,
        buffer: &[u8],
        length: usize,
    ) -> MacResult<()> {
        let (state, regions) = self.prepare(lane, buffer, length)?;
        let session = self.open_session(state)?;
        let tag = self.run(lane, session, &regions, buffer, interrupt)?;
        if state.check_and_cache(tag, regions.tag(buffer)) {
            MacStats::bump(&self.stats.verified_ok);
            Ok(())
        } else {
            MacStats::bump(&self.stats.verified_fail);
            warn!(%lane, length, "tag mismatch");
            Err(MacError::mismatch().with_context(format!("{lane}")))
        }
    }

    fn prepare(&self, lane: LaneId, buffer: &[u8], length: usize) -> MacResult<(&LaneState, Regions)> {
        let checked = self
            .lanes
            .get(lane)
            .and_then(|state| Ok((state, self.config.layout.split(buffer.len(), length)?)));
        if let Err(err) = &checked {
            MacStats::bump(&self.stats.malformed);
            debug!(%lane, length, error = %err, "request rejected");
        }
        checked
    }

    fn open_session(&self, lane: &LaneState) -> MacResult<SessionHandle> {
        lane.ensure_session(self.engine.as_ref(), &self.key, &self.stats)
    }
}

impl std::fmt::Debug for MacService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacService")
            .field("lanes", &self.lanes.len())
            .field("config", &self.config)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MacService`].
///
/// ```
/// use lanemac::engine::SoftEngine;
/// use lanemac::security::AuthKey;
/// use lanemac::service::MacService;
/// use std::time::Duration;
///
/// let service = MacService::builder(SoftEngine::with_defaults().unwrap())
///     .key(AuthKey::from_seed(1))
///     .lane_count(4)
///     .wait_timeout(Duration::from_secs(1))
///     .build()
///     .unwrap();
/// assert_eq!(service.lane_count(), 4);
/// ```
#[must_use]
pub struct MacServiceBuilder {
    engine: Arc<dyn CryptoEngine>,
    key: Option<AuthKey>,
    config: ServiceConfig,
}

impl MacServiceBuilder {
    /// Sets the shared key.
    pub fn key(mut self, key: AuthKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of lanes.
    pub const fn lane_count(mut self, count: usize) -> Self {
        self.config.lane_count = count;
        self
    }

    /// Sets the wire layout.
    pub const fn layout(mut self, layout: WireLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Sets the busy resubmission policy.
    pub const fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Bounds the wait for each engine completion.
    ///
    /// Sub-millisecond remainders round up, so any nonzero timeout stays
    /// nonzero.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.config.wait_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// Validates the configuration and creates the service.
    pub fn build(self) -> Result<MacService, ConfigError> {
        let key = self.key.ok_or(ConfigError::MissingKey)?;
        if let Err(err) = self.config.validate() {
            warn!(error = %err, "rejected service configuration");
            return Err(err);
        }
        Ok(MacService::from_parts(self.engine, key, self.config))
    }
}

impl std::fmt::Debug for MacServiceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacServiceBuilder")
            .field("has_key", &self.key.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
