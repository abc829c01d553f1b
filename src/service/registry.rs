//! Per-lane session and tag-cache state.
//!
//! Each lane owns two independent locks: one serializes session creation,
//! the other guards the last tag computed by a READ. Lanes never share a
//! lock, so traffic on one lane does not stall another.

use super::stats::MacStats;
use crate::engine::{CryptoEngine, MacAlgorithm};
use crate::security::{AuthKey, MacError, MacResult, MacTag};
use crate::tracing_compat::{debug, warn};
use crate::types::{LaneId, SessionHandle};
use parking_lot::Mutex;

/// State of one lane.
#[derive(Debug)]
pub struct LaneState {
    id: LaneId,
    session: Mutex<Option<SessionHandle>>,
    tag_cache: Mutex<MacTag>,
}

impl LaneState {
    fn new(id: LaneId) -> Self {
        Self {
            id,
            session: Mutex::new(None),
            tag_cache: Mutex::new(MacTag::zero()),
        }
    }

    /// The lane's id.
    #[must_use]
    pub const fn id(&self) -> LaneId {
        self.id
    }

    /// The lane's session, if one has been opened.
    #[must_use]
    pub fn session(&self) -> Option<SessionHandle> {
        *self.session.lock()
    }

    /// Returns the lane's session, opening it on first use.
    ///
    /// Concurrent first calls on one lane produce a single engine session. A
    /// failed creation leaves the lane unset so the next call tries again.
    pub fn ensure_session(
        &self,
        engine: &dyn CryptoEngine,
        key: &AuthKey,
        stats: &MacStats,
    ) -> MacResult<SessionHandle> {
        let mut slot = self.session.lock();
        if let Some(handle) = *slot {
            return Ok(handle);
        }
        match engine.create_session(MacAlgorithm::FIXED, key) {
            Ok(handle) => {
                *slot = Some(handle);
                MacStats::bump(&stats.sessions_created);
                debug!(lane = %self.id, session = %handle, "lane session opened");
                Ok(handle)
            }
            Err(err) => {
                MacStats::bump(&stats.session_failures);
                warn!(lane = %self.id, error = %err, "lane session creation failed");
                Err(MacError::session_creation_failed().with_context(err.to_string()))
            }
        }
    }

    /// Stores `computed` as the lane's last tag and compares it with `wire`.
    ///
    /// Both steps run under the cache lock, so concurrent READs on one lane
    /// observe and compare their own tag.
    #[must_use]
    pub fn check_and_cache(&self, computed: MacTag, wire: &[u8]) -> bool {
        let mut cache = self.tag_cache.lock();
        *cache = computed;
        cache.ct_eq(wire)
    }

    /// The tag most recently computed by a READ on this lane.
    #[must_use]
    pub fn cached_tag(&self) -> MacTag {
        *self.tag_cache.lock()
    }
}

/// Fixed-size table of lanes.
#[derive(Debug)]
pub struct LaneTable {
    lanes: Box<[LaneState]>,
}

impl LaneTable {
    /// Creates `count` lanes, all without a session.
    #[must_use]
    pub fn new(count: usize) -> Self {
        let lanes = (0..count)
            .filter_map(|i| u8::try_from(i).ok())
            .map(|i| LaneState::new(LaneId::new(i)))
            .collect();
        Self { lanes }
    }

    /// Number of lanes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Returns `true` if the table has no lanes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Looks up a lane.
    pub fn get(&self, lane: LaneId) -> MacResult<&LaneState> {
        self.lanes.get(lane.index()).ok_or_else(|| {
            MacError::invalid_lane().with_context(format!("{lane} of {}", self.lanes.len()))
        })
    }

    /// Iterates over every lane.
    pub fn iter(&self) -> impl Iterator<Item = &LaneState> {
        self.lanes.iter()
    }
}
