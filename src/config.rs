//! Service configuration.
//!
//! Every field has a default, so an empty TOML document is equivalent to
//! `ServiceConfig::default()`: fifteen lanes, the 4-byte reference prefix,
//! at most 64 busy resubmissions, and no wait timeout.
//!
//! ```toml
//! lane_count = 15
//! wait_timeout_ms = 250
//!
//! [layout]
//! reference_prefix_len = 4
//! tag_offset = 4
//!
//! [retry]
//! max_busy_retries = 64
//! busy_backoff_ms = 0
//! ```

use crate::security::layout::WireLayout;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default number of lanes.
pub const DEFAULT_LANE_COUNT: usize = 15;

/// Upper bound on lanes; lane ids are `u8`.
pub const MAX_LANE_COUNT: usize = 256;

/// Default cap on consecutive busy resubmissions of one job.
pub const DEFAULT_MAX_BUSY_RETRIES: u32 = 64;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `lane_count` was zero.
    #[error("lane_count must be at least 1")]
    NoLanes,
    /// `lane_count` exceeds what a `u8` lane id can address.
    #[error("lane_count {0} exceeds maximum of {MAX_LANE_COUNT}")]
    TooManyLanes(usize),
    /// The tag region would not fit in a minimum-length request.
    #[error("tag offset {tag_offset} places the tag outside a {min_length}-byte request")]
    TagOutsideFrame {
        /// Configured tag offset.
        tag_offset: usize,
        /// Minimum request length of the layout.
        min_length: usize,
    },
    /// The minimum request length does not fit the `u16` length field.
    #[error("reference prefix of {0} bytes does not fit a u16 length")]
    PrefixTooLong(usize),
    /// A zero wait timeout would interrupt every call.
    #[error("wait_timeout_ms must be non-zero when set")]
    ZeroTimeout,
    /// The builder was finished without a key.
    #[error("an authentication key is required")]
    MissingKey,
    /// The configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// How busy engine completions are resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum busy resubmissions per job; `None` retries without bound.
    pub max_busy_retries: Option<u32>,
    /// Pause before each resubmission, in milliseconds.
    pub busy_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_busy_retries: Some(DEFAULT_MAX_BUSY_RETRIES),
            busy_backoff_ms: 0,
        }
    }
}

impl RetryPolicy {
    /// Retries forever with no backoff.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_busy_retries: None,
            busy_backoff_ms: 0,
        }
    }

    /// Caps resubmissions at `max`.
    #[must_use]
    pub const fn bounded(max: u32) -> Self {
        Self {
            max_busy_retries: Some(max),
            busy_backoff_ms: 0,
        }
    }

    /// Sets the backoff between resubmissions.
    #[must_use]
    pub const fn with_backoff_ms(mut self, ms: u64) -> Self {
        self.busy_backoff_ms = ms;
        self
    }

    /// Returns `true` if a job already resubmitted `attempts` times may be
    /// resubmitted again.
    #[must_use]
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_busy_retries.is_none_or(|max| attempts < max)
    }

    /// The backoff as a [`Duration`].
    #[must_use]
    pub const fn busy_backoff(&self) -> Duration {
        Duration::from_millis(self.busy_backoff_ms)
    }
}

/// Configuration of a [`MacService`](crate::service::MacService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Number of independent lanes.
    pub lane_count: usize,
    /// Placement of the reference prefix and tag.
    pub layout: WireLayout,
    /// Busy resubmission policy.
    pub retry: RetryPolicy,
    /// Optional bound on the wait for engine completion, in milliseconds.
    pub wait_timeout_ms: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lane_count: DEFAULT_LANE_COUNT,
            layout: WireLayout::DEFAULT,
            retry: RetryPolicy::default(),
            wait_timeout_ms: None,
        }
    }
}

impl ServiceConfig {
    /// Returns the wait timeout, if any.
    #[must_use]
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Checks the configuration for values the service cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }
        if self.lane_count > MAX_LANE_COUNT {
            return Err(ConfigError::TooManyLanes(self.lane_count));
        }
        if self.wait_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        self.layout.validate()
    }

    /// Parses and validates a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
