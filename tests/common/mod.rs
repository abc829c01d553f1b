//! Shared helpers for integration tests.

#![allow(dead_code)]

use lanemac::engine::{SoftEngine, SoftEngineConfig};
use lanemac::security::AuthKey;
use lanemac::service::MacService;
use lanemac::{RetryPolicy, ServiceConfig};
use std::sync::{Arc, Once};

static INIT_LOGGING: Once = Once::new();

/// Installs a test subscriber once per binary. Honors `RUST_LOG`.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lanemac=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Marks the start of a test.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = $name, "=== phase: {} ===", $name);
    };
}

/// Marks successful completion of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = $name, "=== complete: {} ===", $name);
    };
}

/// Asserts `cond`, logging the expected and actual values first.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {{
        let cond = $cond;
        tracing::debug!(
            passed = cond,
            expected = ?$expected,
            actual = ?$actual,
            "{}",
            $msg
        );
        assert!(cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    }};
}

/// Seed of the key every helper service uses.
pub const TEST_KEY_SEED: u64 = 0x5eed;

pub fn engine() -> Arc<SoftEngine> {
    SoftEngine::with_defaults().expect("spawn soft engine")
}

pub fn engine_with(job_capacity: usize) -> Arc<SoftEngine> {
    SoftEngine::new(SoftEngineConfig {
        job_capacity,
        ..SoftEngineConfig::default()
    })
    .expect("spawn soft engine")
}

pub fn service_on(engine: &Arc<SoftEngine>) -> MacService {
    MacService::new(engine.clone(), AuthKey::from_seed(TEST_KEY_SEED))
}

pub fn service_with(engine: &Arc<SoftEngine>, config: ServiceConfig) -> MacService {
    MacService::builder(engine.clone())
        .key(AuthKey::from_seed(TEST_KEY_SEED))
        .config(config)
        .build()
        .expect("valid config")
}

pub fn retrying(max: u32) -> ServiceConfig {
    ServiceConfig {
        retry: RetryPolicy::bounded(max),
        ..ServiceConfig::default()
    }
}

/// A `total`-byte request with a zeroed prefix and `payload` at the tail.
pub fn request(total: usize, payload: &[u8]) -> Vec<u8> {
    let mut buffer = vec![0u8; total];
    buffer[total - payload.len()..].copy_from_slice(payload);
    buffer
}
