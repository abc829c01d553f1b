//! Lanemac: per-lane keyed-MAC service over an asynchronous crypto engine.
//!
//! # Overview
//!
//! A packet path split across several lanes (one per processing core) needs
//! to stamp outgoing packets with a keyed MAC and check the MAC on incoming
//! ones. The MAC itself is computed by an asynchronous crypto engine that
//! accepts jobs and reports completion through a callback. Lanemac sits in
//! between and turns each request into one blocking call.
//!
//! # Core Guarantees
//!
//! - **One session per lane**: opened lazily, reused forever, retried after a failure
//! - **No underflow**: short or oversized requests are rejected before any engine activity
//! - **Invisible busy retry**: transient engine busy completions are resubmitted within a bound
//! - **No leaked jobs**: every acquired job is released, including after an interrupt
//! - **Fixed-time verify**: the whole tag is compared without early exit
//!
//! # Module Structure
//!
//! - [`service`]: The [`MacService`] entry points, lane table, and status codes
//! - [`engine`]: The [`CryptoEngine`] seam, job descriptors, and the software engine
//! - [`security`]: Keys, tags, wire layout, and the error taxonomy
//! - [`sync`]: Blocking completion signal and host interrupt handle
//! - [`config`]: Service configuration and TOML loading
//! - [`observability`]: Engine resource accounting
//! - [`types`]: Identifiers and interruption reasons
//! - [`util`]: Deterministic RNG for test keys
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use lanemac::{AuthKey, Command, MacService, SoftEngine, SyscallStatus};
//!
//! let engine = SoftEngine::with_defaults().unwrap();
//! let service = MacService::new(engine, AuthKey::from_seed(42));
//!
//! let mut packet = vec![0u8; 64];
//! let mut length = 64u16;
//! assert_eq!(
//!     service.authenticate(1, Command::Write, &mut length, &mut packet),
//!     SyscallStatus::Success
//! );
//! assert!(service.verify(1, &packet, 64).is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod engine;
pub mod observability;
pub mod security;
pub mod service;
pub mod sync;
pub mod tracing_compat;
pub mod types;
pub mod util;

// Re-exports for convenient access to core types
pub use config::{ConfigError, RetryPolicy, ServiceConfig};
pub use engine::{CryptoEngine, EngineError, Job, JobOutcome, MacAlgorithm, SoftEngine, SoftEngineConfig};
pub use observability::ResourceAccounting;
pub use security::{AuthKey, MacError, MacErrorKind, MacResult, MacTag, TAG_LENGTH, WireLayout};
pub use service::{Command, MacService, MacServiceBuilder, SyscallStatus};
pub use sync::Interrupt;
pub use types::{CancelKind, CancelReason, LaneId, SessionHandle};
