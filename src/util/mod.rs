//! Internal utilities.
//!
//! These utilities are intentionally minimal and dependency-free so tests can
//! derive keys and fault schedules deterministically.

pub mod det_rng;

pub use det_rng::DetRng;
