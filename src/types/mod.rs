//! Core types shared across the service.
//!
//! - [`id`]: Identifier types (`LaneId`, `SessionHandle`, `JobId`)
//! - [`cancel`]: Interruption reason and kind types

pub mod cancel;
pub mod id;

pub use cancel::{CancelKind, CancelReason};
pub use id::{JobId, LaneId, SessionHandle};
