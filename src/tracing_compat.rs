//! Optional tracing integration.
//!
//! With the `tracing-integration` feature the usual `tracing` macros are
//! re-exported. Without it they expand to nothing, so call sites never need
//! their own `cfg` guards.

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __lanemac_log_noop {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(feature = "tracing-integration"))]
pub use crate::__lanemac_log_noop as debug;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__lanemac_log_noop as error;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__lanemac_log_noop as info;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__lanemac_log_noop as trace;
#[cfg(not(feature = "tracing-integration"))]
pub use crate::__lanemac_log_noop as warn;
