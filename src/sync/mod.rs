//! Blocking primitives that turn an engine callback into a synchronous return.
//!
//! - [`CompletionSignal`]: one-shot slot the engine callback fills and the
//!   caller blocks on
//! - [`Interrupt`]: host-side handle that aborts a blocked wait

pub mod completion;
pub mod interrupt;

pub use completion::{CompletionSignal, Delivery, WaitOutcome};
pub use interrupt::Interrupt;
