//! Counters for engine resources and service outcomes.

pub mod resource_accounting;

pub use resource_accounting::{AccountingSnapshot, ResourceAccounting};
