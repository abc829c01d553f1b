//! Authentication primitives: key material, tags, wire layout, and errors.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                      MacService                       │
//! │  AuthKey ──▶ one engine session per lane              │
//! │  WireLayout::split ──▶ Regions { tag, payload }       │
//! │  engine job ──▶ MacTag                                │
//! │      WRITE: tag copied into the tag region            │
//! │      READ:  MacTag::ct_eq against the tag region      │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! 1. **No ambient keys**: the key is injected at construction, never compiled in
//! 2. **Fail closed**: any mismatch, including in the first tag byte, rejects
//! 3. **Fixed-time comparison**: the verify path inspects every tag byte

pub mod error;
pub mod key;
pub mod layout;
pub mod tag;

pub use error::{KeyLengthError, MacError, MacErrorKind, MacResult};
pub use key::{AUTH_KEY_SIZE, AuthKey};
pub use layout::{REFERENCE_PREFIX_LENGTH, Regions, TAG_OFFSET, WireLayout};
pub use tag::{MacTag, TAG_LENGTH};
