//! Authentication tags.
//!
//! Tags are the first [`TAG_LENGTH`] bytes of the engine's HMAC-SHA256 output.

use std::fmt;

/// Size of an authentication tag in bytes.
pub const TAG_LENGTH: usize = 16;

/// A fixed-length MAC over one payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacTag {
    bytes: [u8; TAG_LENGTH],
}

impl MacTag {
    /// Returns a zeroed tag, the initial value of every lane's tag cache.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            bytes: [0u8; TAG_LENGTH],
        }
    }

    /// Creates a tag from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; TAG_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Creates a tag from the leading [`TAG_LENGTH`] bytes of `src`.
    ///
    /// Returns `None` if `src` is shorter than a tag.
    #[must_use]
    pub fn from_prefix(src: &[u8]) -> Option<Self> {
        let bytes = src.get(..TAG_LENGTH)?.try_into().ok()?;
        Some(Self { bytes })
    }

    /// Returns the raw bytes of the tag.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TAG_LENGTH] {
        &self.bytes
    }

    /// Compares against a wire tag in constant time.
    ///
    /// Every byte is inspected regardless of where the first difference sits;
    /// a slice of the wrong length never matches.
    ///
    /// ```
    /// use lanemac::security::{MacTag, TAG_LENGTH};
    ///
    /// let tag = MacTag::from_bytes([7u8; TAG_LENGTH]);
    /// assert!(tag.ct_eq(&[7u8; TAG_LENGTH]));
    /// assert!(!tag.ct_eq(&[7u8; TAG_LENGTH - 1]));
    /// ```
    #[must_use]
    pub fn ct_eq(&self, wire: &[u8]) -> bool {
        if wire.len() != TAG_LENGTH {
            return false;
        }
        let mut diff = 0u8;
        for (a, b) in self.bytes.iter().zip(wire) {
            diff |= a ^ b;
        }
        std::hint::black_box(diff) == 0
    }
}

impl fmt::Debug for MacTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:02x}{:02x}...)", self.bytes[0], self.bytes[1])
    }
}

impl fmt::Display for MacTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bytes {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}
