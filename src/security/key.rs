//! The shared authentication key.
//!
//! One [`AuthKey`] is installed per service at construction time and handed to
//! the engine whenever a lane opens its session. The core never rotates it.
//!
//! # Security Note
//!
//! [`AuthKey::from_seed`] uses [`DetRng`] and is NOT cryptographically secure.
//! Production keys must come from [`AuthKey::new`] or [`AuthKey::from_slice`].
//!
//! Neither `Debug` nor `Display` prints any key byte.

use crate::security::error::KeyLengthError;
use crate::util::DetRng;
use core::fmt;

/// Size of the authentication key in bytes (256 bits).
pub const AUTH_KEY_SIZE: usize = 32;

/// Key material for the lane sessions.
///
/// # Example
///
/// ```
/// use lanemac::security::AuthKey;
///
/// let key1 = AuthKey::from_seed(42);
/// let key2 = AuthKey::from_seed(42);
/// assert_eq!(key1, key2);
/// assert_ne!(key1, AuthKey::from_seed(43));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AuthKey {
    bytes: [u8; AUTH_KEY_SIZE],
}

impl AuthKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; AUTH_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a key from a slice, which must be exactly [`AUTH_KEY_SIZE`] bytes.
    ///
    /// ```
    /// use lanemac::security::AuthKey;
    ///
    /// assert!(AuthKey::from_slice(&[7u8; 32]).is_ok());
    /// assert!(AuthKey::from_slice(&[7u8; 16]).is_err());
    /// ```
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyLengthError> {
        let bytes: [u8; AUTH_KEY_SIZE] = bytes.try_into().map_err(|_| KeyLengthError {
            expected: AUTH_KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    /// Creates a key deterministically from a 64-bit seed.
    ///
    /// For tests only. The same seed always produces the same key.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = DetRng::new(seed);
        Self::from_rng(&mut rng)
    }

    /// Creates a key from an existing [`DetRng`] stream.
    ///
    /// ```
    /// use lanemac::security::AuthKey;
    /// use lanemac::util::DetRng;
    ///
    /// let mut rng = DetRng::new(42);
    /// let key1 = AuthKey::from_rng(&mut rng);
    /// let key2 = AuthKey::from_rng(&mut rng);
    /// assert_ne!(key1, key2);
    /// ```
    #[must_use]
    pub fn from_rng(rng: &mut DetRng) -> Self {
        let mut bytes = [0u8; AUTH_KEY_SIZE];
        for chunk in bytes.chunks_exact_mut(8) {
            chunk.copy_from_slice(&rng.next_u64().to_le_bytes());
        }
        Self { bytes }
    }

    /// Returns the key material.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; AUTH_KEY_SIZE] {
        &self.bytes
    }

    /// Returns the key length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        AUTH_KEY_SIZE
    }

    /// Always `false`; keys have a fixed non-zero length.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthKey(..)")
    }
}

impl fmt::Display for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthKey(..)")
    }
}

impl Drop for AuthKey {
    fn drop(&mut self) {
        // Best-effort wipe; the compiler may elide it.
        for byte in &mut self.bytes {
            *byte = 0;
        }
    }
}
