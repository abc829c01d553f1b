//! Wire layout of a request buffer.
//!
//! ```text
//! 0                    prefix                              length
//! ├── reference prefix ──┼──────────── payload region ────────────┤
//!                        ├── tag (TAG_LENGTH) ──┤
//!                        ^ tag_offset (default = prefix)
//! ```
//!
//! The MAC covers the payload region. Tag bytes that fall inside the payload
//! region are replaced with zeros in the engine's copy, so a tag never
//! authenticates itself and a freshly written tag verifies unchanged.

use crate::config::ConfigError;
use crate::security::error::{MacError, MacResult};
use crate::security::tag::TAG_LENGTH;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Default length of the reference prefix, which the MAC does not cover.
pub const REFERENCE_PREFIX_LENGTH: usize = 4;

/// Default offset of the tag region within the buffer.
pub const TAG_OFFSET: usize = REFERENCE_PREFIX_LENGTH;

/// Placement of the reference prefix and tag region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireLayout {
    /// Bytes before the payload region.
    pub reference_prefix_len: usize,
    /// Offset of the [`TAG_LENGTH`]-byte tag region.
    pub tag_offset: usize,
}

impl Default for WireLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl WireLayout {
    /// The default layout: 4-byte prefix, tag immediately after it.
    pub const DEFAULT: Self = Self {
        reference_prefix_len: REFERENCE_PREFIX_LENGTH,
        tag_offset: TAG_OFFSET,
    };

    /// Creates a layout.
    #[must_use]
    pub const fn new(reference_prefix_len: usize, tag_offset: usize) -> Self {
        Self {
            reference_prefix_len,
            tag_offset,
        }
    }

    /// Smallest accepted total length.
    #[must_use]
    pub const fn min_length(&self) -> usize {
        self.reference_prefix_len + TAG_LENGTH
    }

    /// Checks that the tag region fits inside every accepted request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tag_offset > self.reference_prefix_len {
            return Err(ConfigError::TagOutsideFrame {
                tag_offset: self.tag_offset,
                min_length: self.min_length(),
            });
        }
        if self.min_length() > usize::from(u16::MAX) {
            return Err(ConfigError::PrefixTooLong(self.reference_prefix_len));
        }
        Ok(())
    }

    /// Splits a request of `total_length` bytes held in a buffer of
    /// `buffer_len` bytes into its tag and payload regions.
    ///
    /// Fails with `MalformedRequest` instead of underflowing when the request is
    /// shorter than `prefix + TAG_LENGTH` or longer than the buffer.
    ///
    /// ```
    /// use lanemac::security::WireLayout;
    ///
    /// let regions = WireLayout::DEFAULT.split(25, 25).unwrap();
    /// assert_eq!(regions.tag_range(), 4..20);
    /// assert_eq!(regions.payload_range(), 4..25);
    /// assert_eq!(regions.payload_len(), 21);
    /// assert!(WireLayout::DEFAULT.split(25, 19).is_err());
    /// ```
    pub fn split(&self, buffer_len: usize, total_length: usize) -> MacResult<Regions> {
        if total_length < self.min_length() {
            return Err(MacError::malformed().with_context(format!(
                "length {total_length} below minimum {}",
                self.min_length()
            )));
        }
        if buffer_len < total_length {
            return Err(MacError::malformed().with_context(format!(
                "buffer of {buffer_len} bytes shorter than length {total_length}"
            )));
        }
        Ok(Regions {
            tag: self.tag_offset..self.tag_offset + TAG_LENGTH,
            payload: self.reference_prefix_len..total_length,
        })
    }
}

/// Tag and payload regions of one request; indices into the caller's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regions {
    tag: Range<usize>,
    payload: Range<usize>,
}

impl Regions {
    /// Byte range of the tag region.
    #[must_use]
    pub fn tag_range(&self) -> Range<usize> {
        self.tag.clone()
    }

    /// Byte range of the payload region.
    #[must_use]
    pub fn payload_range(&self) -> Range<usize> {
        self.payload.clone()
    }

    /// Number of bytes the MAC covers.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// The tag region of `buffer`.
    #[must_use]
    pub fn tag<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.tag.clone()]
    }

    /// The tag region of `buffer`, mutably.
    pub fn tag_mut<'a>(&self, buffer: &'a mut [u8]) -> &'a mut [u8] {
        &mut buffer[self.tag.clone()]
    }

    /// The payload region of `buffer`, as it appears on the wire.
    #[must_use]
    pub fn payload<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.payload.clone()]
    }

    /// Copies the payload into `dst`, zeroing any bytes of the tag region it
    /// contains. `dst` is cleared first.
    pub fn copy_payload_masked(&self, buffer: &[u8], dst: &mut Vec<u8>) {
        dst.clear();
        dst.extend_from_slice(self.payload(buffer));

        let start = self.tag.start.max(self.payload.start);
        let end = self.tag.end.min(self.payload.end);
        if start < end {
            let base = self.payload.start;
            dst[start - base..end - base].fill(0);
        }
    }
}
