// SPDX-License-Identifier: MIT
//! Shared, immutable byte ranges over tag stream buffers
//!
//! Decoded tags keep views into the original document buffer instead of
//! copying their payloads. A [`ByteRange`] is a `(buffer, start, length)`
//! triple over a shared, immutable allocation, so slicing a payload out of
//! a multi-megabyte document costs two machine words and a refcount bump.

use std::sync::Arc;

/// An immutable view into a shared byte buffer.
///
/// The invariant `start + length <= buffer.len()` is established at
/// construction and can never be broken afterwards, so accessors do not
/// re-check bounds.
#[derive(Debug, Clone)]
pub struct ByteRange {
    data: Arc<[u8]>,
    start: usize,
    length: usize,
}

impl ByteRange {
    /// Create a range covering an entire owned buffer.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let data: Arc<[u8]> = data.into();
        let length = data.len();
        Self {
            data,
            start: 0,
            length,
        }
    }

    /// Create an empty range.
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create a sub-range of this range.
    ///
    /// Returns `None` when `start + length` would exceed this range.
    pub fn slice(&self, start: usize, length: usize) -> Option<Self> {
        let end = start.checked_add(length)?;
        if end > self.length {
            return None;
        }

        Some(Self {
            data: Arc::clone(&self.data),
            start: self.start + start,
            length,
        })
    }

    /// View the range contents.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data[self.start..self.start + self.length]
    }

    /// Length of the range in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the range is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Copy the range contents into an owned buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }
}

impl PartialEq for ByteRange {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for ByteRange {}

impl From<Vec<u8>> for ByteRange {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[u8]> for ByteRange {
    fn from(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }
}
