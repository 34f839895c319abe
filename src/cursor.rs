// SPDX-License-Identifier: MIT
//! Bounded cursor for reading tag payloads
//!
//! A [`ByteCursor`] walks a [`ByteRange`] front to back. Fixed-size reads
//! consume exactly the requested number of bytes and fail with
//! [`DecodeError::TruncatedInput`] when fewer remain; nothing is consumed
//! on failure. All multi-byte integers are little-endian, as everywhere in
//! the SWF format.

use crate::range::ByteRange;

/// Errors produced while decoding tag data.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated input: needed {needed} more bytes, {remaining} remain")]
    TruncatedInput { needed: usize, remaining: usize },
}

/// Position-tracking reader over an immutable byte range.
#[derive(Debug)]
pub struct ByteCursor {
    range: ByteRange,
    pos: usize,
}

impl ByteCursor {
    /// Create a cursor at the start of a range.
    pub fn new(range: ByteRange) -> Self {
        Self { range, pos: 0 }
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.range.len() - self.pos
    }

    /// Current read position from the start of the range.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&[u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::TruncatedInput {
                needed: n,
                remaining: self.remaining(),
            });
        }

        let bytes = &self.range.bytes()[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Read exactly `n` bytes as a zero-copy sub-range.
    pub fn read_bytes(&mut self, n: usize) -> Result<ByteRange, DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::TruncatedInput {
                needed: n,
                remaining: self.remaining(),
            });
        }

        // Bounds just checked, slice cannot fail
        let range = self.range.slice(self.pos, n).unwrap();
        self.pos += n;
        Ok(range)
    }

    /// Consume all remaining bytes as a zero-copy sub-range.
    pub fn read_rest(&mut self) -> ByteRange {
        let rest = self.range.slice(self.pos, self.remaining()).unwrap();
        self.pos = self.range.len();
        rest
    }
}
