// SPDX-License-Identifier: MIT
//! SWF tag stream format constants and record header codec
//!
//! The body of an SWF document is a sequence of typed, length-delimited
//! records. Every record starts with a little-endian `u16` packing the tag
//! type into the upper 10 bits and the payload length into the lower 6:
//!
//! ```text
//! Record header (little-endian):
//! - Packed: (type << 6) | length      (2 bytes)
//! - Long length: u32                  (4 bytes, only when length == 0x3F)
//!
//! Record payload (length bytes):
//! - DefineBits:  character id (u16) ++ JPEG entropy-coded data
//! - JPEGTables:  shared JPEG table bitstream, no framing
//! ```
//!
//! A 6-bit length of `0x3F` is a sentinel: the real payload length follows
//! as a `u32`. Writers may use the long form for any length; some tags
//! (DefineBits among them) are always written long regardless of payload
//! size, so the header codec round-trips the form it was read with.

use crate::cursor::{ByteCursor, DecodeError};
use crate::writer::TagWriter;

/// Tag type of the image record whose payload is a headerless JPEG stream.
pub const DEFINE_BITS: u16 = 6;

/// Tag type of the document's shared JPEG tables record.
pub const JPEG_TABLES: u16 = 8;

/// Largest tag type representable in a record header (10 bits).
pub const MAX_TAG_KIND: u16 = 0x3FF;

/// 6-bit length value signalling that a `u32` long length follows.
pub const LONG_FORM_MARKER: usize = 0x3F;

/// Leading 4-byte marker some encoders prepend to a JPEG stream: an
/// EOI/SOI pair that standard decoders reject. Stripped before decoding.
pub const ERROR_HEADER: [u8; 4] = [0xFF, 0xD9, 0xFF, 0xD8];

/// Trailing end-of-image marker terminating the shared table bitstream.
/// Dropped when splicing tables ahead of image data so it never appears
/// mid-stream.
pub const TABLES_END_MARKER: [u8; 2] = [0xFF, 0xD9];

/// Human-readable name for a tag type, for diagnostics and tooling.
pub fn tag_name(kind: u16) -> &'static str {
    match kind {
        DEFINE_BITS => "DefineBits",
        JPEG_TABLES => "JPEGTables",
        _ => "Unknown",
    }
}

/// A decoded record header: tag type, payload length, and whether the
/// header was (or must be) written in the long form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind: u16,
    pub length: usize,
    pub long_form: bool,
}

impl RecordHeader {
    /// Read a record header from the cursor.
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, DecodeError> {
        let packed = cursor.read_u16()?;
        let kind = packed >> 6;
        let short_length = (packed & 0x3F) as usize;

        if short_length == LONG_FORM_MARKER {
            let length = cursor.read_u32()? as usize;
            Ok(Self {
                kind,
                length,
                long_form: true,
            })
        } else {
            Ok(Self {
                kind,
                length: short_length,
                long_form: false,
            })
        }
    }

    /// Write this header.
    ///
    /// The short form is used when the length fits and the header does not
    /// demand the long form; a length of `0x3F` or more always forces the
    /// long form because the short encoding cannot represent it.
    pub fn write(&self, writer: &mut TagWriter) {
        debug_assert!(self.kind <= MAX_TAG_KIND, "tag type exceeds 10 bits");
        debug_assert!(self.length <= u32::MAX as usize, "payload exceeds u32 length");

        if self.long_form || self.length >= LONG_FORM_MARKER {
            writer.write_u16((self.kind << 6) | LONG_FORM_MARKER as u16);
            writer.write_u32(self.length as u32);
        } else {
            writer.write_u16((self.kind << 6) | self.length as u16);
        }
    }

    /// Encoded size of this header in bytes.
    pub fn encoded_len(&self) -> usize {
        if self.long_form || self.length >= LONG_FORM_MARKER {
            6
        } else {
            2
        }
    }
}

/// Pixel formats an image tag can report, used by export tooling to pick a
/// file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    /// File extension conventionally used for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
        }
    }
}
