// SPDX-License-Identifier: MIT
//! Record variants
//!
//! A decoded document is a sequence of [`Tag`] values: the record kinds
//! this crate models plus an opaque fallback that preserves unknown or
//! tolerated-failing records byte for byte. Decoding happens exactly once,
//! at construction; encoding is deterministic and repeatable.

mod define_bits;
mod jpeg_tables;
mod opaque;

pub use define_bits::DefineBitsTag;
pub use jpeg_tables::JpegTablesTag;
pub use opaque::OpaqueTag;

use crate::format::{tag_name, DEFINE_BITS, JPEG_TABLES};
use crate::writer::TagWriter;

/// Errors raised by operations on individual records.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

/// One record of the tag stream.
#[derive(Debug)]
pub enum Tag {
    DefineBits(DefineBitsTag),
    JpegTables(JpegTablesTag),
    Opaque(OpaqueTag),
}

impl Tag {
    /// Numeric tag type of this record.
    pub fn kind(&self) -> u16 {
        match self {
            Tag::DefineBits(_) => DEFINE_BITS,
            Tag::JpegTables(_) => JPEG_TABLES,
            Tag::Opaque(tag) => tag.kind(),
        }
    }

    /// Human-readable name of this record's tag type.
    pub fn name(&self) -> &'static str {
        tag_name(self.kind())
    }

    /// Serialize this record, header included, into the writer.
    pub fn encode_into(&self, writer: &mut TagWriter) {
        match self {
            Tag::DefineBits(tag) => tag.encode_into(writer),
            Tag::JpegTables(tag) => tag.encode_into(writer),
            Tag::Opaque(tag) => tag.encode_into(writer),
        }
    }

    /// Serialize this record into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = TagWriter::new();
        self.encode_into(&mut writer);
        writer.into_bytes()
    }

    /// Borrow the DefineBits variant, if that is what this record is.
    pub fn as_define_bits(&self) -> Option<&DefineBitsTag> {
        match self {
            Tag::DefineBits(tag) => Some(tag),
            _ => None,
        }
    }

    /// Borrow the JPEGTables variant, if that is what this record is.
    pub fn as_jpeg_tables(&self) -> Option<&JpegTablesTag> {
        match self {
            Tag::JpegTables(tag) => Some(tag),
            _ => None,
        }
    }
}
