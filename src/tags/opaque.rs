// SPDX-License-Identifier: MIT
//! Opaque record variant
//!
//! Records whose structure this crate does not model, and records that
//! failed a tolerated decode, are carried as raw bytes so the document
//! still round-trips byte-exactly. The header form observed at decode
//! time is preserved: a short-length record that arrived with a long
//! header is re-emitted with a long header.

use crate::format::RecordHeader;
use crate::range::ByteRange;
use crate::writer::TagWriter;

/// A record carried as uninterpreted payload bytes.
#[derive(Debug, Clone)]
pub struct OpaqueTag {
    kind: u16,
    data: ByteRange,
    long_form: bool,
}

impl OpaqueTag {
    /// Create an opaque record from a payload range.
    pub fn new(kind: u16, data: ByteRange, long_form: bool) -> Self {
        Self {
            kind,
            data,
            long_form,
        }
    }

    /// Tag type this record was read with.
    pub fn kind(&self) -> u16 {
        self.kind
    }

    /// Raw payload bytes.
    pub fn data(&self) -> &ByteRange {
        &self.data
    }

    /// Whether the record was read with a long-form header.
    pub fn long_form(&self) -> bool {
        self.long_form
    }

    /// Re-emit the record unchanged.
    pub fn encode_into(&self, writer: &mut TagWriter) {
        let header = RecordHeader {
            kind: self.kind,
            length: self.data.len(),
            long_form: self.long_form,
        };
        header.write(writer);
        writer.write_bytes(self.data.bytes());
    }
}
