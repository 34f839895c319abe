// SPDX-License-Identifier: MIT
//! JPEGTables record variant
//!
//! Holds the shared JPEG table bitstream that every DefineBits record in
//! the document decodes against. The record carries no image semantics of
//! its own. Its interior state is shared with the document's
//! [`DependencyIndex`](crate::deps::DependencyIndex) entry so image tags
//! can resolve the bytes without owning the record.

use crate::cursor::{ByteCursor, DecodeError};
use crate::deps::SharedTableState;
use crate::format::{RecordHeader, JPEG_TABLES};
use crate::registry::DecodeContext;
use crate::writer::TagWriter;
use std::sync::Arc;

/// The document's shared JPEG tables record.
///
/// The format assumes at most one per document. When several are present
/// the first one decoded becomes authoritative: it alone is registered in
/// the dependency index and resolved by image tags. Later instances still
/// decode and re-encode faithfully, they are just never looked up.
#[derive(Debug)]
pub struct JpegTablesTag {
    state: Arc<SharedTableState>,
    authoritative: bool,
}

impl JpegTablesTag {
    /// Create a tables record with the given payload and register it with
    /// the document's dependency index.
    pub fn new(payload: Vec<u8>, ctx: &DecodeContext) -> Self {
        let state = Arc::new(SharedTableState::new(payload));
        let (_, authoritative) = ctx.deps.insert_or_fetch(JPEG_TABLES, Arc::clone(&state));
        Self {
            state,
            authoritative,
        }
    }

    /// Decode from a payload cursor: the entire payload is table bytes.
    pub fn decode(cursor: &mut ByteCursor, ctx: &DecodeContext) -> Result<Self, DecodeError> {
        let payload = cursor.read_rest().to_vec();
        Ok(Self::new(payload, ctx))
    }

    /// Snapshot of the table bytes.
    pub fn payload(&self) -> Vec<u8> {
        self.state.payload()
    }

    /// Replace the table bytes.
    ///
    /// Every image tag currently subscribed to this record is notified
    /// before this call returns.
    pub fn set_payload(&self, payload: Vec<u8>) {
        self.state.set_payload(payload);
    }

    /// Whether this instance is the one resolved by image tags.
    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    /// Write the record: payload bytes unmodified behind a record header.
    pub fn encode_into(&self, writer: &mut TagWriter) {
        let payload = self.payload();
        let header = RecordHeader {
            kind: JPEG_TABLES,
            length: payload.len(),
            long_form: false,
        };
        header.write(writer);
        writer.write_bytes(&payload);
    }
}
