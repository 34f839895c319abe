// SPDX-License-Identifier: MIT
//! Decoded document: the ordered record sequence and its shared state
//!
//! A [`Document`] owns its records exclusively; file order is semantic
//! order. It also owns the [`DependencyIndex`] that image records resolve
//! their shared tables through, and the codec configuration the records
//! were decoded under.

use crate::config::CodecConfig;
use crate::demux::{DemuxError, Diagnostic, TagDemux};
use crate::deps::{DependencyIndex, SharedTableState};
use crate::format::JPEG_TABLES;
use crate::range::ByteRange;
use crate::registry::DecodeContext;
use crate::tags::Tag;
use crate::writer::TagWriter;
use std::sync::Arc;

/// A decoded tag stream document.
#[derive(Debug)]
pub struct Document {
    tags: Vec<Tag>,
    deps: Arc<DependencyIndex>,
    config: CodecConfig,
    diagnostics: Vec<Diagnostic>,
    next_character_id: u16,
}

impl Document {
    /// Decode a document body with the built-in registry.
    pub fn decode(body: impl Into<ByteRange>, config: CodecConfig) -> Result<Self, DemuxError> {
        Self::decode_with(&TagDemux::new(), body, config)
    }

    /// Decode a document body with a caller-provided demux.
    pub fn decode_with(
        demux: &TagDemux,
        body: impl Into<ByteRange>,
        config: CodecConfig,
    ) -> Result<Self, DemuxError> {
        let ctx = DecodeContext::new(config);
        let output = demux.demux(&body.into(), &ctx)?;

        let next_character_id = output
            .tags
            .iter()
            .filter_map(|tag| tag.as_define_bits().map(|bits| bits.character_id()))
            .max()
            .map_or(1, |max| max.wrapping_add(1));

        Ok(Self {
            tags: output.tags,
            deps: ctx.deps,
            config,
            diagnostics: output.diagnostics,
            next_character_id,
        })
    }

    /// Create an empty document, for building a tag stream from scratch.
    pub fn empty(config: CodecConfig) -> Self {
        Self {
            tags: Vec::new(),
            deps: Arc::new(DependencyIndex::new()),
            config,
            diagnostics: Vec::new(),
            next_character_id: 1,
        }
    }

    /// Records in file order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Mutable access to the records.
    pub fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }

    /// Anomalies tolerated while decoding this document.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Configuration this document was decoded under.
    pub fn config(&self) -> CodecConfig {
        self.config
    }

    /// The document's dependency index.
    pub fn dependency_index(&self) -> &Arc<DependencyIndex> {
        &self.deps
    }

    /// A decode context for constructing new records inside this document.
    pub fn decode_context(&self) -> DecodeContext {
        DecodeContext {
            deps: Arc::clone(&self.deps),
            config: self.config,
        }
    }

    /// Resolve the document's authoritative shared JPEG tables, if any.
    pub fn jpeg_tables(&self) -> Option<Arc<SharedTableState>> {
        self.deps.lookup(JPEG_TABLES)
    }

    /// Allocate a fresh document-unique character id.
    pub fn next_character_id(&mut self) -> u16 {
        let id = self.next_character_id;
        self.next_character_id = self.next_character_id.wrapping_add(1);
        id
    }

    /// Serialize every record back into one body buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = TagWriter::new();
        for tag in &self.tags {
            tag.encode_into(&mut writer);
        }
        writer.into_bytes()
    }
}
