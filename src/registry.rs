// SPDX-License-Identifier: MIT
//! Open registry mapping tag types to decode constructors
//!
//! Dispatch is by numeric tag type. The registry ships with the record
//! kinds this crate models; anything else falls through to the opaque
//! variant at demux time, which keeps full round-trip capability without
//! modeling every tag of the format. Callers can register additional
//! decoders for tag types they care about.

use crate::config::CodecConfig;
use crate::cursor::{ByteCursor, DecodeError};
use crate::deps::DependencyIndex;
use crate::format::{DEFINE_BITS, JPEG_TABLES};
use crate::tags::{DefineBitsTag, JpegTablesTag, Tag};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared state handed to every decode constructor: the document's
/// dependency index and its codec configuration.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    pub deps: Arc<DependencyIndex>,
    pub config: CodecConfig,
}

impl DecodeContext {
    /// Create a fresh context with an empty dependency index.
    pub fn new(config: CodecConfig) -> Self {
        Self {
            deps: Arc::new(DependencyIndex::new()),
            config,
        }
    }
}

/// A decode constructor: consumes the payload cursor, produces a record.
pub type DecodeFn = fn(&mut ByteCursor, &DecodeContext) -> Result<Tag, DecodeError>;

/// Maps numeric tag types to decode constructors.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    decoders: HashMap<u16, DecodeFn>,
}

impl TagRegistry {
    /// Create a registry with the built-in record kinds registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFINE_BITS, decode_define_bits);
        registry.register(JPEG_TABLES, decode_jpeg_tables);
        registry
    }

    /// Create a registry with no decoders: every record demuxes opaque.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register a decode constructor for a tag type, replacing any
    /// previous registration.
    pub fn register(&mut self, kind: u16, decoder: DecodeFn) {
        self.decoders.insert(kind, decoder);
    }

    /// Look up the decode constructor for a tag type.
    pub fn get(&self, kind: u16) -> Option<DecodeFn> {
        self.decoders.get(&kind).copied()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_define_bits(cursor: &mut ByteCursor, ctx: &DecodeContext) -> Result<Tag, DecodeError> {
    Ok(Tag::DefineBits(DefineBitsTag::decode(cursor, ctx)?))
}

fn decode_jpeg_tables(cursor: &mut ByteCursor, ctx: &DecodeContext) -> Result<Tag, DecodeError> {
    Ok(Tag::JpegTables(JpegTablesTag::decode(cursor, ctx)?))
}
