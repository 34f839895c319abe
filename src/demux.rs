// SPDX-License-Identifier: MIT
//! Tag stream demultiplexer
//!
//! Splits a document body into (type, payload) frames and instantiates a
//! record for each. Unregistered tag types always come back opaque. What
//! happens when a registered record fails to decode is governed by
//! [`DemuxPolicy`](crate::config::DemuxPolicy): strict aborts the
//! document, lenient substitutes an opaque record carrying the raw
//! payload and keeps going. Either way the anomaly is logged and reported
//! as a [`Diagnostic`].
//!
//! Framing guarantees that the bytes consumed across produced records sum
//! to the input length: each iteration consumes exactly one header plus
//! the payload it promises, independently of what the record decoder does
//! with the payload.

use crate::config::DemuxPolicy;
use crate::cursor::{ByteCursor, DecodeError};
use crate::format::{tag_name, RecordHeader};
use crate::range::ByteRange;
use crate::registry::{DecodeContext, TagRegistry};
use crate::tags::{OpaqueTag, Tag};

/// Fatal demux errors, produced only under [`DemuxPolicy::Strict`] or for
/// input so damaged that no frame boundary exists to recover at.
#[derive(Debug, thiserror::Error)]
pub enum DemuxError {
    #[error("truncated record header at byte {offset}")]
    TruncatedHeader {
        offset: usize,
        #[source]
        source: DecodeError,
    },

    #[error(
        "record type {kind} at byte {offset} is truncated: payload promises {expected} bytes, {available} remain"
    )]
    TruncatedPayload {
        kind: u16,
        offset: usize,
        expected: usize,
        available: usize,
    },

    #[error("record type {kind} at byte {offset} failed to decode")]
    TagDecode {
        kind: u16,
        offset: usize,
        #[source]
        source: DecodeError,
    },
}

/// A recorded decode anomaly that lenient demux absorbed.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Byte offset of the offending record within the document body.
    pub offset: usize,
    /// Tag type of the offending record.
    pub kind: u16,
    /// What went wrong.
    pub message: String,
}

/// Everything a demux run produced: the record sequence in file order and
/// the anomalies tolerated along the way.
#[derive(Debug)]
pub struct DemuxOutput {
    pub tags: Vec<Tag>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Splits a document body into records.
#[derive(Debug, Clone, Default)]
pub struct TagDemux {
    registry: TagRegistry,
}

impl TagDemux {
    /// Create a demux over the built-in registry.
    pub fn new() -> Self {
        Self {
            registry: TagRegistry::new(),
        }
    }

    /// Create a demux over a caller-provided registry.
    pub fn with_registry(registry: TagRegistry) -> Self {
        Self { registry }
    }

    /// Demultiplex a document body into records.
    pub fn demux(&self, body: &ByteRange, ctx: &DecodeContext) -> Result<DemuxOutput, DemuxError> {
        let mut cursor = ByteCursor::new(body.clone());
        let mut tags = Vec::new();
        let mut diagnostics = Vec::new();

        while cursor.remaining() > 0 {
            let offset = cursor.position();

            let header = match RecordHeader::read(&mut cursor) {
                Ok(header) => header,
                Err(source) => {
                    // No frame boundary left to resynchronize at; lenient
                    // mode drops the trailing fragment with a diagnostic.
                    if ctx.config.policy == DemuxPolicy::Strict {
                        return Err(DemuxError::TruncatedHeader { offset, source });
                    }
                    tracing::warn!(offset, "dropping truncated record header at end of body");
                    diagnostics.push(Diagnostic {
                        offset,
                        kind: 0,
                        message: format!("truncated record header: {source}"),
                    });
                    break;
                }
            };

            let payload = match cursor.read_bytes(header.length) {
                Ok(payload) => payload,
                Err(_) => {
                    let available = cursor.remaining();
                    if ctx.config.policy == DemuxPolicy::Strict {
                        return Err(DemuxError::TruncatedPayload {
                            kind: header.kind,
                            offset,
                            expected: header.length,
                            available,
                        });
                    }
                    tracing::warn!(
                        kind = header.kind,
                        offset,
                        expected = header.length,
                        available,
                        "truncated record payload, keeping available bytes opaque"
                    );
                    diagnostics.push(Diagnostic {
                        offset,
                        kind: header.kind,
                        message: format!(
                            "truncated payload: promised {} bytes, {} remain",
                            header.length, available
                        ),
                    });
                    let rest = cursor.read_rest();
                    tags.push(Tag::Opaque(OpaqueTag::new(
                        header.kind,
                        rest,
                        header.long_form,
                    )));
                    continue;
                }
            };

            match self.registry.get(header.kind) {
                Some(decode) => {
                    let mut payload_cursor = ByteCursor::new(payload.clone());
                    match decode(&mut payload_cursor, ctx) {
                        Ok(tag) => tags.push(tag),
                        Err(source) => {
                            if ctx.config.policy == DemuxPolicy::Strict {
                                return Err(DemuxError::TagDecode {
                                    kind: header.kind,
                                    offset,
                                    source,
                                });
                            }
                            tracing::warn!(
                                kind = header.kind,
                                name = tag_name(header.kind),
                                offset,
                                error = %source,
                                "record failed to decode, keeping payload opaque"
                            );
                            diagnostics.push(Diagnostic {
                                offset,
                                kind: header.kind,
                                message: format!("decode failed: {source}"),
                            });
                            tags.push(Tag::Opaque(OpaqueTag::new(
                                header.kind,
                                payload,
                                header.long_form,
                            )));
                        }
                    }
                }
                None => {
                    tracing::debug!(
                        kind = header.kind,
                        offset,
                        "no decoder registered, keeping record opaque"
                    );
                    tags.push(Tag::Opaque(OpaqueTag::new(
                        header.kind,
                        payload,
                        header.long_form,
                    )));
                }
            }
        }

        debug_assert_eq!(cursor.remaining(), 0);
        Ok(DemuxOutput { tags, diagnostics })
    }
}
