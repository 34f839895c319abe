// SPDX-License-Identifier: MIT
//! # SWF Tag Codec
//!
//! A streaming codec for the record ("tag") layer of the SWF container
//! format. The body of an SWF document is a sequence of typed,
//! length-delimited records; this crate demultiplexes that sequence into
//! typed records, re-encodes them byte-exactly, and resolves the
//! cross-record dependency between JPEG image records and the document's
//! shared JPEG tables record.
//!
//! ## Format Overview
//!
//! ```text
//! Document body:
//!   Record*
//!
//! Record (little-endian):
//! - Header: (type << 6) | length   (u16; length == 0x3F => u32 follows)
//! - Payload: length bytes
//!
//! Modeled payloads:
//! - DefineBits (6):  character id (u16) ++ headerless JPEG data
//! - JPEGTables (8):  shared JPEG table bitstream
//! ```
//!
//! Everything else is carried opaquely and re-emitted unchanged, so a
//! document round-trips even when most of its records are unmodeled.
//!
//! ## Key Properties
//!
//! - **Tolerant demux**: unknown tag types always demux to an opaque
//!   record; damaged records are policy-controlled (abort, or substitute
//!   an opaque record and keep a diagnostic)
//! - **Byte-exact round trips**: header forms (short/long) survive decode
//!   and re-encode, including encoder quirks like long headers on short
//!   payloads
//! - **Shared-table resolution**: image records resolve the document's
//!   single JPEGTables record through a per-document index, safe under
//!   concurrent decode
//! - **Memoized image decode**: per-record single-slot cache, invalidated
//!   synchronously when the shared tables change
//!
//! ## Usage
//!
//! ```rust
//! use swf_tags::{CodecConfig, Document, RecordHeader, TagWriter, JPEG_TABLES};
//!
//! // Build a tiny document body holding one JPEGTables record
//! let mut writer = TagWriter::new();
//! RecordHeader { kind: JPEG_TABLES, length: 2, long_form: false }.write(&mut writer);
//! writer.write_bytes(&[0xFF, 0xD9]);
//! let body = writer.into_bytes();
//!
//! // Decode, inspect, re-encode
//! let doc = Document::decode(body.clone(), CodecConfig::default()).unwrap();
//! assert_eq!(doc.tags().len(), 1);
//! assert_eq!(doc.encode(), body);
//! ```
//!
//! Image decoding itself stays outside the crate: callers hand a
//! [`BitmapDecoder`] to [`DefineBitsTag::decoded_image`] and get the
//! assembled, marker-stripped JPEG stream decoded through it.

pub mod assemble;
pub mod cache;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod demux;
pub mod deps;
pub mod document;
pub mod format;
pub mod range;
pub mod registry;
pub mod tags;
pub mod writer;

// Re-export main types
pub use assemble::{assemble_jpeg, has_error_header};
pub use cache::ImageCache;
pub use config::{CodecConfig, DemuxPolicy};
pub use cursor::{ByteCursor, DecodeError};
pub use decoder::{Bitmap, BitmapDecoder};
pub use demux::{DemuxError, DemuxOutput, Diagnostic, TagDemux};
pub use deps::{DependencyIndex, InvalidationListener, SharedTableState, SubscriptionHandle};
pub use document::Document;
pub use format::{ImageFormat, RecordHeader, DEFINE_BITS, JPEG_TABLES};
pub use range::ByteRange;
pub use registry::{DecodeContext, DecodeFn, TagRegistry};
pub use tags::{DefineBitsTag, JpegTablesTag, OpaqueTag, Tag, TagError};
pub use writer::TagWriter;
