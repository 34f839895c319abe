// SPDX-License-Identifier: MIT
//! DefineBits record variant
//!
//! An image record whose payload is a 2-byte character id followed by a
//! headerless JPEG entropy stream produced by the authoring encoder. The
//! stream is not decodable alone; [`DefineBitsTag::decoded_image`] splices
//! it with the document's shared JPEGTables bytes first (see
//! [`crate::assemble`]).
//!
//! The on-disk layout cannot represent any other image encoding, so
//! replacing the image in place is unsupported by design. Tooling that
//! wants to swap the picture replaces the whole record with a newer tag
//! kind; [`DefineBitsTag::import_supported`] signals that this is possible.

use crate::assemble::assemble_jpeg;
use crate::cache::ImageCache;
use crate::cursor::{ByteCursor, DecodeError};
use crate::decoder::{Bitmap, BitmapDecoder};
use crate::deps::{DependencyIndex, InvalidationListener, SubscriptionHandle};
use crate::format::{ImageFormat, RecordHeader, DEFINE_BITS, JPEG_TABLES};
use crate::range::ByteRange;
use crate::registry::DecodeContext;
use crate::tags::TagError;
use crate::writer::TagWriter;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// An image record carrying a headerless JPEG entropy stream.
#[derive(Debug)]
pub struct DefineBitsTag {
    character_id: u16,
    jpeg_data: ByteRange,
    deps: Weak<DependencyIndex>,
    cache: Arc<ImageCache>,
    cache_images: bool,
    subscription: Mutex<Option<SubscriptionHandle>>,
}

impl DefineBitsTag {
    /// Create a record from its parts.
    pub fn new(character_id: u16, jpeg_data: impl Into<ByteRange>, ctx: &DecodeContext) -> Self {
        Self {
            character_id,
            jpeg_data: jpeg_data.into(),
            deps: Arc::downgrade(&ctx.deps),
            cache: Arc::new(ImageCache::new()),
            cache_images: ctx.config.cache_images,
            subscription: Mutex::new(None),
        }
    }

    /// Decode from a payload cursor: character id, then all remaining
    /// bytes as image data.
    pub fn decode(cursor: &mut ByteCursor, ctx: &DecodeContext) -> Result<Self, DecodeError> {
        let character_id = cursor.read_u16()?;
        let jpeg_data = cursor.read_rest();
        Ok(Self::new(character_id, jpeg_data, ctx))
    }

    /// Document-unique id of the character this record defines.
    pub fn character_id(&self) -> u16 {
        self.character_id
    }

    /// The raw, headerless image bytes as stored in the record.
    pub fn jpeg_data(&self) -> &ByteRange {
        &self.jpeg_data
    }

    /// This record kind always carries JPEG-family data.
    pub fn image_format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    /// Whether the record can be replaced by a newer image tag kind.
    ///
    /// Importing a new picture swaps the whole record; it does not imply
    /// in-place mutation support.
    pub fn import_supported(&self) -> bool {
        true
    }

    /// In-place image replacement. Always fails: this layout cannot hold
    /// other encodings. The payload is left untouched.
    pub fn set_image(&mut self, _data: &[u8]) -> Result<(), TagError> {
        Err(TagError::UnsupportedOperation(
            "in-place image replacement is not supported for DefineBits",
        ))
    }

    /// Assemble the complete decodable bitstream for this record.
    ///
    /// Resolves the document's shared tables and splices them ahead of the
    /// record's own bytes, stripping encoder error markers. Pure with
    /// respect to this record: no caching, callable any number of times.
    pub fn raw_image_data(&self) -> Vec<u8> {
        let tables = self
            .deps
            .upgrade()
            .and_then(|deps| deps.lookup(JPEG_TABLES));

        match tables {
            Some(state) => assemble_jpeg(Some(&state.payload()), self.jpeg_data.bytes()),
            None => assemble_jpeg(None, self.jpeg_data.bytes()),
        }
    }

    /// Decode the image, memoizing the result when the document-wide cache
    /// switch is on.
    ///
    /// A rejected bitstream is a soft failure: it is logged, nothing is
    /// cached, `None` is returned and the record stays valid.
    pub fn decoded_image(&self, decoder: &dyn BitmapDecoder) -> Option<Arc<Bitmap>> {
        if let Some(cached) = self.cache.get() {
            return Some(cached);
        }

        self.ensure_subscribed();

        let data = self.raw_image_data();
        match decoder.decode(&data) {
            Some(bitmap) => {
                let bitmap = Arc::new(bitmap);
                if self.cache_images {
                    self.cache.store(Arc::clone(&bitmap));
                }
                Some(bitmap)
            }
            None => {
                tracing::warn!(
                    character_id = self.character_id,
                    stream_len = data.len(),
                    "bitmap decoder rejected assembled JPEG stream"
                );
                None
            }
        }
    }

    /// Subscribe the cache to table changes, once, when the table exists.
    fn ensure_subscribed(&self) {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return;
        }

        if let Some(deps) = self.deps.upgrade() {
            let listener =
                Arc::downgrade(&self.cache) as Weak<dyn InvalidationListener>;
            *subscription = deps.subscribe(JPEG_TABLES, listener);
        }
    }

    /// Write the record: character id, then image bytes. DefineBits is
    /// always written with a long-form header.
    pub fn encode_into(&self, writer: &mut TagWriter) {
        let header = RecordHeader {
            kind: DEFINE_BITS,
            length: 2 + self.jpeg_data.len(),
            long_form: true,
        };
        header.write(writer);
        writer.write_u16(self.character_id);
        writer.write_bytes(self.jpeg_data.bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::format::{ERROR_HEADER, TABLES_END_MARKER};
    use crate::tags::JpegTablesTag;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubDecoder {
        calls: AtomicUsize,
        accept: bool,
        last_input: Mutex<Vec<u8>>,
    }

    impl StubDecoder {
        fn accepting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                accept: true,
                last_input: Mutex::new(Vec::new()),
            }
        }

        fn rejecting() -> Self {
            Self {
                accept: false,
                ..Self::accepting()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl BitmapDecoder for StubDecoder {
        fn decode(&self, data: &[u8]) -> Option<Bitmap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock() = data.to_vec();
            self.accept.then(|| Bitmap::new(1, 1, vec![0xFF000000]))
        }
    }

    fn decode_tag(bytes: &[u8], ctx: &DecodeContext) -> DefineBitsTag {
        let mut cursor = ByteCursor::new(ByteRange::from(bytes));
        DefineBitsTag::decode(&mut cursor, ctx).unwrap()
    }

    #[test]
    fn test_decode_splits_id_and_payload() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let tag = decode_tag(&[0x05, 0x00, 0xAA, 0xBB], &ctx);
        assert_eq!(tag.character_id(), 5);
        assert_eq!(tag.jpeg_data().bytes(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_decode_truncated_id() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let mut cursor = ByteCursor::new(ByteRange::from(&[0x05][..]));
        assert!(DefineBitsTag::decode(&mut cursor, &ctx).is_err());
    }

    #[test]
    fn test_encode_round_trip_with_long_header() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let tag = decode_tag(&[0x2A, 0x00, 1, 2, 3], &ctx);

        let mut writer = TagWriter::new();
        tag.encode_into(&mut writer);
        let bytes = writer.into_bytes();

        // Always long form, even for a 5-byte payload
        let mut cursor = ByteCursor::new(ByteRange::from(bytes.as_slice()));
        let header = RecordHeader::read(&mut cursor).unwrap();
        assert_eq!(header.kind, DEFINE_BITS);
        assert!(header.long_form);
        assert_eq!(header.length, 5);

        let reparsed = decode_tag(cursor.read_rest().bytes(), &ctx);
        assert_eq!(reparsed.character_id(), 42);
        assert_eq!(reparsed.jpeg_data().bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_set_image_unsupported_and_payload_unchanged() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let mut tag = decode_tag(&[0x01, 0x00, 9, 9], &ctx);

        let err = tag.set_image(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, TagError::UnsupportedOperation(_)));
        assert_eq!(tag.jpeg_data().bytes(), &[9, 9]);
    }

    #[test]
    fn test_capabilities() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let tag = decode_tag(&[0x01, 0x00], &ctx);
        assert!(tag.import_supported());
        assert_eq!(tag.image_format(), ImageFormat::Jpeg);
        assert_eq!(tag.image_format().extension(), "jpg");
    }

    #[test]
    fn test_raw_image_data_with_tables() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let tables = [&ERROR_HEADER[..], &[0x11, 0x22], &TABLES_END_MARKER[..]].concat();
        let _tables_tag = JpegTablesTag::new(tables, &ctx);

        let payload = [&[0x01u8, 0x00][..], &ERROR_HEADER[..], &[0x33, 0x44][..]].concat();
        let tag = decode_tag(&payload, &ctx);

        assert_eq!(tag.raw_image_data(), vec![0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_raw_image_data_without_tables() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let payload = [&[0x01u8, 0x00][..], &ERROR_HEADER[..], &[0x33][..]].concat();
        let tag = decode_tag(&payload, &ctx);

        assert_eq!(tag.raw_image_data(), vec![0x33]);
    }

    #[test]
    fn test_decoded_image_caches_when_enabled() {
        let ctx = DecodeContext::new(CodecConfig::default().with_image_cache(true));
        let tag = decode_tag(&[0x01, 0x00, 1, 2], &ctx);
        let decoder = StubDecoder::accepting();

        let first = tag.decoded_image(&decoder).unwrap();
        let second = tag.decoded_image(&decoder).unwrap();

        assert_eq!(decoder.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_decoded_image_recomputes_when_disabled() {
        let ctx = DecodeContext::new(CodecConfig::default().with_image_cache(false));
        let tag = decode_tag(&[0x01, 0x00, 1, 2], &ctx);
        let decoder = StubDecoder::accepting();

        assert!(tag.decoded_image(&decoder).is_some());
        assert!(tag.decoded_image(&decoder).is_some());
        assert_eq!(decoder.calls(), 2);
    }

    #[test]
    fn test_soft_failure_not_cached() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let tag = decode_tag(&[0x01, 0x00, 1], &ctx);
        let rejecting = StubDecoder::rejecting();

        assert!(tag.decoded_image(&rejecting).is_none());
        assert!(tag.decoded_image(&rejecting).is_none());
        // No caching of failures: every access retried the decoder
        assert_eq!(rejecting.calls(), 2);

        // The record itself stays valid
        let accepting = StubDecoder::accepting();
        assert!(tag.decoded_image(&accepting).is_some());
    }

    #[test]
    fn test_table_mutation_invalidates_cache() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let tables_tag = JpegTablesTag::new(vec![0x11, 0xFF, 0xD9], &ctx);
        let tag = decode_tag(&[0x01, 0x00, 1, 2], &ctx);
        let decoder = StubDecoder::accepting();

        assert!(tag.decoded_image(&decoder).is_some());
        assert_eq!(decoder.calls(), 1);

        // Cache hit, no extra decoder call
        assert!(tag.decoded_image(&decoder).is_some());
        assert_eq!(decoder.calls(), 1);

        tables_tag.set_payload(vec![0x22, 0xFF, 0xD9]);

        // Invalidated: the next access decodes again, against the new tables
        assert!(tag.decoded_image(&decoder).is_some());
        assert_eq!(decoder.calls(), 2);
        assert_eq!(*decoder.last_input.lock(), vec![0x22, 1, 2]);
    }

    #[test]
    fn test_extracted_record_does_not_keep_index_alive() {
        let ctx = DecodeContext::new(CodecConfig::default());
        let tag = decode_tag(&[0x01, 0x00, 1, 2], &ctx);
        drop(ctx);

        // The dependency edge is non-owning; assembly degrades to the
        // no-tables path instead of resurrecting the document.
        assert_eq!(tag.raw_image_data(), vec![1, 2]);
    }
}
