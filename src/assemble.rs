// SPDX-License-Identifier: MIT
//! JPEG bitstream assembly
//!
//! A DefineBits payload holds only entropy-coded image data; the Huffman
//! and quantization tables live in the document's single JPEGTables record.
//! Splicing the two back into one standard JPEG stream has two quirks,
//! both inherited from the wild population of SWF encoders:
//!
//! - Some encoders prepend a bogus EOI/SOI pair ([`ERROR_HEADER`]) to either
//!   bitstream. It must be stripped or standard decoders reject the stream.
//! - The table bitstream ends with its own EOI marker
//!   ([`TABLES_END_MARKER`]), which must not appear mid-stream once image
//!   data follows. It is dropped from the table contribution only, never
//!   from the image contribution.
//!
//! Wrong trimming produces a stream the downstream decoder rejects outright
//! rather than a silently wrong image. That is the intended failure mode;
//! keep it.

use crate::format::{ERROR_HEADER, TABLES_END_MARKER};

/// Whether `data` starts with the non-standard error marker.
///
/// The marker only counts when followed by actual data; a slice that is
/// nothing but the four marker bytes is left alone.
pub fn has_error_header(data: &[u8]) -> bool {
    data.len() > ERROR_HEADER.len() && data[..ERROR_HEADER.len()] == ERROR_HEADER
}

/// Splice shared table bytes and image bytes into one decodable stream.
///
/// With a non-empty table contribution the result is
/// `trim(tables) ++ trim(image)` where the table trim also drops the
/// trailing end marker. Without tables (absent or empty) the image bytes
/// are returned with only their own leading marker stripped.
pub fn assemble_jpeg(tables: Option<&[u8]>, image: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tables.map_or(0, <[u8]>::len) + image.len());

    if let Some(tables) = tables {
        if !tables.is_empty() {
            let start = if has_error_header(tables) {
                ERROR_HEADER.len()
            } else {
                0
            };
            // Drop the trailing end marker; a degenerate table shorter than
            // marker + trim contributes nothing.
            let end = tables.len().saturating_sub(TABLES_END_MARKER.len()).max(start);
            out.extend_from_slice(&tables[start..end]);
        }
    }

    let start = if has_error_header(image) {
        ERROR_HEADER.len()
    } else {
        0
    };
    out.extend_from_slice(&image[start..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_error_header() {
        assert!(has_error_header(&[0xFF, 0xD9, 0xFF, 0xD8, 0x00]));
        assert!(!has_error_header(&[0xFF, 0xD8, 0xFF, 0xD9, 0x00]));
        // Exactly the marker bytes and nothing else does not count
        assert!(!has_error_header(&[0xFF, 0xD9, 0xFF, 0xD8]));
        assert!(!has_error_header(&[]));
    }

    #[test]
    fn test_assemble_strips_both_markers() {
        // tables = marker ++ T ++ end, image = marker ++ I  =>  T ++ I
        let tables = [&ERROR_HEADER[..], &[0x01, 0x02, 0x03][..], &TABLES_END_MARKER[..]].concat();
        let image = [&ERROR_HEADER[..], &[0x0A, 0x0B][..]].concat();

        let assembled = assemble_jpeg(Some(&tables), &image);
        assert_eq!(assembled, vec![0x01, 0x02, 0x03, 0x0A, 0x0B]);
    }

    #[test]
    fn test_assemble_without_leading_markers() {
        let tables = [&[0x01, 0x02][..], &TABLES_END_MARKER[..]].concat();
        let image = vec![0x0A, 0x0B];

        let assembled = assemble_jpeg(Some(&tables), &image);
        assert_eq!(assembled, vec![0x01, 0x02, 0x0A, 0x0B]);
    }

    #[test]
    fn test_assemble_no_tables() {
        let image = [&ERROR_HEADER[..], &[0x0A, 0x0B][..]].concat();

        let assembled = assemble_jpeg(None, &image);
        assert_eq!(assembled, vec![0x0A, 0x0B]);
    }

    #[test]
    fn test_assemble_empty_tables_behaves_like_no_tables() {
        let image = [&ERROR_HEADER[..], &[0x0A][..]].concat();

        let assembled = assemble_jpeg(Some(&[]), &image);
        assert_eq!(assembled, vec![0x0A]);
    }

    #[test]
    fn test_assemble_image_end_marker_kept() {
        // The end marker is dropped from the table contribution only; image
        // bytes pass through untouched apart from the leading marker.
        let tables = [&[0x01][..], &TABLES_END_MARKER[..]].concat();
        let image = vec![0x0A, 0xFF, 0xD9];

        let assembled = assemble_jpeg(Some(&tables), &image);
        assert_eq!(assembled, vec![0x01, 0x0A, 0xFF, 0xD9]);
    }

    #[test]
    fn test_assemble_degenerate_short_table() {
        // A 1-byte table cannot hold an end marker; it contributes nothing
        // instead of panicking.
        let assembled = assemble_jpeg(Some(&[0x01]), &[0x0A]);
        assert_eq!(assembled, vec![0x0A]);
    }
}
