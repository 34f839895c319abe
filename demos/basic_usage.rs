// SPDX-License-Identifier: MIT
//! Basic usage example for the SWF tag codec

use swf_tags::{
    Bitmap, BitmapDecoder, CodecConfig, Document, RecordHeader, TagWriter, DEFINE_BITS,
    JPEG_TABLES,
};

/// Stand-in for a real JPEG decoder; accepts any stream.
struct DemoDecoder;

impl BitmapDecoder for DemoDecoder {
    fn decode(&self, data: &[u8]) -> Option<Bitmap> {
        println!("   decoder received {} bytes", data.len());
        Some(Bitmap::new(1, 1, vec![0xFF000000]))
    }
}

fn frame(writer: &mut TagWriter, kind: u16, payload: &[u8], long_form: bool) {
    RecordHeader {
        kind,
        length: payload.len(),
        long_form,
    }
    .write(writer);
    writer.write_bytes(payload);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== SWF Tag Codec - Basic Usage ===\n");

    // Step 1: build a document body by hand
    println!("1. Building a document body...");
    let mut writer = TagWriter::new();
    frame(&mut writer, JPEG_TABLES, &[0x11, 0x22, 0xFF, 0xD9], false);
    frame(&mut writer, DEFINE_BITS, &[0x01, 0x00, 0xAA, 0xBB], true);
    frame(&mut writer, 777, &[1, 2, 3], false);
    let body = writer.into_bytes();
    println!("   {} bytes\n", body.len());

    // Step 2: decode it
    println!("2. Decoding...");
    let doc = Document::decode(body.clone(), CodecConfig::default()).unwrap();
    for tag in doc.tags() {
        println!("   {} (type {})", tag.name(), tag.kind());
    }
    println!();

    // Step 3: decode the image against the shared tables
    println!("3. Decoding the image...");
    let bits = doc.tags()[1].as_define_bits().unwrap();
    let image = bits.decoded_image(&DemoDecoder).unwrap();
    println!("   got {}x{} bitmap\n", image.width, image.height);

    // Step 4: re-encode byte-exactly
    println!("4. Re-encoding...");
    let encoded = doc.encode();
    assert_eq!(encoded, body);
    println!("   round trip is byte-exact ({} bytes)", encoded.len());
}
