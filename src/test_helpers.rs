//! Shared test utilities for the superfile test suite.
//!
//! Provides synthetic image builders, file fixtures for the mock backend, and
//! snapshot extractors that keep assertions about collections short.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let files = vec![mock_image("a.png", 200, 100), text_file("notes.txt")];
//! field.on_field_changed(files).await;
//!
//! assert_eq!(names(&field.current_collection()), ["a.png", "notes.txt"]);
//! ```

use crate::field::CollectionEntry;
use crate::files::SourceFile;
use image::{ImageEncoder, RgbImage};

// =========================================================================
// Synthetic images (real encoders)
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// A valid PNG of the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A valid JPEG of the given dimensions.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 95)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

// =========================================================================
// Mock-backend fixtures
// =========================================================================

/// An image the mock backend decodes to `width` x `height`.
pub fn mock_image(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, "image/png", format!("{width}x{height}").into_bytes())
}

/// Like [`mock_image`], but decoding takes `delay_ms` on the blocking pool.
pub fn slow_mock_image(name: &str, width: u32, height: u32, delay_ms: u64) -> SourceFile {
    SourceFile::new(
        name,
        "image/png",
        format!("{width}x{height};delay={delay_ms}").into_bytes(),
    )
}

/// An image whose bytes no backend can decode.
pub fn corrupt_image(name: &str) -> SourceFile {
    SourceFile::new(name, "image/jpeg", b"\xff\xd8 truncated".to_vec())
}

/// A non-image attachment.
pub fn text_file(name: &str) -> SourceFile {
    SourceFile::new(name, "text/plain", b"hello".to_vec())
}

// =========================================================================
// Snapshot extractors
// =========================================================================

/// Entry names in collection order.
pub fn names(entries: &[CollectionEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

/// Entry bytes as lossy UTF-8, in collection order (mock payloads are text).
pub fn payload_texts(entries: &[CollectionEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| String::from_utf8_lossy(&e.bytes).into_owned())
        .collect()
}

/// Find an entry by name. Panics if not found.
pub fn find_entry<'a>(entries: &'a [CollectionEntry], name: &str) -> &'a CollectionEntry {
    entries.iter().find(|e| e.name == name).unwrap_or_else(|| {
        let available = names(entries);
        panic!("entry '{name}' not found. Available: {available:?}")
    })
}
