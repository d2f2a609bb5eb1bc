//! Pure Rust image processing backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::load_from_memory_with_format` |
//! | Crop + scale | `DynamicImage::crop_imm` + `resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → AVIF | `AvifEncoder::new_with_speed_quality` (rav1e, speed 6) |
//! | Encode → PNG, GIF, BMP, TIFF, WebP | lossless encoders, quality ignored |
//!
//! The output format always equals the input format, looked up by MIME type.

use super::backend::{BackendError, ImageBackend};
use super::params::{CropPlan, Dimensions, Quality};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Formats whose encoders are compiled in.
const ENCODABLE: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
    ImageFormat::Avif,
];

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn format_for(mime_type: &str) -> Result<ImageFormat, BackendError> {
    ImageFormat::from_mime_type(mime_type.to_ascii_lowercase())
        .ok_or_else(|| BackendError::UnsupportedFormat(mime_type.to_string()))
}

/// Encode with a quality-aware encoder where the format has one.
fn encode_image(img: &DynamicImage, format: ImageFormat, quality: Quality) -> Result<Vec<u8>, BackendError> {
    if !ENCODABLE.contains(&format) {
        return Err(BackendError::UnsupportedFormat(format!("{format:?}")));
    }

    let mut buf = Cursor::new(Vec::new());
    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.percent());
            rgb.write_with_encoder(encoder)
        }
        ImageFormat::Avif => {
            let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                &mut buf,
                6,
                quality.percent(),
            );
            img.write_with_encoder(encoder)
        }
        other => img.write_to(&mut buf, other),
    };

    result.map_err(|e| BackendError::Encode(format!("{format:?}: {e}")))?;
    Ok(buf.into_inner())
}

impl ImageBackend for RustBackend {
    type Surface = DynamicImage;

    fn decode(&self, bytes: &[u8], mime_type: &str) -> Result<DynamicImage, BackendError> {
        let format = format_for(mime_type).map_err(|e| BackendError::Decode(e.to_string()))?;
        image::load_from_memory_with_format(bytes, format)
            .map_err(|e| BackendError::Decode(format!("{mime_type}: {e}")))
    }

    fn dimensions(&self, surface: &DynamicImage) -> Dimensions {
        Dimensions::new(surface.width(), surface.height())
    }

    fn draw(&self, surface: &DynamicImage, plan: &CropPlan) -> Result<DynamicImage, BackendError> {
        let r = plan.source_rect;
        if r.x + r.width > surface.width() || r.y + r.height > surface.height() {
            return Err(BackendError::Encode(format!(
                "crop {}x{}+{}+{} outside {}x{} surface",
                r.width,
                r.height,
                r.x,
                r.y,
                surface.width(),
                surface.height()
            )));
        }
        let region = surface.crop_imm(r.x, r.y, r.width, r.height);
        if region.width() == plan.output.width && region.height() == plan.output.height {
            return Ok(region);
        }
        Ok(region.resize_exact(plan.output.width, plan.output.height, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        surface: &DynamicImage,
        mime_type: &str,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        encode_image(surface, format_for(mime_type)?, quality)
    }
}
