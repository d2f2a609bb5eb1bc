//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the host environment seen from the core:
//! decode raw bytes into a raster surface, draw a planned region of one
//! surface into a new one, and encode a surface back to bytes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module's test module.

use super::params::{CropPlan, Dimensions, Quality};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Worker task failed: {0}")]
    Task(String),
}

impl BackendError {
    /// `true` for failures on the way in (bad or unsupported source bytes).
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Trait for image processing backends.
///
/// Every call is synchronous and CPU-bound; the transform engine moves them
/// onto the blocking pool, so implementations must be `Send + Sync`.
pub trait ImageBackend: Send + Sync + 'static {
    /// A decoded raster surface, immutable once produced.
    type Surface: Clone + Send + Sync + 'static;

    /// Decode raw bytes of the given MIME type.
    fn decode(&self, bytes: &[u8], mime_type: &str) -> Result<Self::Surface, BackendError>;

    /// Pixel dimensions of a surface.
    fn dimensions(&self, surface: &Self::Surface) -> Dimensions;

    /// Draw `plan.source_rect` of `surface` scaled into a new surface of
    /// `plan.output` size, with high-quality resampling.
    fn draw(&self, surface: &Self::Surface, plan: &CropPlan) -> Result<Self::Surface, BackendError>;

    /// Encode a surface to bytes of the given MIME type.
    fn encode(
        &self,
        surface: &Self::Surface,
        mime_type: &str,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
