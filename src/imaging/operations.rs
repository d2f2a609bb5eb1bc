//! High-level image operations.
//!
//! [`TransformEngine`] combines the geometry planner with backend execution:
//! it decodes a source file, plans the crop, draws and re-encodes. Every
//! backend call runs on tokio's blocking pool, so awaiting a transform is a
//! suspension point and sibling transforms interleave.

use super::backend::{BackendError, ImageBackend};
use super::calculations::plan_crop;
use super::params::{Constraints, CropPlan, Dimensions, Quality};
use crate::files::{Payload, SourceFile, TransformResult};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// What normalizing one file produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Cropped and/or downscaled, then re-encoded.
    Transformed {
        from: Dimensions,
        result: TransformResult,
    },
    /// Already within constraints; the original bytes are kept.
    Unchanged(SourceFile),
    /// Decode or encode failed; the original passes through untouched.
    Failed {
        original: SourceFile,
        error: BackendError,
    },
}

impl Normalized {
    pub fn into_payload(self) -> Payload {
        match self {
            Self::Transformed { result, .. } => Payload::Transformed(result),
            Self::Unchanged(original) | Self::Failed { original, .. } => Payload::Original(original),
        }
    }
}

/// Runs backend work for one field's transforms.
pub struct TransformEngine<B: ImageBackend> {
    backend: Arc<B>,
}

impl<B: ImageBackend> Clone for TransformEngine<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: ImageBackend> TransformEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run a backend call on the blocking pool.
    async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&B) -> Result<T> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || work(&backend))
            .await
            .map_err(|e| BackendError::Task(e.to_string()))?
    }

    /// Decode a raw file into a surface.
    pub async fn decode(&self, file: &SourceFile) -> Result<Arc<B::Surface>> {
        let bytes = Arc::clone(&file.bytes);
        let mime_type = file.mime_type.clone();
        let surface = self
            .blocking(move |backend| backend.decode(&bytes, &mime_type))
            .await?;
        Ok(Arc::new(surface))
    }

    /// Pixel dimensions of a decoded surface.
    pub fn dimensions(&self, surface: &B::Surface) -> Dimensions {
        self.backend.dimensions(surface)
    }

    /// Draw `plan` from `surface` and encode the result as `mime_type`.
    ///
    /// The result is named `name` and stamped with the current time. A no-op
    /// plan skips drawing and encoding and resolves with `original_bytes`.
    pub async fn transform(
        &self,
        surface: Arc<B::Surface>,
        plan: CropPlan,
        quality: Quality,
        name: &str,
        mime_type: &str,
        original_bytes: &Arc<[u8]>,
    ) -> Result<TransformResult> {
        if plan.is_noop() {
            return Ok(TransformResult {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                bytes: Arc::clone(original_bytes),
                dimensions: plan.output,
                last_modified: Utc::now(),
            });
        }
        self.render(surface, plan, quality, name, mime_type).await
    }

    /// Always draw and encode, even for a no-op plan.
    ///
    /// For surfaces that have no encoded original, such as capture frames.
    pub async fn render(
        &self,
        surface: Arc<B::Surface>,
        plan: CropPlan,
        quality: Quality,
        name: &str,
        mime_type: &str,
    ) -> Result<TransformResult> {
        let mime = mime_type.to_string();
        let encoded = self
            .blocking(move |backend| {
                let drawn = backend.draw(&surface, &plan)?;
                backend.encode(&drawn, &mime, quality)
            })
            .await?;

        Ok(TransformResult {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: encoded.into(),
            dimensions: plan.output,
            last_modified: Utc::now(),
        })
    }

    /// Decode, plan and transform one file against the field's constraints.
    ///
    /// Never fails: a decode or encode error yields [`Normalized::Failed`] so
    /// the original can still be submitted.
    pub async fn normalize(&self, file: SourceFile, constraints: &Constraints) -> Normalized {
        let surface = match self.decode(&file).await {
            Ok(surface) => surface,
            Err(error) => {
                warn!(file = %file.name, %error, "decode failed, keeping original");
                return Normalized::Failed {
                    original: file,
                    error,
                };
            }
        };

        let source = self.dimensions(&surface);
        let plan = plan_crop(source, constraints);
        if plan.is_noop() {
            debug!(file = %file.name, width = source.width, height = source.height, "within constraints");
            return Normalized::Unchanged(file);
        }

        match self
            .transform(
                surface,
                plan,
                constraints.quality,
                &file.name,
                &file.mime_type,
                &file.bytes,
            )
            .await
        {
            Ok(result) => {
                debug!(
                    file = %file.name,
                    from = ?source,
                    to = ?result.dimensions,
                    "transformed"
                );
                Normalized::Transformed {
                    from: source,
                    result,
                }
            }
            Err(error) => {
                warn!(file = %file.name, %error, "transform failed, keeping original");
                Normalized::Failed {
                    original: file,
                    error,
                }
            }
        }
    }
}
