//! One file field: the surface the UI layer talks to.
//!
//! A [`Field`] wires a [`Reconciler`], an [`IngestPipeline`] and an optional
//! [`CaptureAdapter`] around one set of [`Constraints`]:
//!
//! | UI event | Method |
//! |---|---|
//! | files selected or dropped | [`Field::on_field_changed`] |
//! | capture button | [`Field::on_capture_requested`] |
//! | clear button | [`Field::on_clear_requested`] |
//! | preview refresh | [`Field::current_collection`] |

use crate::capture::{CaptureAdapter, CaptureDevice, CaptureError, FrameStream, StillDevice};
use crate::config::{ConfigError, FieldConfig};
use crate::files::{Payload, SourceFile};
use crate::imaging::{Constraints, ImageBackend, TransformEngine};
use crate::ingest::{IngestPipeline, IngestReport};
use crate::reconcile::{Generation, Identity, Reconciler, ReplaceOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// One entry of the externally visible collection, for preview rendering
/// and submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub identity: Identity,
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
    pub transformed: bool,
    pub last_modified: Option<DateTime<Utc>>,
}

impl CollectionEntry {
    fn from_payload(identity: Identity, payload: Payload) -> Self {
        match payload {
            Payload::Original(file) => Self {
                identity,
                name: file.name,
                mime_type: file.mime_type,
                bytes: file.bytes,
                transformed: false,
                last_modified: file.last_modified,
            },
            Payload::Transformed(result) => Self {
                identity,
                name: result.name,
                mime_type: result.mime_type,
                bytes: result.bytes,
                transformed: true,
                last_modified: Some(result.last_modified),
            },
        }
    }
}

/// Where a captured frame went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Stored(ReplaceOutcome),
    /// The field was cleared or reselected while capturing.
    Discarded,
}

pub struct Field<B: ImageBackend, D = StillDevice<<B as ImageBackend>::Surface>> {
    constraints: Constraints,
    hide_clear: bool,
    reconciler: Reconciler,
    pipeline: IngestPipeline<B>,
    capture: Option<CaptureAdapter<B, D>>,
}

impl<B: ImageBackend> Field<B> {
    /// A field without a capture device.
    pub fn new(backend: B, constraints: Constraints) -> Self {
        Self::build(backend, constraints, None)
    }

    /// Resolve `config` once and build a field without a capture device.
    pub fn from_config(backend: B, config: &FieldConfig) -> Result<Self, ConfigError> {
        let mut field = Self::new(backend, config.constraints()?);
        field.hide_clear = config.hide_clear;
        Ok(field)
    }
}

impl<B, D> Field<B, D>
where
    B: ImageBackend,
    D: CaptureDevice,
    D::Stream: FrameStream<Frame = B::Surface>,
{
    /// A field that can also capture from `device`.
    pub fn with_device(backend: B, constraints: Constraints, device: D) -> Self {
        Self::build(backend, constraints, Some(device))
    }

    fn build(backend: B, constraints: Constraints, device: Option<D>) -> Self {
        let engine = TransformEngine::new(backend);
        let reconciler = Reconciler::new();
        Self {
            constraints,
            hide_clear: false,
            capture: device.map(|d| CaptureAdapter::new(engine.clone(), d)),
            pipeline: IngestPipeline::new(engine, reconciler.clone()),
            reconciler,
        }
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Whether the UI should hide the clear affordance.
    pub fn hide_clear(&self) -> bool {
        self.hide_clear
    }

    pub fn generation(&self) -> Generation {
        self.reconciler.generation()
    }

    pub fn has_capture_device(&self) -> bool {
        self.capture.is_some()
    }

    /// The user selected or dropped a new set of files.
    ///
    /// Resolves once every entry is in the collection.
    pub async fn on_field_changed(&self, files: Vec<SourceFile>) -> IngestReport {
        self.pipeline.ingest(files, &self.constraints).await
    }

    /// Capture one frame into the field's capture slot.
    pub async fn on_capture_requested(&self) -> Result<CaptureOutcome, CaptureError> {
        let adapter = self
            .capture
            .as_ref()
            .ok_or_else(|| CaptureError::Acquisition("field has no capture device".to_string()))?;

        let ticket = self.reconciler.generation();
        let result = adapter.capture(&self.constraints).await?;

        match self.reconciler.replace(ticket, Identity::Capture, result) {
            Ok(outcome) => Ok(CaptureOutcome::Stored(outcome)),
            Err(error) => {
                debug!(%error, "captured frame dropped");
                Ok(CaptureOutcome::Discarded)
            }
        }
    }

    /// The user cleared the field.
    pub fn on_clear_requested(&self) {
        let generation = self.reconciler.clear();
        debug!(%generation, "field cleared");
    }

    /// The collection as it would be submitted, in attachment order.
    pub fn current_collection(&self) -> Vec<CollectionEntry> {
        self.reconciler
            .snapshot()
            .into_iter()
            .map(|item| CollectionEntry::from_payload(item.identity, item.payload))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::mock_camera;
    use crate::capture::{CAPTURE_NAME, StillDevice};
    use crate::imaging::backend::tests::{MockBackend, MockSurface};
    use crate::test_helpers::*;

    fn camera_field(max: u32) -> Field<MockBackend, StillDevice<MockSurface>> {
        Field::with_device(MockBackend::new(), Constraints::new(max, max), mock_camera(640, 480))
    }

    #[tokio::test]
    async fn transforming_only_the_middle_file_keeps_order() {
        let field = Field::new(MockBackend::new(), Constraints::new(100, 100));

        field
            .on_field_changed(vec![
                mock_image("A", 50, 50),
                mock_image("B", 500, 500),
                mock_image("C", 50, 50),
            ])
            .await;

        let entries = field.current_collection();
        assert_eq!(names(&entries), ["A", "B", "C"]);
        assert_eq!(
            entries.iter().map(|e| e.transformed).collect::<Vec<_>>(),
            [false, true, false]
        );
        assert!(find_entry(&entries, "B").last_modified.is_some());
    }

    #[tokio::test]
    async fn repeated_captures_reuse_one_slot() {
        let field = camera_field(64);
        field.on_field_changed(vec![text_file("cv.txt")]).await;

        let first = field.on_capture_requested().await.unwrap();
        let second = field.on_capture_requested().await.unwrap();

        assert_eq!(first, CaptureOutcome::Stored(ReplaceOutcome::Appended(1)));
        assert_eq!(second, CaptureOutcome::Stored(ReplaceOutcome::Replaced(1)));
        let entries = field.current_collection();
        assert_eq!(names(&entries), ["cv.txt", CAPTURE_NAME]);
        assert_eq!(entries[1].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn capture_on_empty_field_appends() {
        let field = camera_field(1024);

        field.on_capture_requested().await.unwrap();

        assert_eq!(payload_texts(&field.current_collection()), ["image/jpeg:512x384@100"]);
    }

    #[tokio::test]
    async fn capture_without_device_changes_nothing() {
        let field = Field::new(MockBackend::new(), Constraints::default());
        field.on_field_changed(vec![text_file("a.txt")]).await;

        let err = field.on_capture_requested().await.unwrap_err();

        assert!(matches!(err, CaptureError::Acquisition(_)));
        assert_eq!(names(&field.current_collection()), ["a.txt"]);
    }

    #[tokio::test]
    async fn denied_device_changes_nothing() {
        let field: Field<MockBackend, StillDevice<MockSurface>> = Field::with_device(
            MockBackend::new(),
            Constraints::default(),
            StillDevice::unavailable(),
        );
        let generation = field.generation();

        assert!(field.on_capture_requested().await.is_err());
        assert!(field.current_collection().is_empty());
        assert_eq!(field.generation(), generation);
    }

    #[tokio::test]
    async fn clear_empties_the_collection() {
        let field = camera_field(100);
        field.on_field_changed(vec![mock_image("a.png", 10, 10)]).await;
        field.on_capture_requested().await.unwrap();

        field.on_clear_requested();

        assert!(field.current_collection().is_empty());
    }

    #[tokio::test]
    async fn new_selection_drops_previous_capture() {
        let field = camera_field(100);
        field.on_capture_requested().await.unwrap();

        field.on_field_changed(vec![mock_image("a.png", 10, 10)]).await;

        assert_eq!(names(&field.current_collection()), ["a.png"]);
    }

    #[test]
    fn from_config_carries_hide_clear() {
        let config = FieldConfig {
            hide_clear: true,
            ..FieldConfig::default()
        };
        let field = Field::from_config(MockBackend::new(), &config).unwrap();
        assert!(field.hide_clear());
        assert!(!field.has_capture_device());
        assert_eq!(field.constraints().max_width, 1024);
    }
}
