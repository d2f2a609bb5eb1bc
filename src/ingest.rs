//! Normalize a freshly selected set of files into a field's collection.
//!
//! [`IngestPipeline::ingest`] attaches the selection to the reconciler (which
//! starts a new generation), then drives one future per entry concurrently on
//! the calling task:
//!
//! ```text
//! image entry      decode → plan → draw + encode → replace(slot, result)
//! non-image entry  ─────────────────────────────→ replace(slot, original)
//! ```
//!
//! Backend work runs on the blocking pool, so completions arrive in any
//! order. `ingest` resolves only after every entry reached the reconciler,
//! which is when a preview can be built.

use crate::files::{Payload, SourceFile};
use crate::imaging::{Constraints, Dimensions, ImageBackend, Normalized, TransformEngine};
use crate::reconcile::{Generation, Identity, Reconciler};
use futures_util::future::join_all;
use tracing::{debug, info};

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    /// Cropped and/or downscaled.
    Transformed { from: Dimensions, to: Dimensions },
    /// An image already within constraints.
    Unchanged,
    /// Not an image, or resizing is disabled for the field.
    PassThrough,
    /// Decode or encode failed; the original was kept.
    Failed(String),
    /// The selection was replaced or cleared before this entry finished.
    Discarded,
}

impl From<&Normalized> for EntryOutcome {
    fn from(normalized: &Normalized) -> Self {
        match normalized {
            Normalized::Transformed { from, result } => Self::Transformed {
                from: *from,
                to: result.dimensions,
            },
            Normalized::Unchanged(_) => Self::Unchanged,
            Normalized::Failed { error, .. } => Self::Failed(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryReport {
    pub identity: Identity,
    pub name: String,
    pub outcome: EntryOutcome,
}

/// Per-entry outcomes of one ingest, in attachment order.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub generation: Generation,
    pub entries: Vec<EntryReport>,
}

impl IngestReport {
    pub fn count(&self, predicate: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }

    pub fn transformed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Transformed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Failed(_)))
    }

    pub fn discarded(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Discarded))
    }
}

pub struct IngestPipeline<B: ImageBackend> {
    engine: TransformEngine<B>,
    reconciler: Reconciler,
}

impl<B: ImageBackend> IngestPipeline<B> {
    pub fn new(engine: TransformEngine<B>, reconciler: Reconciler) -> Self {
        Self { engine, reconciler }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Attach `files` as the field's new selection and normalize every image.
    pub async fn ingest(&self, files: Vec<SourceFile>, constraints: &Constraints) -> IngestReport {
        let (generation, assigned) = self.reconciler.attach(files);
        debug!(%generation, entries = assigned.len(), "ingest started");

        let entries = join_all(
            assigned
                .into_iter()
                .map(|(identity, file)| self.ingest_entry(generation, identity, file, constraints)),
        )
        .await;

        let report = IngestReport {
            generation,
            entries,
        };
        info!(
            %generation,
            entries = report.entries.len(),
            transformed = report.transformed(),
            failed = report.failed(),
            discarded = report.discarded(),
            "ingest complete"
        );
        report
    }

    async fn ingest_entry(
        &self,
        generation: Generation,
        identity: Identity,
        file: SourceFile,
        constraints: &Constraints,
    ) -> EntryReport {
        let name = file.name.clone();

        let (payload, outcome) = if constraints.disable_resize || !file.is_image() {
            (Payload::Original(file), EntryOutcome::PassThrough)
        } else {
            let normalized = self.engine.normalize(file, constraints).await;
            let outcome = EntryOutcome::from(&normalized);
            (normalized.into_payload(), outcome)
        };

        let outcome = match self.reconciler.replace(generation, identity, payload) {
            Ok(_) => outcome,
            Err(error) => {
                debug!(file = %name, %identity, %error, "stale completion dropped");
                EntryOutcome::Discarded
            }
        };

        EntryReport {
            identity,
            name,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{corrupt_image, mock_image, slow_mock_image, text_file};
    use std::time::Duration;

    fn pipeline() -> IngestPipeline<MockBackend> {
        IngestPipeline::new(TransformEngine::new(MockBackend::new()), Reconciler::new())
    }

    fn snapshot_texts(pipeline: &IngestPipeline<MockBackend>) -> Vec<String> {
        pipeline
            .reconciler()
            .snapshot()
            .iter()
            .map(|i| String::from_utf8_lossy(i.payload.bytes()).into_owned())
            .collect()
    }

    #[tokio::test]
    async fn mixed_selection_keeps_order() {
        let p = pipeline();
        let files = vec![
            mock_image("a.png", 2000, 1000),
            text_file("notes.txt"),
            mock_image("c.png", 10, 10),
            corrupt_image("d.jpg"),
        ];

        let report = p.ingest(files, &Constraints::default()).await;

        let outcomes: Vec<_> = report.entries.iter().map(|e| e.outcome.clone()).collect();
        assert_eq!(
            outcomes[0],
            EntryOutcome::Transformed {
                from: Dimensions::new(2000, 1000),
                to: Dimensions::new(1024, 512),
            }
        );
        assert_eq!(outcomes[1], EntryOutcome::PassThrough);
        assert_eq!(outcomes[2], EntryOutcome::Unchanged);
        assert!(matches!(outcomes[3], EntryOutcome::Failed(_)));

        let names: Vec<_> = p
            .reconciler()
            .snapshot()
            .iter()
            .map(|i| i.payload.name().to_string())
            .collect();
        assert_eq!(names, ["a.png", "notes.txt", "c.png", "d.jpg"]);
    }

    #[tokio::test]
    async fn reverse_completion_order_keeps_both_results() {
        let p = pipeline();
        let files = vec![
            slow_mock_image("a.png", 400, 200, 80),
            slow_mock_image("b.png", 300, 300, 0),
        ];

        let report = p.ingest(files, &Constraints::new(100, 100)).await;

        assert_eq!(report.transformed(), 2);
        assert_eq!(
            snapshot_texts(&p),
            ["image/png:100x50@100", "image/png:100x100@100"]
        );

        // b was drawn before a
        let draws: Vec<u32> = p
            .engine
            .backend()
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Draw { width, height, .. } => Some(height * 1000 + width),
                _ => None,
            })
            .collect();
        assert_eq!(draws, [100_100, 50_100]);
    }

    #[tokio::test]
    async fn disable_resize_passes_everything_through() {
        let p = pipeline();
        let constraints = Constraints {
            disable_resize: true,
            ..Constraints::new(10, 10)
        };

        let report = p
            .ingest(vec![mock_image("a.png", 500, 500)], &constraints)
            .await;

        assert_eq!(report.entries[0].outcome, EntryOutcome::PassThrough);
        assert!(p.engine.backend().get_operations().is_empty());
        assert_eq!(snapshot_texts(&p), ["500x500"]);
    }

    #[tokio::test]
    async fn new_selection_discards_in_flight_work() {
        let p = pipeline();
        let old = vec![slow_mock_image("old.png", 4000, 4000, 100)];
        let new = vec![mock_image("new.png", 20, 20)];
        let constraints = Constraints::default();

        let (old_report, new_report) = tokio::join!(p.ingest(old, &constraints), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            p.ingest(new, &constraints).await
        });

        assert_eq!(old_report.discarded(), 1);
        assert_eq!(new_report.entries[0].outcome, EntryOutcome::Unchanged);
        assert!(new_report.generation > old_report.generation);
        assert_eq!(snapshot_texts(&p), ["20x20"]);
    }

    #[tokio::test]
    async fn clear_discards_in_flight_work() {
        let p = pipeline();
        let files = vec![
            slow_mock_image("a.png", 3000, 3000, 100),
            slow_mock_image("b.png", 3000, 3000, 100),
        ];
        let constraints = Constraints::default();

        let (report, _) = tokio::join!(p.ingest(files, &constraints), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            p.reconciler().clear()
        });

        assert_eq!(report.discarded(), 2);
        assert!(p.reconciler().is_empty());
    }

    #[tokio::test]
    async fn empty_selection_completes() {
        let p = pipeline();
        let report = p.ingest(Vec::new(), &Constraints::default()).await;
        assert!(report.entries.is_empty());
        assert!(p.reconciler().is_empty());
    }
}
