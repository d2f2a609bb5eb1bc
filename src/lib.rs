//! # Superfile
//!
//! Image normalization for file-attachment fields. Images attached to a field
//! are center-cropped to a fixed aspect ratio, downscaled to fit a bounding
//! box, and re-encoded, before the field is ever submitted. Non-image files
//! ride along untouched.
//!
//! # Architecture
//!
//! ```text
//!               on_field_changed(files)
//!                        │
//!                        ▼
//!   IngestPipeline ── attach ──▶ Reconciler ◀── replace(slot) ── CaptureAdapter
//!        │                        (one list,                         │
//!        ▼                         one lock)                         ▼
//!   TransformEngine ── plan_crop ── ImageBackend ◀──────────── CaptureDevice
//! ```
//!
//! Planning is pure arithmetic; the backend does the pixel work on the
//! blocking pool; the reconciler owns the one authoritative collection so
//! completions arriving in any order never clobber each other.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Crop planning, the backend trait, the `image`-crate backend, the transform engine |
//! | [`files`] | Source files, transform results, and attached payloads |
//! | [`reconcile`] | The authoritative ordered collection with generation tickets |
//! | [`ingest`] | Concurrent normalization of a new selection |
//! | [`capture`] | Single-frame capture from a live device |
//! | [`field`] | The per-field surface the UI layer drives |
//! | [`export`] | Writes a collection to a directory with unique file names and a `manifest.json` |
//! | [`config`] | `field.toml` and element-attribute options, resolved to constraints |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Exact Ratio Comparison
//!
//! "Does this image already have the target ratio" is answered by integer
//! cross-multiplication, never by comparing floats. A 1920x1080 image and a
//! `16:9` constraint match exactly, so no needless re-encode happens.
//!
//! ## Index-Addressed Updates
//!
//! A completed transform replaces exactly its own slot under the
//! reconciler's lock. Nothing writes back a whole list, so there is no
//! window where one completion can overwrite another.

pub mod capture;
pub mod config;
pub mod export;
pub mod field;
pub mod files;
pub mod imaging;
pub mod ingest;
pub mod output;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod test_helpers;
