//! File values that flow through a field.
//!
//! A [`SourceFile`] is what the user attached: name, content type, raw bytes.
//! A [`TransformResult`] is the re-encoded replacement. An attached item's
//! [`Payload`] is one or the other, and either way it looks like a plain file
//! to whoever submits the field.

use crate::imaging::Dimensions;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Fallback content type for files whose type cannot be guessed.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A raw file as selected, dropped, or read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
            last_modified: None,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Ok(Self {
            name,
            mime_type: guess_mime_type(path).to_string(),
            bytes: bytes.into(),
            last_modified: modified,
        })
    }

    /// Content types under `image/` are candidates for normalization.
    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime_type)
    }
}

/// The re-encoded output of a transform, a drop-in replacement for the source.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Logical name of the file it replaces.
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
    pub dimensions: Dimensions,
    pub last_modified: DateTime<Utc>,
}

/// What an attached item currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Original(SourceFile),
    Transformed(TransformResult),
}

impl Payload {
    pub fn name(&self) -> &str {
        match self {
            Self::Original(f) => &f.name,
            Self::Transformed(t) => &t.name,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Self::Original(f) => &f.mime_type,
            Self::Transformed(t) => &t.mime_type,
        }
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        match self {
            Self::Original(f) => &f.bytes,
            Self::Transformed(t) => &t.bytes,
        }
    }

    pub fn is_transformed(&self) -> bool {
        matches!(self, Self::Transformed(_))
    }
}

impl From<SourceFile> for Payload {
    fn from(file: SourceFile) -> Self {
        Self::Original(file)
    }
}

impl From<TransformResult> for Payload {
    fn from(result: TransformResult) -> Self {
        Self::Transformed(result)
    }
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Guess a content type from a path's extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(OCTET_STREAM)
}
