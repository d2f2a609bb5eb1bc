//! CLI output formatting.
//!
//! Every entry leads with its positional index and logical name, with what
//! happened to it on an indented context line:
//!
//! ## Normalize
//!
//! ```text
//! 001 dawn.jpg
//!     4000x3000 → 1024x768
//! 002 notes.txt
//!     passed through
//! 003 broken.png
//!     failed, kept original: Decode failed: ...
//!
//! Normalized 3 files: 1 transformed, 0 unchanged, 1 passed through, 1 failed
//! ```
//!
//! ## Plan
//!
//! ```text
//! Source: 200x100
//! Crop:   100x100 at (50, 0)
//! Output: 100x100
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure.

use crate::field::CollectionEntry;
use crate::imaging::CropPlan;
use crate::ingest::{EntryOutcome, IngestReport};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn outcome_line(outcome: &EntryOutcome) -> String {
    match outcome {
        EntryOutcome::Transformed { from, to } => format!("{from} → {to}"),
        EntryOutcome::Unchanged => "unchanged".to_string(),
        EntryOutcome::PassThrough => "passed through".to_string(),
        EntryOutcome::Failed(error) => format!("failed, kept original: {error}"),
        EntryOutcome::Discarded => "discarded".to_string(),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Normalize
// ============================================================================

/// Format per-entry outcomes of one ingest, followed by a summary line.
pub fn format_ingest_report(report: &IngestReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, entry) in report.entries.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), entry.name));
        lines.push(format!("{}{}", indent(1), outcome_line(&entry.outcome)));
    }

    if !report.entries.is_empty() {
        lines.push(String::new());
    }

    let unchanged = report.count(|o| matches!(o, EntryOutcome::Unchanged));
    let passed = report.count(|o| matches!(o, EntryOutcome::PassThrough));
    let mut summary = format!(
        "Normalized {}: {} transformed, {} unchanged, {} passed through, {} failed",
        plural(report.entries.len(), "file"),
        report.transformed(),
        unchanged,
        passed,
        report.failed(),
    );
    if report.discarded() > 0 {
        summary.push_str(&format!(", {} discarded", report.discarded()));
    }
    lines.push(summary);

    lines
}

pub fn print_ingest_report(report: &IngestReport) {
    for line in format_ingest_report(report) {
        println!("{}", line);
    }
}

/// Format the written collection: index, name, and the file it landed in.
///
/// `files` are the on-disk names returned by
/// [`write_collection`](crate::export::write_collection), in entry order.
///
/// ```text
/// 001 dawn.jpg → out/dawn.jpg (image/jpeg, 48213 bytes)
/// 002 dawn.jpg → out/2-dawn.jpg (image/jpeg, 51022 bytes)
/// ```
pub fn format_written(entries: &[CollectionEntry], files: &[String], out_dir: &Path) -> Vec<String> {
    entries
        .iter()
        .zip(files)
        .enumerate()
        .map(|(i, (entry, file))| {
            format!(
                "{} {} → {} ({}, {})",
                format_index(i + 1),
                entry.name,
                out_dir.join(file).display(),
                entry.mime_type,
                plural(entry.bytes.len(), "byte"),
            )
        })
        .collect()
}

pub fn print_written(entries: &[CollectionEntry], files: &[String], out_dir: &Path) {
    for line in format_written(entries, files, out_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Format a crop plan for a single source size.
pub fn format_plan(plan: &CropPlan) -> Vec<String> {
    if plan.is_noop() {
        return vec![
            format!("Source: {}", plan.source),
            "No transform needed".to_string(),
        ];
    }
    let rect = plan.source_rect;
    vec![
        format!("Source: {}", plan.source),
        format!(
            "Crop:   {} at ({}, {})",
            rect.dimensions(),
            rect.x,
            rect.y
        ),
        format!("Output: {}", plan.output),
    ]
}

pub fn print_plan(plan: &CropPlan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}
