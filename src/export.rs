//! Write a field's collection to a directory.
//!
//! Each entry becomes one file, plus a `manifest.json` describing them in
//! attachment order:
//!
//! ```text
//! out/
//! ├── dawn.jpg
//! ├── 2-dawn.jpg        # second entry also named dawn.jpg
//! └── manifest.json
//! ```
//!
//! File names are unique within the directory: a name already taken (by an
//! earlier entry or by `manifest.json`) gets its position prefixed, and the
//! prefix is bumped until the name is free.

use crate::field::CollectionEntry;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

pub const MANIFEST_NAME: &str = "manifest.json";

/// One record of `manifest.json`.
#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    name: &'a str,
    file: &'a str,
    mime_type: &'a str,
    size: usize,
    transformed: bool,
    last_modified: Option<String>,
}

/// Write every entry plus `manifest.json` into `out_dir`.
///
/// Returns the file name each entry was written under, in entry order.
pub fn write_collection(entries: &[CollectionEntry], out_dir: &Path) -> io::Result<Vec<String>> {
    fs::create_dir_all(out_dir)?;

    let files = unique_file_names(entries);
    for (entry, file) in entries.iter().zip(&files) {
        fs::write(out_dir.join(file), &entry.bytes)?;
        debug!(%file, size = entry.bytes.len(), "wrote entry");
    }

    let manifest: Vec<_> = entries
        .iter()
        .zip(&files)
        .map(|(entry, file)| ManifestEntry {
            name: &entry.name,
            file,
            mime_type: &entry.mime_type,
            size: entry.bytes.len(),
            transformed: entry.transformed,
            last_modified: entry.last_modified.map(|t| t.to_rfc3339()),
        })
        .collect();
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(out_dir.join(MANIFEST_NAME), json)?;

    Ok(files)
}

/// Pick a distinct on-disk file name for every entry.
fn unique_file_names(entries: &[CollectionEntry]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::from([MANIFEST_NAME.to_string()]);
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let base = base_name(&entry.name);
            let mut file = base.clone();
            let mut prefix = i + 1;
            while taken.contains(&file) {
                file = format!("{prefix}-{base}");
                prefix += 1;
            }
            if file != entry.name {
                warn!(name = %entry.name, renamed = %file, "entry written under a different name");
            }
            taken.insert(file.clone());
            file
        })
        .collect()
}

/// Last path component of `name`, so entries cannot escape the directory.
fn base_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "unnamed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::Identity;
    use std::sync::Arc;

    fn entry(slot: u32, name: &str, content: &str) -> CollectionEntry {
        CollectionEntry {
            identity: Identity::Slot(slot),
            name: name.to_string(),
            mime_type: "text/plain".to_string(),
            bytes: Arc::from(content.as_bytes()),
            transformed: false,
            last_modified: None,
        }
    }

    #[test]
    fn every_entry_survives_name_collisions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let entries = vec![
            entry(0, "a.txt", "one"),
            entry(1, "a.txt", "two"),
            entry(2, "2-a.txt", "three"),
        ];

        let files = write_collection(&entries, tmp.path()).unwrap();

        assert_eq!(files, ["a.txt", "2-a.txt", "3-2-a.txt"]);
        for (file, content) in files.iter().zip(["one", "two", "three"]) {
            assert_eq!(fs::read_to_string(tmp.path().join(file)).unwrap(), content);
        }
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 4);
    }

    #[test]
    fn prefix_is_bumped_until_free() {
        let entries = vec![
            entry(0, "2-a.txt", "x"),
            entry(1, "a.txt", "y"),
            entry(2, "a.txt", "z"),
        ];
        // entry 2 would be "3-a.txt" first, which is free
        assert_eq!(unique_file_names(&entries), ["2-a.txt", "a.txt", "3-a.txt"]);

        // "3-a.txt" is already taken, so entry 2 moves on to "4-a.txt"
        let entries = vec![
            entry(0, "a.txt", "x"),
            entry(1, "3-a.txt", "y"),
            entry(2, "a.txt", "z"),
        ];
        assert_eq!(unique_file_names(&entries), ["a.txt", "3-a.txt", "4-a.txt"]);
    }

    #[test]
    fn manifest_name_is_reserved() {
        let tmp = tempfile::TempDir::new().unwrap();
        let entries = vec![entry(0, MANIFEST_NAME, "user data")];

        let files = write_collection(&entries, tmp.path()).unwrap();

        assert_eq!(files, ["1-manifest.json"]);
        assert_eq!(
            fs::read_to_string(tmp.path().join("1-manifest.json")).unwrap(),
            "user data"
        );
        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join(MANIFEST_NAME)).unwrap())
                .unwrap();
        assert_eq!(manifest[0]["name"], MANIFEST_NAME);
        assert_eq!(manifest[0]["file"], "1-manifest.json");
    }

    #[test]
    fn names_cannot_leave_the_directory() {
        let entries = vec![entry(0, "../escape.txt", "x"), entry(1, "", "y")];
        assert_eq!(unique_file_names(&entries), ["escape.txt", "unnamed"]);
    }

    #[test]
    fn manifest_lists_entries_in_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut photo = entry(0, "photo.jpg", "jpeg");
        photo.mime_type = "image/jpeg".to_string();
        photo.transformed = true;
        let entries = vec![photo, entry(1, "notes.txt", "hello")];

        write_collection(&entries, &tmp.path().join("nested/out")).unwrap();

        let manifest: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(tmp.path().join("nested/out").join(MANIFEST_NAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest[0]["file"], "photo.jpg");
        assert_eq!(manifest[0]["mime_type"], "image/jpeg");
        assert_eq!(manifest[0]["transformed"], true);
        assert_eq!(manifest[1]["size"], 5);
        assert!(manifest[1]["last_modified"].is_null());
    }
}
