//! In-memory checksum manifest
//!
//! A manifest maps base filename -> `{checksum, size}`. It is loaded once and
//! never modified or written back by readers.
//!
//! Load policy for repeated filenames:
//! - an identical repeated line collapses into one entry
//! - the same filename with a different checksum or size is a
//!   `DuplicateFilename` error

mod entry;

pub use entry::{
    default_manifest_path, is_valid_filename, manifest_filename, ManifestEntry,
    DEFAULT_MANIFEST_SUFFIX,
};

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::{CksumError, CksumResult};
use crate::observability::{trace_event, Event};

/// Filename-keyed set of manifest entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Where the entries came from, used in error messages
    origin: PathBuf,
    entries: HashMap<String, ManifestEntry>,
}

impl Manifest {
    /// Creates an empty manifest.
    pub fn new(origin: impl Into<PathBuf>) -> Self {
        Self {
            origin: origin.into(),
            entries: HashMap::new(),
        }
    }

    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> CksumResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CksumError::io_at_path("failed to read checksum file", path, e))?;

        let manifest = Self::parse(&content, path)?;

        trace_event(
            Event::ManifestLoaded,
            &[
                ("entries", &manifest.len().to_string()),
                ("path", &path.display().to_string()),
            ],
        );

        Ok(manifest)
    }

    /// Parses manifest text. `origin` is recorded for error reporting.
    pub fn parse(text: &str, origin: &Path) -> CksumResult<Self> {
        let mut manifest = Self::new(origin);
        let origin_name = origin.display().to_string();

        for (index, line) in text.lines().enumerate() {
            if let Some(entry) = ManifestEntry::parse_line(line, &origin_name, index + 1)? {
                manifest.insert(entry)?;
            }
        }

        Ok(manifest)
    }

    /// Builds a manifest from entries, applying the duplicate policy.
    pub fn from_entries<I>(origin: impl Into<PathBuf>, entries: I) -> CksumResult<Self>
    where
        I: IntoIterator<Item = ManifestEntry>,
    {
        let mut manifest = Self::new(origin);
        for entry in entries {
            manifest.insert(entry)?;
        }
        Ok(manifest)
    }

    fn insert(&mut self, entry: ManifestEntry) -> CksumResult<()> {
        if !is_valid_filename(&entry.filename) {
            return Err(CksumError::InvalidFilename {
                path: PathBuf::from(&entry.filename),
            });
        }

        match self.entries.entry(entry.filename.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
            Entry::Occupied(existing) if *existing.get() == entry => Ok(()),
            Entry::Occupied(existing) => Err(CksumError::DuplicateFilename {
                filename: entry.filename.clone(),
                first: existing.get().to_line(),
                second: entry.to_line(),
                origin: self.origin.display().to_string(),
            }),
        }
    }

    /// Path (or label) the manifest was loaded from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn get(&self, filename: &str) -> Option<&ManifestEntry> {
        self.entries.get(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by filename.
    pub fn entries(&self) -> Vec<&ManifestEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.filename.as_bytes().cmp(b.filename.as_bytes()));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_manifest() {
        let text = "11 3 a.bin\n22 4 b.bin\n\n";
        let manifest = Manifest::parse(text, Path::new("test.crc32")).unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("a.bin"), Some(&ManifestEntry::new(11, 3, "a.bin")));
        assert!(manifest.contains("b.bin"));
        assert!(!manifest.contains("c.bin"));
    }

    #[test]
    fn test_identical_repeat_collapses() {
        let manifest =
            Manifest::parse("11 3 a.bin\n11 3 a.bin\n", Path::new("test.crc32")).unwrap();
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_conflicting_repeat_rejected() {
        let err = Manifest::parse("11 3 a.bin\n12 3 a.bin\n", Path::new("test.crc32"))
            .unwrap_err();
        match err {
            CksumError::DuplicateFilename {
                filename,
                first,
                second,
                ..
            } => {
                assert_eq!(filename, "a.bin");
                assert_eq!(first, "11 3 a.bin");
                assert_eq!(second, "12 3 a.bin");
            }
            other => panic!("expected duplicate error, got {}", other),
        }
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = Manifest::parse("11 3 a.bin\ngarbage\n", Path::new("m.crc32")).unwrap_err();
        match err {
            CksumError::MalformedManifestLine { line_number, line, .. } => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "garbage");
            }
            other => panic!("expected malformed line error, got {}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("all.crc32");
        std::fs::write(&path, "7 1 z.bin\n8 2 y.bin\n").unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.origin(), path.as_path());
        let names: Vec<_> = manifest.entries().into_iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, ["y.bin", "z.bin"]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Manifest::load(Path::new("/nonexistent/path/all.crc32"));
        assert!(matches!(result, Err(CksumError::Io { .. })));
    }

    #[test]
    fn test_from_entries_rejects_bad_filename() {
        let result = Manifest::from_entries(
            "memory",
            vec![ManifestEntry::new(1, 1, "with space")],
        );
        assert!(matches!(result, Err(CksumError::InvalidFilename { .. })));
    }

    #[test]
    fn test_manifest_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Manifest>();
    }
}
