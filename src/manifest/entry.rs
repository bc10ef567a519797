//! Manifest entry and line format
//!
//! One line per file:
//!
//! ```text
//! <checksum> <size> <filename>
//! ```
//!
//! Checksum and size are unsigned decimal. The filename is a base name with no
//! whitespace, so it is always the last token on the line.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{CksumError, CksumResult};

/// Suffix appended to a destination filename to name its default manifest.
pub const DEFAULT_MANIFEST_SUFFIX: &str = ".crc32";

/// A single `{checksum, size, filename}` record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestEntry {
    pub checksum: u32,
    pub size: u64,
    /// Base name of the file, unique within a manifest
    pub filename: String,
}

impl ManifestEntry {
    pub fn new(checksum: u32, size: u64, filename: impl Into<String>) -> Self {
        Self {
            checksum,
            size,
            filename: filename.into(),
        }
    }

    /// Parses one manifest line.
    ///
    /// Blank lines yield `Ok(None)`. `origin` and `line_number` only feed the
    /// error message.
    pub fn parse_line(line: &str, origin: &str, line_number: usize) -> CksumResult<Option<Self>> {
        let malformed = || CksumError::MalformedManifestLine {
            origin: origin.to_string(),
            line_number,
            line: line.trim_end().to_string(),
        };

        let mut fields = line.split_whitespace();
        let Some(checksum) = fields.next() else {
            return Ok(None);
        };
        let (Some(size), Some(filename), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };

        let checksum = checksum.parse::<u32>().map_err(|_| malformed())?;
        let size = size.parse::<u64>().map_err(|_| malformed())?;

        Ok(Some(Self::new(checksum, size, filename)))
    }

    /// The manifest line without its trailing newline.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.checksum, self.size, self.filename)
    }
}

/// Whether `name` can be stored as the last field of a manifest line.
pub fn is_valid_filename(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// Returns the manifest key for `path`: its base name.
pub fn manifest_filename(path: &Path) -> CksumResult<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| is_valid_filename(name))
        .map(str::to_string)
        .ok_or_else(|| CksumError::InvalidFilename {
            path: path.to_path_buf(),
        })
}

/// Returns `<dir>/<filename>.crc32` for a destination path.
pub fn default_manifest_path(destination: &Path) -> CksumResult<PathBuf> {
    let filename = manifest_filename(destination)?;
    Ok(destination.with_file_name(format!("{}{}", filename, DEFAULT_MANIFEST_SUFFIX)))
}
