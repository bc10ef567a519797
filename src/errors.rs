//! Error types for checksummed I/O and manifest handling
//!
//! Error codes:
//! - FASTCKSUM_DUPLICATE_FILENAME
//! - FASTCKSUM_UNKNOWN_FILENAME
//! - FASTCKSUM_SIZE_MISMATCH
//! - FASTCKSUM_CHECKSUM_MISMATCH
//! - FASTCKSUM_MALFORMED_MANIFEST
//! - FASTCKSUM_INVALID_FILENAME
//! - FASTCKSUM_NO_MANIFEST
//! - FASTCKSUM_INCOMPLETE_WRITE
//! - FASTCKSUM_IO
//!
//! Nothing here is retried. Every failure surfaces to the immediate caller.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for fastcksum operations
pub type CksumResult<T> = Result<T, CksumError>;

/// Checksum, manifest and storage errors
#[derive(Debug, Error)]
pub enum CksumError {
    /// Two entries share a filename but differ in checksum or size.
    #[error("duplicate filename {filename} in {origin}: \"{first}\" conflicts with \"{second}\"")]
    DuplicateFilename {
        filename: String,
        first: String,
        second: String,
        origin: String,
    },

    /// Verification was requested for a name the manifest does not list.
    #[error("filename \"{filename}\" not in checksum file {}", .manifest.display())]
    UnknownFilename { filename: String, manifest: PathBuf },

    #[error("file size {actual} for file {filename} did not match size {expected} from {}", .manifest.display())]
    SizeMismatch {
        filename: String,
        actual: u64,
        expected: u64,
        manifest: PathBuf,
    },

    #[error("checksum {actual} for file {filename} did not match checksum {expected} from {}", .manifest.display())]
    ChecksumMismatch {
        filename: String,
        actual: u32,
        expected: u32,
        manifest: PathBuf,
    },

    #[error("did not understand line {line_number} \"{line}\" in {origin}")]
    MalformedManifestLine {
        origin: String,
        line_number: usize,
        line: String,
    },

    /// The path has no base name usable as a manifest key.
    #[error("path {} has no valid manifest filename (UTF-8, no whitespace)", .path.display())]
    InvalidFilename { path: PathBuf },

    #[error("verification requested but no checksum file was loaded")]
    NoManifest,

    /// An earlier write on the session failed, so no entry was recorded.
    #[error("write session for {filename} failed earlier; no manifest entry recorded")]
    IncompleteWrite { filename: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl CksumError {
    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error naming the path it happened at
    pub fn io_at_path(action: &str, path: &Path, source: io::Error) -> Self {
        Self::io(format!("{} {}", action, path.display()), source)
    }

    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateFilename { .. } => "FASTCKSUM_DUPLICATE_FILENAME",
            Self::UnknownFilename { .. } => "FASTCKSUM_UNKNOWN_FILENAME",
            Self::SizeMismatch { .. } => "FASTCKSUM_SIZE_MISMATCH",
            Self::ChecksumMismatch { .. } => "FASTCKSUM_CHECKSUM_MISMATCH",
            Self::MalformedManifestLine { .. } => "FASTCKSUM_MALFORMED_MANIFEST",
            Self::InvalidFilename { .. } => "FASTCKSUM_INVALID_FILENAME",
            Self::NoManifest => "FASTCKSUM_NO_MANIFEST",
            Self::IncompleteWrite { .. } => "FASTCKSUM_INCOMPLETE_WRITE",
            Self::Io { .. } => "FASTCKSUM_IO",
        }
    }

    /// Whether the bytes on storage disagree with the manifest
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::SizeMismatch { .. } | Self::ChecksumMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CksumError::NoManifest;
        assert_eq!(err.code(), "FASTCKSUM_NO_MANIFEST");

        let err = CksumError::io("open", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.code(), "FASTCKSUM_IO");
    }

    #[test]
    fn test_mismatch_messages_name_file_and_values() {
        let err = CksumError::ChecksumMismatch {
            filename: "data.bin".to_string(),
            actual: 12,
            expected: 34,
            manifest: PathBuf::from("/tmp/data.bin.crc32"),
        };
        let display = err.to_string();
        assert!(display.contains("data.bin"));
        assert!(display.contains("12"));
        assert!(display.contains("34"));
        assert!(display.contains("/tmp/data.bin.crc32"));
        assert!(err.is_integrity_failure());
    }

    #[test]
    fn test_size_and_checksum_are_distinct() {
        let size = CksumError::SizeMismatch {
            filename: "a".to_string(),
            actual: 1,
            expected: 2,
            manifest: PathBuf::from("m"),
        };
        assert_eq!(size.code(), "FASTCKSUM_SIZE_MISMATCH");
        assert!(size.is_integrity_failure());
        assert!(!CksumError::NoManifest.is_integrity_failure());
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;
        let err = CksumError::io_at_path(
            "failed to open",
            Path::new("/test/path/file.dat"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/test/path/file.dat"));
        assert!(err.source().is_some());
    }
}
