//! Checksum policy for write sessions
//!
//! A policy says whether a session checksums at all, with which algorithm,
//! and where the resulting manifest line goes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::checksum::ChecksumAlgorithm;
use crate::errors::{CksumError, CksumResult};
use crate::manifest::{default_manifest_path, ManifestEntry};

/// Where a finished session records its entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ManifestTarget {
    /// Append to `<destination>.crc32` next to the destination
    #[default]
    AppendToDefault,
    /// Append to an explicit manifest shared by several files
    Append(PathBuf),
    /// Truncate an explicit manifest and write the single entry
    Overwrite(PathBuf),
    /// Return the entry to the caller without persisting it
    Detached,
}

/// How a manifest file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Truncate,
}

impl ManifestTarget {
    /// Resolves the manifest file for `destination`.
    ///
    /// Returns `None` for `Detached`.
    pub fn resolve(&self, destination: &Path) -> CksumResult<Option<(PathBuf, WriteMode)>> {
        Ok(match self {
            Self::AppendToDefault => Some((default_manifest_path(destination)?, WriteMode::Append)),
            Self::Append(path) => Some((path.clone(), WriteMode::Append)),
            Self::Overwrite(path) => Some((path.clone(), WriteMode::Truncate)),
            Self::Detached => None,
        })
    }
}

/// Checksum configuration for one write session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumPolicy {
    /// When false the writer is a plain pass-through
    pub enabled: bool,
    pub manifest_target: ManifestTarget,
    pub algorithm: ChecksumAlgorithm,
    /// fsync the destination and manifest on close
    pub fsync: bool,
}

impl Default for ChecksumPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            manifest_target: ManifestTarget::default(),
            algorithm: ChecksumAlgorithm::default(),
            fsync: true,
        }
    }
}

impl ChecksumPolicy {
    /// A policy that writes bytes but records nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_manifest_target(mut self, target: ManifestTarget) -> Self {
        self.manifest_target = target;
        self
    }

    pub fn with_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }
}

/// Writes one `"<checksum> <size> <filename>\n"` line to a manifest file.
pub fn write_manifest_line(
    path: &Path,
    mode: WriteMode,
    entry: &ManifestEntry,
    fsync: bool,
) -> CksumResult<()> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Append => options.append(true),
        WriteMode::Truncate => options.write(true).truncate(true),
    };

    let mut file = options
        .open(path)
        .map_err(|e| CksumError::io_at_path("failed to open checksum file", path, e))?;

    file.write_all(format!("{}\n", entry).as_bytes())
        .map_err(|e| CksumError::io_at_path("failed to write checksum file", path, e))?;

    if fsync {
        file.sync_all()
            .map_err(|e| CksumError::io_at_path("failed to fsync checksum file", path, e))?;
    }

    Ok(())
}
