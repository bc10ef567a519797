//! Checksum-verified reads
//!
//! A `ChecksumReader` holds a loaded manifest. Every file read through it is
//! read completely, checksummed over the literal bytes, and compared against
//! its manifest entry:
//!
//! - a name missing from the manifest fails before any byte is read
//! - size is compared first (`SizeMismatch`), then checksum
//!   (`ChecksumMismatch`)
//! - a failed verification returns no buffer at all
//!
//! Verification covers the whole file, so callers never see bytes that have
//! not been checked.

mod source;

pub use source::Source;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::checksum::ChecksumAlgorithm;
use crate::errors::{CksumError, CksumResult};
use crate::manifest::{Manifest, ManifestEntry};
use crate::observability::{
    log_event_with_fields, trace_event, CumulativeTimer, Event, IoTimings,
};

/// Reader diagnostics at the time of `report()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderReport {
    pub verified_count: u64,
    pub bytes_read: u64,
    pub timings: IoTimings,
}

impl fmt::Display for ReaderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Verified {} checksum(s)", self.verified_count)
    }
}

/// Reader that verifies files against a manifest.
#[derive(Debug)]
pub struct ChecksumReader {
    manifest: Option<Manifest>,
    algorithm: ChecksumAlgorithm,
    bytes_read: u64,
    verified_count: u64,
    io_timer: CumulativeTimer,
    checksum_timer: CumulativeTimer,
}

impl ChecksumReader {
    /// Loads `manifest_path`; every read is verified by default.
    pub fn open(manifest_path: impl AsRef<Path>) -> CksumResult<Self> {
        let manifest = Manifest::load(manifest_path.as_ref())?;
        Ok(Self::from_manifest(manifest))
    }

    pub fn from_manifest(manifest: Manifest) -> Self {
        Self::build(Some(manifest))
    }

    /// A reader without a manifest. Reads are unchecked.
    pub fn unverified() -> Self {
        Self::build(None)
    }

    fn build(manifest: Option<Manifest>) -> Self {
        Self {
            manifest,
            algorithm: ChecksumAlgorithm::default(),
            bytes_read: 0,
            verified_count: 0,
            io_timer: CumulativeTimer::new(),
            checksum_timer: CumulativeTimer::new(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Whether `read` verifies by default.
    pub fn is_verifying(&self) -> bool {
        self.manifest.is_some()
    }

    /// Reads a whole source, verifying it when a manifest is loaded.
    pub fn read(&mut self, source: Source<'_>) -> CksumResult<Vec<u8>> {
        let verify = self.is_verifying();
        self.read_with(source, verify)
    }

    /// Reads a whole source with an explicit verification choice.
    ///
    /// # Errors
    ///
    /// - `NoManifest` if `verify` is set on an unverified reader
    /// - `UnknownFilename` if the source is not listed
    /// - `SizeMismatch` / `ChecksumMismatch` on verification failure
    /// - `Io` if the source cannot be opened or read
    pub fn read_with(&mut self, source: Source<'_>, verify: bool) -> CksumResult<Vec<u8>> {
        let expected = if verify {
            Some(self.lookup(&source)?)
        } else {
            None
        };

        let display_name = source.display_name();
        let data = self.read_source(source)?;
        self.bytes_read += data.len() as u64;

        if let Some((entry, origin)) = expected {
            self.verify(&display_name, &data, &entry, origin)?;
        }

        Ok(data)
    }

    /// Checks that every name is listed, without reading anything.
    pub fn verify_names<'n, I>(&self, names: I) -> CksumResult<()>
    where
        I: IntoIterator<Item = &'n Path>,
    {
        for name in names {
            self.lookup(&Source::Path(name))?;
        }
        Ok(())
    }

    fn lookup(&self, source: &Source<'_>) -> CksumResult<(ManifestEntry, PathBuf)> {
        let manifest = self.manifest.as_ref().ok_or(CksumError::NoManifest)?;
        let filename = source.lookup_name()?;

        match manifest.get(&filename) {
            Some(entry) => Ok((entry.clone(), manifest.origin().to_path_buf())),
            None => Err(CksumError::UnknownFilename {
                filename,
                manifest: manifest.origin().to_path_buf(),
            }),
        }
    }

    fn read_source(&mut self, source: Source<'_>) -> CksumResult<Vec<u8>> {
        let mut data = Vec::new();

        match source {
            Source::Path(path) => {
                let mut file = self
                    .io_timer
                    .time(|| File::open(path))
                    .map_err(|e| CksumError::io_at_path("failed to open", path, e))?;

                if let Ok(metadata) = file.metadata() {
                    data.reserve(metadata.len() as usize);
                }

                self.io_timer
                    .time(|| file.read_to_end(&mut data))
                    .map_err(|e| CksumError::io_at_path("failed to read", path, e))?;
                // `file` is ours and closes here
            }
            Source::Handle { reader, name } => {
                self.io_timer
                    .time(|| reader.read_to_end(&mut data))
                    .map_err(|e| CksumError::io(format!("failed to read {}", name), e))?;
            }
        }

        Ok(data)
    }

    fn verify(
        &mut self,
        display_name: &str,
        data: &[u8],
        entry: &ManifestEntry,
        manifest: PathBuf,
    ) -> CksumResult<()> {
        let size = data.len() as u64;

        if size != entry.size {
            let err = CksumError::SizeMismatch {
                filename: display_name.to_string(),
                actual: size,
                expected: entry.size,
                manifest,
            };
            log_failure(&err, display_name);
            return Err(err);
        }

        let algorithm = self.algorithm;
        let checksum = self.checksum_timer.time(|| algorithm.checksum(data));

        if checksum != entry.checksum {
            let err = CksumError::ChecksumMismatch {
                filename: display_name.to_string(),
                actual: checksum,
                expected: entry.checksum,
                manifest,
            };
            log_failure(&err, display_name);
            return Err(err);
        }

        self.verified_count += 1;
        trace_event(
            Event::ReadVerified,
            &[
                ("checksum", &checksum.to_string()),
                ("path", display_name),
                ("size", &size.to_string()),
            ],
        );

        Ok(())
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn verified_count(&self) -> u64 {
        self.verified_count
    }

    pub fn timings(&self) -> IoTimings {
        IoTimings::from_timers(&self.io_timer, &self.checksum_timer)
    }

    /// Logs and returns the session diagnostics.
    pub fn report(&self) -> ReaderReport {
        let report = ReaderReport {
            verified_count: self.verified_count,
            bytes_read: self.bytes_read,
            timings: self.timings(),
        };

        log_event_with_fields(
            Event::ReaderReport,
            &[
                ("bytes_read", &report.bytes_read.to_string()),
                ("checksum_ms", &report.timings.checksum.as_millis().to_string()),
                ("io_ms", &report.timings.io.as_millis().to_string()),
                ("verified", &report.verified_count.to_string()),
            ],
        );

        report
    }
}

fn log_failure(err: &CksumError, display_name: &str) {
    log_event_with_fields(
        Event::ReadVerifyFailed,
        &[
            ("code", err.code()),
            ("path", display_name),
            ("reason", &err.to_string()),
        ],
    );
}
