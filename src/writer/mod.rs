//! Checksummed write sessions
//!
//! A `ChecksumWriter` streams bytes to a destination file while folding them
//! into a running checksum. When the session closes it:
//!
//! 1. closes the destination (flush, optional fsync)
//! 2. finalizes the checksum with the total byte count
//! 3. writes one `"<checksum> <size> <basename>"` line to the manifest target
//!
//! Close runs from `Drop` as well, so an early return or `?` in the caller
//! still closes the destination and attempts the manifest line. An explicit
//! `close()` is preferred since it can return the error.
//!
//! A failed or short write to the destination poisons the session: the
//! destination is still closed but no manifest entry is produced.

mod policy;

pub use policy::{write_manifest_line, ChecksumPolicy, ManifestTarget, WriteMode};

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::checksum::{Checksummer, DEFAULT_BUFFER_SIZE};
use crate::errors::{CksumError, CksumResult};
use crate::manifest::{manifest_filename, ManifestEntry};
use crate::observability::{log_event_with_fields, trace_event, CumulativeTimer, Event, IoTimings};

/// Write session that records a manifest entry on close.
pub struct ChecksumWriter {
    path: PathBuf,
    /// Base name recorded in the manifest
    filename: String,
    policy: ChecksumPolicy,
    manifest: Option<(PathBuf, WriteMode)>,
    /// `None` once closed
    destination: Option<BufWriter<File>>,
    checksummer: Checksummer,
    bytes_written: u64,
    poisoned: bool,
    io_timer: CumulativeTimer,
    checksum_timer: CumulativeTimer,
}

impl ChecksumWriter {
    /// Opens `path` for writing (created or truncated).
    ///
    /// With checksumming enabled the base name must be valid UTF-8 without
    /// whitespace; this is checked before the destination is touched.
    ///
    /// # Errors
    ///
    /// `InvalidFilename` for an unusable base name, `Io` if the destination
    /// cannot be created.
    pub fn create(path: impl AsRef<Path>, policy: ChecksumPolicy) -> CksumResult<Self> {
        let path = path.as_ref().to_path_buf();

        let (filename, manifest) = if policy.enabled {
            (
                manifest_filename(&path)?,
                policy.manifest_target.resolve(&path)?,
            )
        } else {
            let filename =
                manifest_filename(&path).unwrap_or_else(|_| path.display().to_string());
            (filename, None)
        };

        let mut io_timer = CumulativeTimer::new();
        let file = io_timer
            .time(|| File::create(&path))
            .map_err(|e| CksumError::io_at_path("failed to create", &path, e))?;

        trace_event(
            Event::WriterOpen,
            &[
                ("algorithm", policy.algorithm.as_str()),
                ("checksum", if policy.enabled { "on" } else { "off" }),
                ("path", &path.display().to_string()),
            ],
        );

        Ok(Self {
            filename,
            manifest,
            destination: Some(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file)),
            checksummer: Checksummer::new(policy.algorithm),
            bytes_written: 0,
            poisoned: false,
            io_timer,
            checksum_timer: CumulativeTimer::new(),
            policy,
            path,
        })
    }

    /// Writes a whole buffer as one checksummed file and closes the session.
    pub fn write_file(
        path: impl AsRef<Path>,
        data: &[u8],
        policy: ChecksumPolicy,
    ) -> CksumResult<Option<ManifestEntry>> {
        let mut writer = Self::create(path, policy)?;
        writer
            .write_all(data)
            .map_err(|e| CksumError::io_at_path("failed to write", &writer.path, e))?;
        writer.close()
    }

    /// Streams `reader` to the destination in `buffer_size` chunks.
    ///
    /// Returns the number of bytes copied.
    pub fn copy_from<R: Read>(&mut self, reader: &mut R, buffer_size: usize) -> CksumResult<u64> {
        let mut buffer = vec![0u8; buffer_size.max(1)];
        let mut copied = 0u64;

        loop {
            let count = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CksumError::io("failed to read input stream", e)),
            };
            self.write_all(&buffer[..count])
                .map_err(|e| CksumError::io_at_path("failed to write", &self.path, e))?;
            copied += count as u64;
        }

        Ok(copied)
    }

    /// Current position in the destination.
    pub fn tell(&mut self) -> CksumResult<u64> {
        let destination = self.destination.as_mut().ok_or_else(|| closed_error(&self.path))?;
        self.io_timer
            .time(|| destination.stream_position())
            .map_err(|e| CksumError::io_at_path("failed to tell", &self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name that will be recorded in the manifest.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Manifest file the entry will be written to, if any.
    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest.as_ref().map(|(path, _)| path.as_path())
    }

    pub fn timings(&self) -> IoTimings {
        IoTimings::from_timers(&self.io_timer, &self.checksum_timer)
    }

    /// Closes the session and returns the recorded entry.
    ///
    /// Returns `Ok(None)` when checksumming is disabled.
    ///
    /// # Errors
    ///
    /// - `Io` if the destination cannot be flushed/closed or the manifest
    ///   target cannot be written
    /// - `IncompleteWrite` if an earlier write failed
    pub fn close(mut self) -> CksumResult<Option<ManifestEntry>> {
        self.finish()
    }

    fn finish(&mut self) -> CksumResult<Option<ManifestEntry>> {
        let Some(destination) = self.destination.take() else {
            return Ok(None);
        };

        // The destination is always closed first
        let fsync = self.policy.fsync;
        if let Err(e) = self.io_timer.time(|| close_destination(destination, fsync)) {
            self.poisoned = true;
            return Err(CksumError::io_at_path("failed to close", &self.path, e));
        }

        if !self.policy.enabled {
            trace_event(
                Event::WriterClose,
                &[
                    ("bytes", &self.bytes_written.to_string()),
                    ("path", &self.path.display().to_string()),
                ],
            );
            return Ok(None);
        }

        if self.poisoned {
            return Err(CksumError::IncompleteWrite {
                filename: self.filename.clone(),
            });
        }

        let checksummer =
            std::mem::replace(&mut self.checksummer, Checksummer::new(self.policy.algorithm));
        let checksum = self.checksum_timer.time(|| checksummer.finalize());
        let entry = ManifestEntry::new(checksum, self.bytes_written, self.filename.clone());

        if let Some((manifest_path, mode)) = &self.manifest {
            self.io_timer
                .time(|| write_manifest_line(manifest_path, *mode, &entry, fsync))?;

            trace_event(
                Event::ManifestAppend,
                &[
                    ("entry", &entry.to_line()),
                    ("manifest", &manifest_path.display().to_string()),
                ],
            );
        }

        trace_event(
            Event::WriterClose,
            &[
                ("bytes", &self.bytes_written.to_string()),
                ("checksum", &checksum.to_string()),
                ("path", &self.path.display().to_string()),
            ],
        );

        Ok(Some(entry))
    }
}

impl Write for ChecksumWriter {
    /// Folds `buf` into the checksum, then writes all of it.
    ///
    /// A partial write is an error that poisons the session.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.poisoned {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "write session already failed",
            ));
        }
        let Some(destination) = self.destination.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::Other, "write session closed"));
        };

        if self.policy.enabled {
            let checksummer = &mut self.checksummer;
            self.checksum_timer.time(|| checksummer.update(buf));
        }

        if let Err(e) = self.io_timer.time(|| destination.write_all(buf)) {
            self.poisoned = true;
            return Err(e);
        }

        self.bytes_written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let Some(destination) = self.destination.as_mut() else {
            return Ok(());
        };
        self.io_timer.time(|| destination.flush())
    }
}

impl Drop for ChecksumWriter {
    fn drop(&mut self) {
        if self.destination.is_none() {
            return;
        }
        if let Err(e) = self.finish() {
            log_event_with_fields(
                Event::WriterDropCloseFailed,
                &[
                    ("code", e.code()),
                    ("path", &self.path.display().to_string()),
                    ("reason", &e.to_string()),
                ],
            );
        }
    }
}

fn close_destination(destination: BufWriter<File>, fsync: bool) -> io::Result<()> {
    let file = destination.into_inner().map_err(|e| e.into_error())?;
    if fsync {
        file.sync_all()?;
    }
    Ok(())
}

fn closed_error(path: &Path) -> CksumError {
    CksumError::io_at_path(
        "session closed",
        path,
        io::Error::new(io::ErrorKind::Other, "write session closed"),
    )
}
