//! Manifest merging
//!
//! Combines many manifests into one sorted, duplicate-free manifest.
//!
//! Rules:
//! - identical lines (after whitespace normalization) collapse into one
//! - blank lines are dropped
//! - every remaining line has exactly three fields
//! - output is sorted by filename, byte-wise
//! - one filename with two different lines is a conflict: nothing is written
//!   and no input is deleted
//!
//! Fields are carried as text. The merger never interprets checksum or size,
//! so any three-field line format merges the same way.

mod atomic;

pub use atomic::write_atomic;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::{CksumError, CksumResult};
use crate::observability::{log_event_with_fields, Event};

const IN_MEMORY_ORIGIN: &str = "<lines>";

/// One merged manifest line, kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeRecord {
    pub checksum: String,
    pub size: String,
    pub filename: String,
}

impl fmt::Display for MergeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.checksum, self.size, self.filename)
    }
}

/// What to merge and where the result goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRequest {
    pub inputs: Vec<PathBuf>,
    /// Atomically replaced with the merged manifest. `None` writes to the
    /// caller's stream.
    pub output: Option<PathBuf>,
    /// Delete the inputs once the output is fully written
    pub delete_inputs: bool,
}

impl MergeRequest {
    pub fn new<I, P>(inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: None,
            delete_inputs: false,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_delete_inputs(mut self, delete_inputs: bool) -> Self {
        self.delete_inputs = delete_inputs;
        self
    }
}

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub records: Vec<MergeRecord>,
    pub output: Option<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

/// A line together with where it came from.
struct SourcedLine<'a> {
    origin: &'a str,
    line_number: usize,
    line: &'a str,
}

/// Merges in-memory manifest lines.
pub fn merge_lines<I, S>(lines: I) -> CksumResult<Vec<MergeRecord>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<S> = lines.into_iter().collect();
    let sourced = lines.iter().enumerate().map(|(index, line)| SourcedLine {
        origin: IN_MEMORY_ORIGIN,
        line_number: index + 1,
        line: line.as_ref(),
    });
    merge_sourced(sourced)
}

/// Reads and merges manifest files, returning the merged text.
pub fn merge_files<P: AsRef<Path>>(paths: &[P]) -> CksumResult<String> {
    Ok(render(&merge_paths(paths)?))
}

/// Runs a merge request; the merged text goes to stdout when no output path
/// is set.
pub fn merge(request: &MergeRequest) -> CksumResult<MergeOutcome> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    merge_to(request, &mut lock)
}

/// Runs a merge request, writing to `fallback` when no output path is set.
pub fn merge_to(request: &MergeRequest, fallback: &mut dyn Write) -> CksumResult<MergeOutcome> {
    let records = match merge_paths(request.inputs.as_slice()) {
        Ok(records) => records,
        Err(err) => {
            if let CksumError::DuplicateFilename { filename, .. } = &err {
                log_event_with_fields(
                    Event::MergeConflict,
                    &[("filename", filename.as_str()), ("reason", &err.to_string())],
                );
            }
            return Err(err);
        }
    };
    let text = render(&records);

    match &request.output {
        Some(path) => write_atomic(path, text.as_bytes())?,
        None => {
            fallback
                .write_all(text.as_bytes())
                .and_then(|()| fallback.flush())
                .map_err(|e| CksumError::io("failed to write merged manifest", e))?;
        }
    }

    log_event_with_fields(
        Event::MergeComplete,
        &[
            ("entries", &records.len().to_string()),
            ("inputs", &request.inputs.len().to_string()),
        ],
    );

    let deleted = if request.delete_inputs {
        delete_inputs(&request.inputs, request.output.as_deref())?
    } else {
        Vec::new()
    };

    Ok(MergeOutcome {
        records,
        output: request.output.clone(),
        deleted,
    })
}

/// Renders records as newline-terminated manifest lines.
pub fn render(records: &[MergeRecord]) -> String {
    records.iter().map(|record| format!("{}\n", record)).collect()
}

fn merge_paths<P: AsRef<Path>>(paths: &[P]) -> CksumResult<Vec<MergeRecord>> {
    let mut contents = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| CksumError::io_at_path("failed to read", path, e))?;
        contents.push((path.display().to_string(), text));
    }

    let sourced = contents.iter().flat_map(|(origin, text)| {
        text.lines().enumerate().map(move |(index, line)| SourcedLine {
            origin: origin.as_str(),
            line_number: index + 1,
            line,
        })
    });
    merge_sourced(sourced)
}

fn merge_sourced<'a, I>(lines: I) -> CksumResult<Vec<MergeRecord>>
where
    I: Iterator<Item = SourcedLine<'a>>,
{
    let mut seen = HashSet::new();
    let mut records: Vec<(MergeRecord, &'a str)> = Vec::new();

    for sourced in lines {
        let fields: Vec<&str> = sourced.line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let &[checksum, size, filename] = fields.as_slice() else {
            return Err(CksumError::MalformedManifestLine {
                origin: sourced.origin.to_string(),
                line_number: sourced.line_number,
                line: sourced.line.trim_end().to_string(),
            });
        };

        let record = MergeRecord {
            checksum: checksum.to_string(),
            size: size.to_string(),
            filename: filename.to_string(),
        };
        if seen.insert(record.clone()) {
            records.push((record, sourced.origin));
        }
    }

    records.sort_by(|(a, _), (b, _)| a.filename.as_bytes().cmp(b.filename.as_bytes()));

    for pair in records.windows(2) {
        let ((first, first_origin), (second, second_origin)) = (&pair[0], &pair[1]);
        if first.filename == second.filename {
            let origin = if first_origin == second_origin {
                first_origin.to_string()
            } else {
                format!("{} and {}", first_origin, second_origin)
            };
            return Err(CksumError::DuplicateFilename {
                filename: first.filename.clone(),
                first: first.to_string(),
                second: second.to_string(),
                origin,
            });
        }
    }

    Ok(records.into_iter().map(|(record, _)| record).collect())
}

fn delete_inputs(inputs: &[PathBuf], output: Option<&Path>) -> CksumResult<Vec<PathBuf>> {
    let output = output.map(resolve);
    // Resolve every input before the first removal; a removed path no
    // longer canonicalizes
    let resolved: Vec<PathBuf> = inputs.iter().map(|input| resolve(input)).collect();
    let mut removed = HashSet::new();
    let mut deleted = Vec::new();

    for (input, resolved) in inputs.iter().zip(resolved) {
        if output.as_ref() == Some(&resolved) || !removed.insert(resolved) {
            continue;
        }

        fs::remove_file(input).map_err(|e| CksumError::io_at_path("failed to delete", input, e))?;
        log_event_with_fields(
            Event::MergeInputDeleted,
            &[("path", &input.display().to_string())],
        );
        deleted.push(input.clone());
    }

    Ok(deleted)
}

fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
