//! Observable events
//!
//! Every log line carries one of these event names.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Writer
    /// Destination opened for a checksummed write session
    WriterOpen,
    /// Destination closed and entry finalized
    WriterClose,
    /// Entry line written to a manifest target
    ManifestAppend,
    /// Close run from `Drop` failed; the error could not be returned
    WriterDropCloseFailed,

    // Reader
    /// Manifest file parsed into memory
    ManifestLoaded,
    /// File content matched its manifest entry
    ReadVerified,
    /// File content did not match its manifest entry
    ReadVerifyFailed,
    /// Explicit reader diagnostics report
    ReaderReport,

    // Merger
    /// Merged manifest fully written
    MergeComplete,
    /// Two different entries share one filename
    MergeConflict,
    /// Input manifest removed after a successful merge
    MergeInputDeleted,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::WriterOpen => "WRITER_OPEN",
            Event::WriterClose => "WRITER_CLOSE",
            Event::ManifestAppend => "MANIFEST_APPEND",
            Event::WriterDropCloseFailed => "WRITER_DROP_CLOSE_FAILED",
            Event::ManifestLoaded => "MANIFEST_LOADED",
            Event::ReadVerified => "READ_VERIFIED",
            Event::ReadVerifyFailed => "READ_VERIFY_FAILED",
            Event::ReaderReport => "READER_REPORT",
            Event::MergeComplete => "MERGE_COMPLETE",
            Event::MergeConflict => "MERGE_CONFLICT",
            Event::MergeInputDeleted => "MERGE_INPUT_DELETED",
        }
    }

    /// Whether the event reports a failure that no caller receives as an error
    pub fn is_unreturnable_failure(&self) -> bool {
        matches!(self, Event::WriterDropCloseFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
