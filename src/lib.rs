//! fastcksum - checksum-verified file I/O and manifest merging
//!
//! - `writer`: stream bytes to a file and record `"<checksum> <size> <name>"`
//!   in a manifest when the session closes
//! - `reader`: read whole files and fail closed unless they match the manifest
//! - `merge`: combine manifests into one sorted, duplicate-free manifest

pub mod checksum;
pub mod cli;
pub mod config;
pub mod errors;
pub mod manifest;
pub mod merge;
pub mod observability;
pub mod reader;
pub mod writer;

pub use checksum::ChecksumAlgorithm;
pub use errors::{CksumError, CksumResult};
pub use manifest::{Manifest, ManifestEntry};
pub use merge::{merge, merge_files, merge_lines, MergeOutcome, MergeRecord, MergeRequest};
pub use reader::{ChecksumReader, ReaderReport, Source};
pub use writer::{ChecksumPolicy, ChecksumWriter, ManifestTarget};
