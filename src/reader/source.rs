//! Read sources
//!
//! A reader accepts either a path it opens itself or an already-open stream
//! together with the name that identifies it in the manifest.

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::errors::CksumResult;
use crate::manifest::manifest_filename;

/// Input to `ChecksumReader::read`.
pub enum Source<'a> {
    /// Opened and closed by the reader
    Path(&'a Path),
    /// Borrowed stream; the reader never closes it. `name` is the storage
    /// identity (a path or base name) used for the manifest lookup.
    Handle {
        reader: &'a mut dyn Read,
        name: &'a str,
    },
}

impl<'a> Source<'a> {
    pub fn path<P: AsRef<Path> + ?Sized>(path: &'a P) -> Self {
        Source::Path(path.as_ref())
    }

    pub fn handle(reader: &'a mut dyn Read, name: &'a str) -> Self {
        Source::Handle { reader, name }
    }

    /// Base name used as the manifest key.
    pub fn lookup_name(&self) -> CksumResult<String> {
        match self {
            Source::Path(path) => manifest_filename(path),
            Source::Handle { name, .. } => manifest_filename(Path::new(name)),
        }
    }

    /// Name used in log lines and error messages.
    pub fn display_name(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Handle { name, .. } => (*name).to_string(),
        }
    }
}

impl fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Handle { name, .. } => f.debug_struct("Handle").field("name", name).finish(),
        }
    }
}
