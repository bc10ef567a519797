//! Stdout handling for CLI tools
//!
//! Tool output (manifest lines, file bytes) goes to stdout; logs and errors go
//! to stderr. Every write is flushed before the command reports success.

use std::fmt::Display;
use std::io::{self, Write};

use super::errors::{CliError, CliResult};

/// Write one line followed by `\n`
pub fn write_line<W: Write>(out: &mut W, line: &impl Display) -> CliResult<()> {
    writeln!(out, "{}", line).map_err(|e| CliError::io_error(format!("stdout: {}", e)))
}

/// Write raw bytes
pub fn write_bytes<W: Write>(out: &mut W, bytes: &[u8]) -> CliResult<()> {
    out.write_all(bytes)
        .map_err(|e| CliError::io_error(format!("stdout: {}", e)))
}

pub fn flush<W: Write>(out: &mut W) -> CliResult<()> {
    out.flush()
        .map_err(|e| CliError::io_error(format!("stdout: {}", e)))
}

/// Locked, buffered stdout
pub fn stdout() -> io::BufWriter<io::StdoutLock<'static>> {
    io::BufWriter::new(io::stdout().lock())
}
