//! CLI module for fastcksum
//!
//! Provides command-line tools for:
//! - merge: Combine checksum files into one sorted manifest
//! - sum: cksum-style checksum lines for files or stdin
//! - store: Copy stdin to a file and record its checksum
//! - cat: Verify files against a manifest and write them to stdout

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{cat, merge, resolve_config, run, run_cli, run_command, store, sum};
pub use errors::{CliError, CliErrorCode, CliResult};
