//! CLI argument definitions using clap
//!
//! Commands:
//! - fastcksum merge FILE... [--delete] [--output PATH]
//! - fastcksum sum [FILE...]
//! - fastcksum store FILENAME [--manifest PATH]
//! - fastcksum cat -c MANIFEST FILE...

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::checksum::ChecksumAlgorithm;

/// fastcksum - checksum-verified file I/O and manifest merging
#[derive(Parser, Debug)]
#[command(name = "fastcksum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Checksum algorithm: crc32 or posix
    #[arg(long, global = true)]
    pub algorithm: Option<ChecksumAlgorithm>,

    /// Log lifecycle events at info level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge checksum files into one sorted manifest
    Merge {
        /// Checksum files to merge
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Delete the input files after the output is written
        #[arg(long)]
        delete: bool,

        /// Write atomically to PATH instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Print "<checksum> <size> <name>" for each file, or for stdin
    Sum {
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Copy stdin to FILENAME and record its checksum
    Store {
        filename: PathBuf,

        /// Append the entry to PATH instead of printing it
        #[arg(short, long, value_name = "PATH")]
        manifest: Option<PathBuf>,
    },

    /// Verify files against a manifest and write them to stdout
    Cat {
        /// Checksum file listing every FILE
        #[arg(short = 'c', long = "checksums", value_name = "MANIFEST")]
        manifest: PathBuf,

        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
