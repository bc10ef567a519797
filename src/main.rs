//! fastcksum CLI entry point
//!
//! Parses arguments and dispatches via `cli::run`. Errors are printed to
//! stderr as one line and the process exits with status 1.

use fastcksum::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
