//! CLI command implementations
//!
//! Each command loads configuration, applies flag overrides, and runs inside
//! an observation scope so `<COMMAND>_BEGIN` / `_COMPLETE` / `_FAILED` are
//! logged.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::checksum::checksum_stream;
use crate::config::Config;
use crate::errors::CksumError;
use crate::manifest::ManifestEntry;
use crate::merge::{merge_to, MergeRequest};
use crate::observability::{ObservationScope, Severity};
use crate::reader::{ChecksumReader, Source};
use crate::writer::{ChecksumWriter, ManifestTarget};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{flush, stdout, write_bytes, write_line};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    run_cli(Cli::parse_args())
}

/// Resolves configuration for parsed arguments and runs the command
pub fn run_cli(cli: Cli) -> CliResult<()> {
    let config = resolve_config(&cli)?;
    config.apply_logging();
    run_command(cli.command, &config)
}

/// Loads the config file (if any) and applies flag overrides
pub fn resolve_config(cli: &Cli) -> CliResult<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    if cli.verbose && config.log_level > Severity::Info {
        config.log_level = Severity::Info;
    }

    Ok(config)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command, config: &Config) -> CliResult<()> {
    match cmd {
        Command::Merge {
            files,
            delete,
            output,
        } => {
            let inputs = files.len().to_string();
            observed("MERGE", &[("inputs", &inputs)], || merge(files, delete, output))
        }
        Command::Sum { files } => {
            let count = files.len().to_string();
            observed("SUM", &[("files", &count)], || sum(&files, config))
        }
        Command::Store { filename, manifest } => {
            let path = filename.display().to_string();
            observed("STORE", &[("path", &path)], || store(&filename, manifest, config))
        }
        Command::Cat { manifest, files } => {
            let path = manifest.display().to_string();
            observed("CAT", &[("manifest", &path)], || cat(&manifest, &files, config))
        }
    }
}

/// Fields a command adds to its `_COMPLETE` event
pub type Summary = Vec<(&'static str, String)>;

fn observed(
    name: &str,
    fields: &[(&str, &str)],
    command: impl FnOnce() -> CliResult<Summary>,
) -> CliResult<()> {
    let scope = ObservationScope::with_fields(name, fields);
    match command() {
        Ok(summary) => {
            let summary: Vec<(&str, &str)> =
                summary.iter().map(|(k, v)| (*k, v.as_str())).collect();
            scope.complete_with_fields(&summary);
            Ok(())
        }
        Err(err) => {
            scope.fail(err.message());
            Err(err)
        }
    }
}

/// Merge checksum files
///
/// On a duplicate filename nothing is written and nothing is deleted.
pub fn merge(files: Vec<PathBuf>, delete: bool, output: Option<PathBuf>) -> CliResult<Summary> {
    let mut request = MergeRequest::new(files).with_delete_inputs(delete);
    if let Some(output) = output {
        request = request.with_output(output);
    }

    let mut out = stdout();
    let outcome = merge_to(&request, &mut out)?;
    flush(&mut out)?;

    Ok(vec![
        ("deleted", outcome.deleted.len().to_string()),
        ("records", outcome.records.len().to_string()),
    ])
}

/// Print one `"<checksum> <size> <name>"` line per file
///
/// With no files, stdin is summed and printed with an empty name.
pub fn sum(files: &[PathBuf], config: &Config) -> CliResult<Summary> {
    let mut out = stdout();

    if files.is_empty() {
        let (checksum, size) =
            checksum_stream(config.algorithm, &mut io::stdin().lock(), config.buffer_size)
                .map_err(|e| CliError::io_error(format!("stdin: {}", e)))?;
        write_line(&mut out, &format_sum(checksum, size, ""))?;
    }

    for path in files {
        let mut file = File::open(path)
            .map_err(|e| CksumError::io_at_path("failed to open", path, e))?;
        let (checksum, size) = checksum_stream(config.algorithm, &mut file, config.buffer_size)
            .map_err(|e| CksumError::io_at_path("failed to read", path, e))?;
        write_line(&mut out, &format_sum(checksum, size, &path.display().to_string()))?;
    }

    flush(&mut out)?;
    Ok(Summary::new())
}

fn format_sum(checksum: u32, size: u64, name: &str) -> String {
    format!("{} {} {}", checksum, size, name)
}

/// Copy stdin to `filename` and record its checksum
///
/// The entry is printed to stdout, or appended to `manifest` when given.
pub fn store(filename: &Path, manifest: Option<PathBuf>, config: &Config) -> CliResult<Summary> {
    let printed = manifest.is_none();
    let target = match manifest {
        Some(path) => ManifestTarget::Append(path),
        None => ManifestTarget::Detached,
    };

    let mut writer =
        ChecksumWriter::create(filename, config.policy().with_manifest_target(target))?;
    writer.copy_from(&mut io::stdin().lock(), config.buffer_size)?;
    let bytes = writer.bytes_written();
    let entry = writer.close()?;

    if let (true, Some(entry)) = (printed, entry) {
        print_entry(&entry)?;
    }
    Ok(vec![("bytes", bytes.to_string())])
}

fn print_entry(entry: &ManifestEntry) -> CliResult<()> {
    let mut out = stdout();
    write_line(&mut out, entry)?;
    flush(&mut out)
}

/// Verify files against `manifest` and write their bytes to stdout
///
/// Every name is checked up front. Each file is verified completely before
/// any of its bytes are written; the first failure stops the command.
/// A manifest with two different entries for one name is invalid input,
/// not a merge conflict.
pub fn cat(manifest: &Path, files: &[PathBuf], config: &Config) -> CliResult<Summary> {
    let reader = ChecksumReader::open(manifest).map_err(|e| match e {
        CksumError::DuplicateFilename { .. } => CliError::invalid_input(e),
        other => CliError::from(other),
    })?;
    let mut reader = reader.with_algorithm(config.algorithm);
    reader.verify_names(files.iter().map(PathBuf::as_path))?;

    let mut out = stdout();
    for path in files {
        let data = reader.read(Source::path(path))?;
        write_bytes(&mut out, &data)?;
    }
    flush(&mut out)?;

    let report = reader.report();
    Ok(vec![
        ("bytes", report.bytes_read.to_string()),
        ("verified", report.verified_count.to_string()),
    ])
}
