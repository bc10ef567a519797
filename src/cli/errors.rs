//! CLI-specific error types
//!
//! Every CLI error ends the process with exit status 1 after one
//! `"<CODE>: <message>"` line on stderr.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::errors::CksumError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdin/stdout)
    IoError,
    /// Verification failed
    IntegrityError,
    /// Same filename with different entries
    MergeConflict,
    /// Malformed manifest or unusable filename
    InvalidInput,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FASTCKSUM_CLI_CONFIG_ERROR",
            Self::IoError => "FASTCKSUM_CLI_IO_ERROR",
            Self::IntegrityError => "FASTCKSUM_CLI_INTEGRITY_ERROR",
            Self::MergeConflict => "FASTCKSUM_CLI_MERGE_CONFLICT",
            Self::InvalidInput => "FASTCKSUM_CLI_INVALID_INPUT",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// A library error reported as invalid input regardless of its kind
    pub fn invalid_input(e: CksumError) -> Self {
        Self::new(CliErrorCode::InvalidInput, describe(&e))
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<CksumError> for CliError {
    fn from(e: CksumError) -> Self {
        let code = match &e {
            CksumError::DuplicateFilename { .. } => CliErrorCode::MergeConflict,
            CksumError::Io { .. } => CliErrorCode::IoError,
            CksumError::UnknownFilename { .. } => CliErrorCode::IntegrityError,
            e if e.is_integrity_failure() => CliErrorCode::IntegrityError,
            _ => CliErrorCode::InvalidInput,
        };
        Self::new(code, describe(&e))
    }
}

fn describe(e: &CksumError) -> String {
    format!("{} ({})", e, e.code())
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
