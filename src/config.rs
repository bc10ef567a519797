//! Tool configuration
//!
//! Optional JSON file; every field has a default:
//!
//! ```json
//! { "algorithm": "crc32", "buffer_size": 65536, "fsync": true, "log_level": "warn" }
//! ```
//!
//! Command-line flags override values loaded here.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checksum::{ChecksumAlgorithm, DEFAULT_BUFFER_SIZE};
use crate::observability::{Logger, Severity};
use crate::writer::ChecksumPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Checksum family for new writes and verification (default "crc32")
    #[serde(default)]
    pub algorithm: ChecksumAlgorithm,

    /// Chunk size for streaming copies and checksums (default 64 KiB)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// fsync destinations, manifests and merge outputs (default true)
    #[serde(default = "default_fsync")]
    pub fsync: bool,

    /// Lowest severity written to stderr (default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}
fn default_fsync() -> bool {
    true
}
fn default_log_level() -> Severity {
    Severity::Warn
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: ChecksumAlgorithm::default(),
            buffer_size: default_buffer_size(),
            fsync: default_fsync(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be > 0".to_string()));
        }
        Ok(())
    }

    /// Write policy for new files: checksumming on, default manifest target.
    pub fn policy(&self) -> ChecksumPolicy {
        ChecksumPolicy::default()
            .with_algorithm(self.algorithm)
            .with_fsync(self.fsync)
    }

    /// Installs `log_level` as the process-wide minimum severity.
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.buffer_size, 65536);
        assert!(config.fsync);
        assert_eq!(config.log_level, Severity::Warn);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_json(
            r#"{ "algorithm": "posix", "buffer_size": 4096, "fsync": false, "log_level": "trace" }"#,
        )
        .unwrap();
        assert_eq!(config.algorithm, ChecksumAlgorithm::Posix);
        assert_eq!(config.buffer_size, 4096);

        let policy = config.policy();
        assert_eq!(policy.algorithm, ChecksumAlgorithm::Posix);
        assert!(!policy.fsync);
        assert!(policy.enabled);
    }

    #[test]
    fn test_rejects_zero_buffer() {
        let err = Config::from_json(r#"{ "buffer_size": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_field_and_level() {
        assert!(matches!(
            Config::from_json(r#"{ "manifest_suffix": ".md5" }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "log_level": "loud" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fastcksum.json");
        fs::write(&path, r#"{ "fsync": false }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert!(!config.fsync);
        assert!(matches!(
            Config::load(&tmp.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
