//! Incremental checksum primitives
//!
//! Each algorithm module exposes the same three functions over an opaque
//! 32-bit accumulator:
//!
//! - `seed() -> u32`
//! - `update(state, data) -> u32`
//! - `finalize(total_length, state) -> u32`
//!
//! Folding a buffer in one call or in any sequence of chunks yields the same
//! finalized value. Streaming checksums depend on that.

pub mod crc32;
pub mod posix;

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Read buffer used when checksumming a stream.
pub const DEFAULT_BUFFER_SIZE: usize = 64 << 10;

/// Checksum family used for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// CRC-32, IEEE 802.3 polynomial
    #[default]
    Crc32,
    /// POSIX `cksum` CRC
    Posix,
}

impl ChecksumAlgorithm {
    /// Returns the lowercase algorithm name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crc32 => "crc32",
            Self::Posix => "posix",
        }
    }

    pub fn seed(&self) -> u32 {
        match self {
            Self::Crc32 => crc32::seed(),
            Self::Posix => posix::seed(),
        }
    }

    pub fn update(&self, state: u32, data: &[u8]) -> u32 {
        match self {
            Self::Crc32 => crc32::update(state, data),
            Self::Posix => posix::update(state, data),
        }
    }

    pub fn finalize(&self, total_length: u64, state: u32) -> u32 {
        match self {
            Self::Crc32 => crc32::finalize(total_length, state),
            Self::Posix => posix::finalize(total_length, state),
        }
    }

    /// Computes the checksum of a complete buffer.
    pub fn checksum(&self, data: &[u8]) -> u32 {
        self.finalize(data.len() as u64, self.update(self.seed(), data))
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crc32" => Ok(Self::Crc32),
            "posix" | "cksum" => Ok(Self::Posix),
            other => Err(format!(
                "unknown checksum algorithm '{}' (expected 'crc32' or 'posix')",
                other
            )),
        }
    }
}

/// Running accumulator that also counts the bytes folded into it.
#[derive(Debug, Clone)]
pub struct Checksummer {
    algorithm: ChecksumAlgorithm,
    state: u32,
    length: u64,
}

impl Checksummer {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self {
            algorithm,
            state: algorithm.seed(),
            length: 0,
        }
    }

    /// Folds `data` into the running state.
    pub fn update(&mut self, data: &[u8]) {
        self.state = self.algorithm.update(self.state, data);
        self.length += data.len() as u64;
    }

    /// Number of bytes folded so far.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Consumes the accumulator and returns the published checksum.
    pub fn finalize(self) -> u32 {
        self.algorithm.finalize(self.length, self.state)
    }
}

impl Default for Checksummer {
    fn default() -> Self {
        Self::new(ChecksumAlgorithm::default())
    }
}

/// Checksums a stream to its end in `buffer_size` chunks.
///
/// Returns `(checksum, total_length)`.
pub fn checksum_stream<R: Read>(
    algorithm: ChecksumAlgorithm,
    reader: &mut R,
    buffer_size: usize,
) -> std::io::Result<(u32, u64)> {
    let mut checksummer = Checksummer::new(algorithm);
    let mut buffer = vec![0u8; buffer_size.max(1)];

    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        checksummer.update(&buffer[..count]);
    }

    let length = checksummer.length();
    Ok((checksummer.finalize(), length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_checksummer_matches_one_shot() {
        let data = b"123456789";
        let mut checksummer = Checksummer::new(ChecksumAlgorithm::Crc32);
        checksummer.update(&data[..4]);
        checksummer.update(&data[4..]);
        assert_eq!(checksummer.length(), 9);
        assert_eq!(checksummer.finalize(), 0xCBF4_3926);
    }

    #[test]
    fn test_algorithms_differ() {
        let data = b"hello\n";
        assert_ne!(
            ChecksumAlgorithm::Crc32.checksum(data),
            ChecksumAlgorithm::Posix.checksum(data)
        );
        assert_eq!(ChecksumAlgorithm::Posix.checksum(data), 3_015_617_425);
    }

    #[test]
    fn test_checksum_stream_small_buffer() {
        let data: Vec<u8> = (0..300u32).map(|i| i as u8).collect();
        let (crc, len) =
            checksum_stream(ChecksumAlgorithm::Crc32, &mut Cursor::new(&data), 7).unwrap();
        assert_eq!(len, 300);
        assert_eq!(crc, ChecksumAlgorithm::Crc32.checksum(&data));
    }

    #[test]
    fn test_algorithm_parse_and_display() {
        assert_eq!("crc32".parse::<ChecksumAlgorithm>(), Ok(ChecksumAlgorithm::Crc32));
        assert_eq!("cksum".parse::<ChecksumAlgorithm>(), Ok(ChecksumAlgorithm::Posix));
        assert!("md5".parse::<ChecksumAlgorithm>().is_err());
        assert_eq!(ChecksumAlgorithm::Posix.to_string(), "posix");
    }

    #[test]
    fn test_algorithm_serde_names() {
        let json = serde_json::to_string(&ChecksumAlgorithm::Posix).unwrap();
        assert_eq!(json, "\"posix\"");
        let parsed: ChecksumAlgorithm = serde_json::from_str("\"crc32\"").unwrap();
        assert_eq!(parsed, ChecksumAlgorithm::Crc32);
    }
}
