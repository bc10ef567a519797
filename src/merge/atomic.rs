//! Atomic file replacement
//!
//! 1. Write to `<target>.tmp` in the same directory
//! 2. fsync the temp file
//! 3. Rename temp to target (atomic on POSIX)
//! 4. fsync the directory so the rename is durable
//!
//! Readers of `target` see either the old content or the new content.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{CksumError, CksumResult};

pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Replaces `target` with `content`.
pub fn write_atomic(target: &Path, content: &[u8]) -> CksumResult<()> {
    let temp_path = temp_path_for(target);

    if let Err(err) = write_temp(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    if let Err(e) = fs::rename(&temp_path, target) {
        let _ = fs::remove_file(&temp_path);
        return Err(CksumError::io_at_path("failed to commit", target, e));
    }

    if let Some(parent) = target.parent() {
        let dir = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(dir) = File::open(dir) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

fn write_temp(temp_path: &Path, content: &[u8]) -> CksumResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| CksumError::io_at_path("failed to create", temp_path, e))?;

    file.write_all(content)
        .map_err(|e| CksumError::io_at_path("failed to write", temp_path, e))?;

    file.sync_all()
        .map_err(|e| CksumError::io_at_path("failed to fsync", temp_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_and_replaces() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("all.crc32");

        write_atomic(&target, b"1 1 a\n").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"1 1 a\n");

        write_atomic(&target, b"2 2 b\n").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"2 2 b\n");
        assert!(!temp_path_for(&target).exists());
    }

    #[test]
    fn test_write_atomic_missing_dir_leaves_nothing() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("missing").join("all.crc32");

        let result = write_atomic(&target, b"x");
        assert!(matches!(result, Err(CksumError::Io { .. })));
        assert!(!target.exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            temp_path_for(Path::new("/d/all.crc32")),
            PathBuf::from("/d/all.crc32.tmp")
        );
    }
}
