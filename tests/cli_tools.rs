//! CLI tool tests
//!
//! Drives the `fastcksum` binary end to end: exit status, stdout payload and
//! the one-line stderr diagnostic.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn fastcksum(dir: &Path, args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_fastcksum"))
        .current_dir(dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn fastcksum");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin)
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait on fastcksum")
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

/// The `"<CODE>: <message>"` line printed last on failure
fn diagnostic(output: &Output) -> String {
    stderr_text(output).lines().last().unwrap_or_default().to_string()
}

// =============================================================================
// sum
// =============================================================================

#[test]
fn test_sum_stdin_prints_empty_name() {
    let temp_dir = TempDir::new().unwrap();
    let output = fastcksum(temp_dir.path(), &["sum"], b"123456789");

    assert!(output.status.success());
    assert_eq!(stdout_text(&output), "3421780262 9 \n");
}

#[test]
fn test_sum_files_and_posix() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("hello.txt"), b"hello\n").unwrap();

    let posix = fastcksum(temp_dir.path(), &["sum", "--algorithm", "posix", "hello.txt"], b"");
    assert!(posix.status.success());
    assert_eq!(stdout_text(&posix), "3015617425 6 hello.txt\n");

    let missing = fastcksum(temp_dir.path(), &["sum", "nope.bin"], b"");
    assert!(!missing.status.success());
    assert_eq!(missing.status.code(), Some(1));
    assert!(diagnostic(&missing).starts_with("FASTCKSUM_CLI_IO_ERROR"));
}

// =============================================================================
// store + cat
// =============================================================================

#[test]
fn test_store_prints_entry_and_cat_verifies() {
    let temp_dir = TempDir::new().unwrap();

    let stored = fastcksum(temp_dir.path(), &["store", "data.bin"], b"123456789");
    assert!(stored.status.success(), "{}", stderr_text(&stored));
    assert_eq!(stdout_text(&stored), "3421780262 9 data.bin\n");
    assert_eq!(fs::read(temp_dir.path().join("data.bin")).unwrap(), b"123456789");

    fs::write(temp_dir.path().join("all.crc32"), &stored.stdout).unwrap();
    let cat = fastcksum(temp_dir.path(), &["cat", "-c", "all.crc32", "data.bin"], b"");
    assert!(cat.status.success(), "{}", stderr_text(&cat));
    assert_eq!(cat.stdout, b"123456789");
}

#[test]
fn test_store_appends_to_manifest() {
    let temp_dir = TempDir::new().unwrap();

    for name in ["a.bin", "b.bin"] {
        let stored = fastcksum(
            temp_dir.path(),
            &["store", name, "--manifest", "all.crc32"],
            name.as_bytes(),
        );
        assert!(stored.status.success());
        assert!(stored.stdout.is_empty());
    }

    let manifest = fs::read_to_string(temp_dir.path().join("all.crc32")).unwrap();
    assert_eq!(manifest.lines().count(), 2);

    let cat = fastcksum(temp_dir.path(), &["cat", "-c", "all.crc32", "a.bin", "b.bin"], b"");
    assert!(cat.status.success());
    assert_eq!(cat.stdout, b"a.binb.bin");
}

#[test]
fn test_cat_corruption_fails_without_output() {
    let temp_dir = TempDir::new().unwrap();
    fastcksum(temp_dir.path(), &["store", "c.bin", "--manifest", "all.crc32"], b"clean");
    fs::write(temp_dir.path().join("c.bin"), b"dirty").unwrap();

    let cat = fastcksum(temp_dir.path(), &["cat", "-c", "all.crc32", "c.bin"], b"");
    assert_eq!(cat.status.code(), Some(1));
    assert!(cat.stdout.is_empty());

    let last = diagnostic(&cat);
    assert!(last.starts_with("FASTCKSUM_CLI_INTEGRITY_ERROR"), "{}", last);
    assert!(last.contains("FASTCKSUM_CHECKSUM_MISMATCH"));
}

#[test]
fn test_cat_unlisted_name_fails_up_front() {
    let temp_dir = TempDir::new().unwrap();
    fastcksum(temp_dir.path(), &["store", "a.bin", "--manifest", "all.crc32"], b"a");
    fs::write(temp_dir.path().join("z.bin"), b"z").unwrap();

    let cat = fastcksum(temp_dir.path(), &["cat", "-c", "all.crc32", "a.bin", "z.bin"], b"");
    assert_eq!(cat.status.code(), Some(1));
    assert!(cat.stdout.is_empty(), "Nothing is written before all names are checked");
    assert!(diagnostic(&cat).contains("FASTCKSUM_UNKNOWN_FILENAME"));
}

// =============================================================================
// merge
// =============================================================================

#[test]
fn test_merge_to_stdout_with_delete() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("b.crc32"), "2 2 b.bin\n").unwrap();
    fs::write(temp_dir.path().join("a.crc32"), "1 1 a.bin\n2 2 b.bin\n").unwrap();

    let merged = fastcksum(temp_dir.path(), &["merge", "--delete", "a.crc32", "b.crc32"], b"");
    assert!(merged.status.success());
    assert_eq!(stdout_text(&merged), "1 1 a.bin\n2 2 b.bin\n");
    assert!(!temp_dir.path().join("a.crc32").exists());
    assert!(!temp_dir.path().join("b.crc32").exists());
}

#[test]
fn test_merge_conflict_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.crc32"), "5 10 x.bin\n").unwrap();
    fs::write(temp_dir.path().join("b.crc32"), "6 10 x.bin\n").unwrap();

    let merged = fastcksum(
        temp_dir.path(),
        &["merge", "--delete", "-o", "all.crc32", "a.crc32", "b.crc32"],
        b"",
    );

    assert_eq!(merged.status.code(), Some(1));
    assert!(merged.stdout.is_empty());
    assert!(diagnostic(&merged).starts_with("FASTCKSUM_CLI_MERGE_CONFLICT"));
    assert!(temp_dir.path().join("a.crc32").exists());
    assert!(!temp_dir.path().join("all.crc32").exists());
}

#[test]
fn test_failures_print_one_stderr_line() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.crc32"), "5 10 x.bin\n").unwrap();
    fs::write(temp_dir.path().join("b.crc32"), "6 10 x.bin\n").unwrap();
    fastcksum(temp_dir.path(), &["store", "c.bin", "--manifest", "c.crc32"], b"clean");
    fs::write(temp_dir.path().join("c.bin"), b"dirty").unwrap();

    let failures: [&[&str]; 3] = [
        &["merge", "-o", "all.crc32", "a.crc32", "b.crc32"],
        &["cat", "-c", "c.crc32", "c.bin"],
        &["sum", "nope.bin"],
    ];
    for args in failures {
        let output = fastcksum(temp_dir.path(), args, b"");
        let stderr = stderr_text(&output);

        assert_eq!(output.status.code(), Some(1), "{:?}", args);
        assert_eq!(stderr.lines().count(), 1, "{:?}: {}", args, stderr);
        assert!(stderr.starts_with("FASTCKSUM_CLI_"), "{}", stderr);
    }
}

#[test]
fn test_config_file_and_bad_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("hello.txt"), b"hello\n").unwrap();
    fs::write(temp_dir.path().join("posix.json"), r#"{ "algorithm": "posix" }"#).unwrap();
    fs::write(temp_dir.path().join("bad.json"), r#"{ "buffer_size": 0 }"#).unwrap();

    let sum = fastcksum(temp_dir.path(), &["--config", "posix.json", "sum", "hello.txt"], b"");
    assert_eq!(stdout_text(&sum), "3015617425 6 hello.txt\n");

    let bad = fastcksum(temp_dir.path(), &["--config", "bad.json", "sum", "hello.txt"], b"");
    assert_eq!(bad.status.code(), Some(1));
    assert!(diagnostic(&bad).starts_with("FASTCKSUM_CLI_CONFIG_ERROR"));
}
