//! Shared helpers for configuration integration tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Write `content` to `name` inside a fresh temp directory.
///
/// The directory handle must stay alive for as long as the file is used.
pub fn write_config(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config file");
    (dir, path)
}
