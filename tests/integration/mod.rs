//! Integration tests for the built-in rule sets and full runs against files

mod builtin_sets;
mod runner_scenarios;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Copy a fixture into a fresh temp dir, returning the dir and the copy's path.
pub fn stage_fixture(name: &str) -> (TempDir, PathBuf) {
    let source = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let dir = TempDir::new().unwrap();
    let target = dir.path().join(name);
    fs::copy(&source, &target)
        .unwrap_or_else(|err| panic!("failed to stage fixture {name}: {err}"));
    (dir, target)
}
