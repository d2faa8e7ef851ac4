//! Shared testing utilities for ci-dispatch CLI tests.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Variables the binary reads from a GitHub Actions environment.
const GITHUB_VARS: [&str; 5] = [
    "GITHUB_EVENT_NAME",
    "GITHUB_REF_NAME",
    "GITHUB_BASE_REF",
    "GITHUB_STEP_SUMMARY",
    "GITHUB_TOKEN",
];

/// Testing harness providing an isolated repository directory for CLI exercises.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
    work_dir: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    /// Create a new isolated environment.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let work_dir = root.path().join("work");
        fs::create_dir_all(&work_dir).expect("Failed to create test work directory");
        Self { root, work_dir }
    }

    /// Path to the repository directory used for CLI invocations.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Build a command for invoking the compiled `ci-dispatch` binary within the work directory.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("ci-dispatch").expect("Failed to locate ci-dispatch binary");
        cmd.current_dir(&self.work_dir).env("HOME", self.root.path()).env_remove("RUST_LOG");
        for var in GITHUB_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Write a file relative to the work directory.
    pub fn write(&self, path: &str, content: &str) {
        let full = self.work_dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(full, content).expect("Failed to write test file");
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.work_dir.join(path))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
    }

    /// Run `ci-dispatch init` in the work directory.
    pub fn init(&self) {
        self.cli().arg("init").assert().success();
    }
}
