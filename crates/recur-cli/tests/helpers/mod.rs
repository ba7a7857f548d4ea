#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Runs `recur` inside a scratch directory with a pinned zone, so that no
/// `recur.toml` or system setting leaks into a test.
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Writes `recur.toml` into the scratch directory.
    pub fn with_config(self, contents: &str) -> Self {
        std::fs::write(self.temp_dir.path().join("recur.toml"), contents)
            .expect("Failed to write config");
        self
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("recur").expect("Failed to find recur binary");
        cmd.current_dir(self.temp_dir.path())
            .env_remove("RECUR_CONFIG")
            .env_remove("RECUR_MAX_OCCURRENCES")
            .env_remove("RECUR_DATETIME_FORMAT")
            .env_remove("RUST_LOG")
            .env("RECUR_DEFAULT_TIMEZONE", "America/New_York");
        cmd
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a command and returns its stdout.
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        String::from_utf8(output).expect("stdout is not UTF-8")
    }

    /// Runs a command with `--json` appended and parses its stdout.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let mut args = args.to_vec();
        args.push("--json");
        serde_json::from_str(&self.stdout(&args)).expect("stdout is not JSON")
    }
}

pub mod assertions {
    use super::*;

    pub fn lists_violation(field: &'static str) -> impl Predicate<str> {
        predicate::str::contains(field)
    }
}
