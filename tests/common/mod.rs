//! Common test utilities for Mosaic integration tests

// Not every test file uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use mosaic_report::test_utils::{sample_config, write_findings};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch directory holding a configuration, its findings file and the
/// run outputs.
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// A project with the findings fixture and a configuration using every
    /// built-in component.
    pub fn with_sample_config() -> Self {
        let project = Self::new();
        let findings = write_findings(project.path()).expect("Failed to write findings");
        project.write_config(&sample_config(&findings));
        project
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("report.toml")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.path().join("out")
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.config_path();
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    pub fn read_out(&self, name: &str) -> String {
        fs::read_to_string(self.out_dir().join(name)).expect("Failed to read output")
    }

    /// The `mosaic` binary, isolated from the user's settings file.
    pub fn mosaic(&self) -> Command {
        let mut cmd = Command::cargo_bin("mosaic").expect("mosaic binary not built");
        cmd.current_dir(self.path())
            .env("MOSAIC_CONFIG", self.path().join("no-settings.toml"))
            .env_remove("MOSAIC_DATA_DIR")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}
