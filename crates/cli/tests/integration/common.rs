//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own configuration directory; `cog` runs with it as the
/// working directory and ignores the user's settings file.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Create with `content` as `cogfile.lua`.
  pub fn with_cogfile(content: &str) -> Self {
    let env = Self::new();
    env.write_file("cogfile.lua", content);
    env
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Default output directory.
  pub fn out(&self) -> PathBuf {
    self.root().join("tmp")
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Read a generated file relative to the output directory.
  pub fn read_output(&self, relative_path: &str) -> String {
    let path = self.out().join(relative_path);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
  }

  /// Get a Command for the cog binary, configured for this environment.
  pub fn cog_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("cog");
    cmd
      .current_dir(self.root())
      .env("COG_CONFIG", self.root().join("no-settings.toml"))
      .env_remove("RUST_LOG");
    cmd
  }
}
