//! Per-user settings file.
//!
//! `config.toml` in the cog config directory (or the file named by
//! `COG_CONFIG`) supplies defaults that sit between the compiled-in values
//! and the command line:
//!
//! ```toml
//! output = "build"
//! language = "c++17"
//! c_language = "c11"
//! unity_units = 8
//! deployment = "14.0"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::{SETTINGS_ENV, SETTINGS_FILE};
use crate::platform::paths::config_dir;

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to read settings {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("invalid settings {}: {source}", path.display())]
  Parse { path: PathBuf, source: toml::de::Error },
}

/// Values read from the settings file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
  pub output: Option<PathBuf>,
  pub language: Option<String>,
  pub c_language: Option<String>,
  pub unity_units: Option<usize>,
  pub deployment: Option<String>,
}

impl Settings {
  /// Location of the settings file, honouring `COG_CONFIG`.
  pub fn path() -> Option<PathBuf> {
    match std::env::var_os(SETTINGS_ENV) {
      Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
      _ => config_dir().map(|dir| dir.join(SETTINGS_FILE)),
    }
  }

  /// Load settings from the default location; a missing file yields defaults.
  pub fn load() -> Result<Self, SettingsError> {
    match Self::path() {
      Some(path) => Self::load_from(&path),
      None => Ok(Self::default()),
    }
  }

  /// Load settings from `path`; a missing file yields defaults.
  pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
    if !path.exists() {
      debug!(path = %path.display(), "no settings file");
      return Ok(Self::default());
    }
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let settings = toml::from_str(&content).map_err(|source| SettingsError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "loaded settings");
    Ok(settings)
  }
}
