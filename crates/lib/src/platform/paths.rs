use crate::consts::APP_NAME;
use std::path::PathBuf;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var("USERPROFILE").map(PathBuf::from).ok().or_else(dirs::home_dir)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var("HOME").map(PathBuf::from).ok().or_else(dirs::home_dir)
}

/// Returns the directory holding cog's settings file
#[cfg(windows)]
pub fn config_dir() -> Option<PathBuf> {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .ok()
    .or_else(dirs::config_dir)
    .map(|dir| dir.join(APP_NAME))
}

/// Returns the directory holding cog's settings file
#[cfg(not(windows))]
pub fn config_dir() -> Option<PathBuf> {
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .ok()
    .or_else(|| home_dir().map(|home| home.join(".config")))?;
  Some(config_home.join(APP_NAME))
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn xdg_config_home_takes_precedence() {
    temp_env::with_vars(
      [
        ("XDG_CONFIG_HOME", Some("/custom/config")),
        ("HOME", Some("/home/user")),
      ],
      || {
        assert_eq!(config_dir(), Some(PathBuf::from("/custom/config").join(APP_NAME)));
      },
    );
  }

  #[test]
  #[serial]
  fn xdg_fallback_to_home_directory() {
    temp_env::with_vars(
      [("XDG_CONFIG_HOME", None::<&str>), ("HOME", Some("/home/user"))],
      || {
        assert_eq!(config_dir(), Some(PathBuf::from("/home/user/.config").join(APP_NAME)));
      },
    );
  }
}
