//! Shared helpers for library integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use tempfile::TempDir;

use cog_lib::lua::runtime::create_runtime;
use cog_lib::options::{OptionSet, SubPlatform};

/// Options selecting a single backend, writing into `out`.
pub fn options_for(backend: &str, out: &Path) -> OptionSet {
  let mut options = OptionSet::default();
  match backend {
    "ninja" => options.ninja = true,
    "vs2022" => {
      options.vs2022 = true;
      options.vs_tools143 = true;
    }
    "xcode" => {
      options.xcode12 = true;
      options.os_mac = true;
    }
    "qmake" => options.qmake = true,
    "gradle" => {
      options.gradle = true;
      options.ndk = true;
    }
    other => panic!("unknown backend {}", other),
  }
  options.output = out.to_path_buf();
  options
}

/// A sandbox with the builder prelude loaded, rooted at a fresh directory.
pub fn create_test_runtime(options: &OptionSet, sub: Option<SubPlatform>) -> LuaResult<(Lua, TempDir)> {
  let temp = TempDir::new().map_err(LuaError::external)?;
  let lua = create_runtime(options, sub, temp.path())?;
  Ok((lua, temp))
}

/// A configuration directory with a script and source tree.
pub struct Fixture {
  pub temp: TempDir,
}

impl Fixture {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn script(&self) -> PathBuf {
    self.root().join("cogfile.lua")
  }

  pub fn out(&self) -> PathBuf {
    self.root().join("tmp")
  }

  pub fn write(&self, relative: &str, content: &str) -> &Self {
    let path = self.root().join(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    self
  }

  pub fn write_script(&self, content: &str) -> &Self {
    self.write("cogfile.lua", content)
  }

  pub fn read_output(&self, relative: &str) -> String {
    let path = self.out().join(relative);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
  }
}
