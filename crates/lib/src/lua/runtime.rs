use std::path::Path;

use mlua::{LuaOptions, StdLib, prelude::*};

use super::{globals, loaders, prelude::PRELUDE};
use crate::options::{OptionSet, SubPlatform};

/// Libraries a configuration script may use. No `io`, `os` or `debug`.
fn sandbox_libs() -> StdLib {
  StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8 | StdLib::PACKAGE
}

/// Create a fresh sandbox for one evaluation pass.
///
/// Evaluates, in order: the `options` table, the `platform` and `vars`
/// globals, the builder prelude and `__target`. Relative loads resolve
/// against `config_dir`, and the pass's variables are expanded in the
/// string literals of every file loaded.
pub fn create_runtime(options: &OptionSet, sub_platform: Option<SubPlatform>, config_dir: &Path) -> LuaResult<Lua> {
  let lua = Lua::new_with(sandbox_libs(), LuaOptions::default())?;

  loaders::install_loaders(&lua)?;
  loaders::set_base_dir(&lua, config_dir)?;

  let vars = options.variables(sub_platform);
  globals::register_globals(&lua, options, sub_platform, &vars)?;
  lua.set_app_data(vars);

  lua.load(PRELUDE).set_name("=prelude").exec()?;

  Ok(lua)
}

/// Run a configuration script inside `lua`.
pub fn exec_script(lua: &Lua, path: &Path) -> LuaResult<()> {
  loaders::run_file(lua, path).map(|_| ())
}
