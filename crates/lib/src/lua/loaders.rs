//! Script loading confined to the configuration directory.
//!
//! `require`, `dofile` and `loadfile` are replaced so relative names resolve
//! against the directory of the file currently executing (initially the
//! directory holding the configuration script), never the process working
//! directory.
//!
//! `require` keeps Lua's caching and preload behaviour: only
//! `package.searchers[2]` is swapped out. A module name ending in `.lua` is
//! treated as a file name, so `require'cogfile.xcode.lua'` loads the sibling
//! file of that name; any other name goes through `package.searchpath`.
//!
//! When the sandbox carries [`Variables`] as app data, `${NAME}` references in
//! the string literals of every loaded file are expanded before compiling.

use std::fs;
use std::path::{Path, PathBuf};

use mlua::prelude::*;

use crate::options::Variables;

/// Registry key holding the directory of the executing file.
const CURRENT_DIR_KEY: &str = "__cog_current_dir";

/// Set the directory relative names resolve against before any file runs.
pub fn set_base_dir(lua: &Lua, dir: &Path) -> LuaResult<()> {
  lua.set_named_registry_value(CURRENT_DIR_KEY, dir.to_string_lossy().into_owned())
}

fn read_script(lua: &Lua, path: &Path) -> LuaResult<(PathBuf, String)> {
  let canonical = dunce::canonicalize(path)
    .map_err(|e| LuaError::external(format!("cannot resolve '{}': {}", path.display(), e)))?;
  let content = fs::read_to_string(&canonical)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical.display(), e)))?;
  let content = match lua.app_data_ref::<Variables>() {
    Some(vars) => vars.expand_literals(&content),
    None => content,
  };
  Ok((canonical, content))
}

/// Execute a Lua file, tracking its directory for nested relative loads.
pub fn run_file(lua: &Lua, path: &Path) -> LuaResult<LuaMultiValue> {
  let (canonical, content) = read_script(lua, path)?;
  let dir = canonical
    .parent()
    .unwrap_or(Path::new("."))
    .to_string_lossy()
    .into_owned();

  let prev_dir: Option<String> = lua.named_registry_value(CURRENT_DIR_KEY)?;
  lua.set_named_registry_value(CURRENT_DIR_KEY, dir)?;

  let result = lua
    .load(&content)
    .set_name(format!("@{}", canonical.display()))
    .eval::<LuaMultiValue>();

  // Restore even on error so the caller sees the original failure.
  let _ = lua.set_named_registry_value(CURRENT_DIR_KEY, prev_dir);

  result
}

/// Compile a Lua file into a function without running it.
fn compile_file(lua: &Lua, path: &Path) -> LuaResult<LuaFunction> {
  let (canonical, content) = read_script(lua, path)?;
  let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
  let chunk = lua
    .load(&content)
    .set_name(format!("@{}", canonical.display()))
    .into_function()?;

  // Wrap so the file's directory is current while it runs.
  lua.create_function(move |lua, args: LuaMultiValue| {
    let prev_dir: Option<String> = lua.named_registry_value(CURRENT_DIR_KEY)?;
    lua.set_named_registry_value(CURRENT_DIR_KEY, dir.to_string_lossy().into_owned())?;
    let result = chunk.call::<LuaMultiValue>(args);
    let _ = lua.set_named_registry_value(CURRENT_DIR_KEY, prev_dir);
    result
  })
}

/// Resolve `name` against the directory of the executing file.
fn resolve_path(lua: &Lua, name: &str) -> LuaResult<PathBuf> {
  let path = Path::new(name);
  if path.is_absolute() {
    return Ok(path.to_path_buf());
  }
  let current: Option<String> = lua.named_registry_value(CURRENT_DIR_KEY)?;
  Ok(match current {
    Some(dir) => Path::new(&dir).join(path),
    None => path.to_path_buf(),
  })
}

/// Replacement for `package.searchers[2]`.
fn create_lua_searcher(lua: &Lua) -> LuaResult<LuaFunction> {
  lua.create_function(|lua, modname: String| {
    let found = if modname.ends_with(".lua") {
      let candidate = resolve_path(lua, &modname)?;
      candidate.is_file().then_some(candidate)
    } else {
      let package: LuaTable = lua.globals().get("package")?;
      let templates: String = package.get("path")?;
      let current: Option<String> = lua.named_registry_value(CURRENT_DIR_KEY)?;
      let rooted = match current {
        Some(dir) => templates
          .split(';')
          .map(|template| Path::new(&dir).join(template).to_string_lossy().into_owned())
          .collect::<Vec<_>>()
          .join(";"),
        None => templates,
      };
      let searchpath: LuaFunction = package.get("searchpath")?;
      searchpath
        .call::<Option<String>>((modname.clone(), rooted))?
        .map(PathBuf::from)
    };

    match found {
      Some(file) => {
        let display = file.display().to_string();
        let loader = lua.create_function(move |lua, _: LuaMultiValue| run_file(lua, &file))?;
        Ok((LuaValue::Function(loader), display))
      }
      None => Ok((LuaValue::Nil, format!("\n\tno file for module '{}'", modname))),
    }
  })
}

fn create_dofile(lua: &Lua) -> LuaResult<LuaFunction> {
  lua.create_function(|lua, path: Option<String>| match path {
    Some(path) => {
      let resolved = resolve_path(lua, &path)?;
      run_file(lua, &resolved)
    }
    None => Err(LuaError::external("dofile() without path not supported")),
  })
}

fn create_loadfile(lua: &Lua) -> LuaResult<LuaFunction> {
  lua.create_function(|lua, (path, mode): (String, Option<String>)| {
    if let Some(m) = &mode
      && m != "t"
      && m != "bt"
    {
      return Err(LuaError::external(format!(
        "loadfile mode '{}' not supported (only 't' and 'bt' allowed)",
        m
      )));
    }
    let resolved = resolve_path(lua, &path)?;
    compile_file(lua, &resolved)
  })
}

/// Install the directory-relative loaders and drop native module loading.
pub fn install_loaders(lua: &Lua) -> LuaResult<()> {
  let package: LuaTable = lua.globals().get("package")?;
  package.set("path", "?.lua;?/init.lua")?;
  package.set("cpath", "")?;
  package.set("loadlib", LuaValue::Nil)?;

  let searchers: LuaTable = package.get("searchers")?;
  searchers.set(2, create_lua_searcher(lua)?)?;
  // C and all-in-one searchers
  searchers.set(4, LuaValue::Nil)?;
  searchers.set(3, LuaValue::Nil)?;

  lua.globals().set("dofile", create_dofile(lua)?)?;
  lua.globals().set("loadfile", create_loadfile(lua)?)?;
  Ok(())
}
