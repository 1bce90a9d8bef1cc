//! Globals visible to configuration scripts.
//!
//! - `options` - every switch of the run (see [`OptionSet::to_lua_source`])
//! - `platform` - `name()`, `vendor()`, `is(name)`, `host()`, `save(ws)`
//! - `vars` - read-only substitution values for this pass
//! - `__target` - the sub-platform (or platform name) this pass targets

use mlua::prelude::*;

use crate::options::{OptionSet, SubPlatform, Variables};
use crate::platform;

/// Registry key holding the workspace passed to `platform.save`.
pub const SAVED_WORKSPACE_KEY: &str = "__cog_saved_workspace";

/// Register `options`, `platform`, `vars` and `__target`.
pub fn register_globals(
  lua: &Lua,
  options: &OptionSet,
  sub_platform: Option<SubPlatform>,
  vars: &Variables,
) -> LuaResult<()> {
  lua
    .load(options.to_lua_source())
    .set_name("=options")
    .exec()?;

  register_platform(lua, options, sub_platform)?;
  register_vars(lua, vars)?;

  let target = sub_platform
    .map(|sub| sub.as_str())
    .or_else(|| options.platform_name())
    .unwrap_or("");
  lua.globals().set("__target", target)?;
  Ok(())
}

/// Names `platform.is` answers true for in this pass.
fn platform_aliases(options: &OptionSet, sub_platform: Option<SubPlatform>) -> Vec<&'static str> {
  let mut names = vec![options.vendor().as_str()];
  if let Some(name) = options.platform_name() {
    names.push(name);
  }
  if let Some(backend) = options.backend() {
    names.push(backend.as_str());
  }
  if let Some(sub) = sub_platform {
    names.push(sub.as_str());
  }
  names
}

fn register_platform(lua: &Lua, options: &OptionSet, sub_platform: Option<SubPlatform>) -> LuaResult<()> {
  let table = lua.create_table()?;

  let name = options.platform_name().unwrap_or("");
  table.set("name", lua.create_function(move |_, ()| Ok(name))?)?;

  let vendor = options.vendor().as_str();
  table.set("vendor", lua.create_function(move |_, ()| Ok(vendor))?)?;

  let aliases = platform_aliases(options, sub_platform);
  table.set(
    "is",
    lua.create_function(move |_, query: String| {
      let query = query.to_ascii_lowercase();
      Ok(aliases.iter().any(|alias| *alias == query))
    })?,
  )?;

  table.set("host", lua.create_function(|_, ()| Ok(platform::host_name()))?)?;

  table.set(
    "save",
    lua.create_function(|lua, workspace: LuaTable| {
      if !workspace.contains_key("m_tProjects")? {
        return Err(LuaError::external("platform.save expects a workspace created by workspace.new"));
      }
      lua.set_named_registry_value(SAVED_WORKSPACE_KEY, workspace)
    })?,
  )?;

  lua.globals().set("platform", table)
}

fn register_vars(lua: &Lua, vars: &Variables) -> LuaResult<()> {
  let values = lua.create_table()?;
  for (name, value) in vars.iter() {
    values.set(name, value)?;
  }

  let proxy = lua.create_table()?;
  let mt = lua.create_table()?;
  mt.set("__index", values)?;
  mt.set(
    "__newindex",
    lua.create_function(|_, (_, key, _): (LuaValue, LuaValue, LuaValue)| -> LuaResult<()> {
      Err(LuaError::external(format!(
        "vars is read-only (tried to assign '{}')",
        key.to_string().unwrap_or_default()
      )))
    })?,
  )?;
  proxy.set_metatable(Some(mt))?;

  lua.globals().set("vars", proxy)
}
