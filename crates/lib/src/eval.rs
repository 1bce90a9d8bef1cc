//! Configuration script evaluation.
//!
//! Each pass gets its own sandbox: the script runs from scratch with the
//! pass's `__target` and `vars`, and the workspace it built is converted into
//! the [`Workspace`] model.

use std::path::{Path, PathBuf};

use mlua::prelude::*;
use tracing::{debug, warn};

use crate::consts::WORKSPACE_GLOBAL;
use crate::lua::extract::extract_workspace;
use crate::lua::globals::SAVED_WORKSPACE_KEY;
use crate::lua::runtime;
use crate::model::Workspace;
use crate::options::{OptionSet, SubPlatform};

/// Errors that can occur during script evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
  /// Lua evaluation error (syntax, runtime, sandbox violation).
  #[error("lua error: {0}")]
  Lua(#[from] LuaError),

  #[error("invalid workspace: {0}")]
  InvalidWorkspace(String),

  #[error("project '{project}': invalid {field}: {message}")]
  InvalidField {
    project: String,
    field: String,
    message: String,
  },
}

/// Directory relative script paths resolve against.
pub fn config_dir(script: &Path) -> PathBuf {
  let parent = match script.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => dir,
    _ => Path::new("."),
  };
  dunce::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf())
}

/// Evaluate `script` for one pass.
///
/// Returns `None` when the script neither called `platform.save` nor
/// assigned the `wsp` global.
pub fn evaluate(
  script: &Path,
  options: &OptionSet,
  sub_platform: Option<SubPlatform>,
) -> Result<Option<Workspace>, EvalError> {
  let dir = config_dir(script);
  debug!(script = %script.display(), dir = %dir.display(), pass = ?sub_platform, "evaluating");

  let lua = runtime::create_runtime(options, sub_platform, &dir)?;
  runtime::exec_script(&lua, script)?;

  let saved: Option<LuaTable> = lua.named_registry_value(SAVED_WORKSPACE_KEY)?;
  let table = match saved {
    Some(table) => Some(table),
    None => lua.globals().get::<Option<LuaTable>>(WORKSPACE_GLOBAL)?,
  };

  let Some(table) = table else {
    warn!(script = %script.display(), "script did not save a workspace; nothing to generate");
    return Ok(None);
  };

  let workspace = extract_workspace(&table, &options.variables(sub_platform))?;
  debug!(workspace = %workspace.name, projects = workspace.projects.len(), "workspace extracted");
  Ok(Some(workspace))
}
