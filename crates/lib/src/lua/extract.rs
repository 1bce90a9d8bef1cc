//! Conversion of the Lua workspace table into [`Workspace`].

use mlua::prelude::*;
use tracing::debug;

use crate::eval::EvalError;
use crate::model::{BuildKind, CommaList, Project, Workspace, parse_bool};
use crate::options::Variables;

/// Read a workspace table built by the prelude.
///
/// `${NAME}` references in the workspace name, project labels and every field
/// value are expanded with `vars`.
pub fn extract_workspace(table: &LuaTable, vars: &Variables) -> Result<Workspace, EvalError> {
  let name = match table.get::<LuaValue>("m_sName")? {
    LuaValue::String(s) => vars.expand(&s.to_string_lossy()),
    _ => return Err(EvalError::InvalidWorkspace("workspace has no name".into())),
  };
  let mut workspace = Workspace::new(name);

  let projects: LuaTable = match table.get::<LuaValue>("m_tProjects")? {
    LuaValue::Table(t) => t,
    _ => return Err(EvalError::InvalidWorkspace("workspace has no project table".into())),
  };

  for pair in projects.pairs::<String, LuaTable>() {
    let (label, fields) = pair?;
    let label = vars.expand(&label);
    let mut project = Project::new(label.clone());
    for field in fields.pairs::<String, LuaValue>() {
      let (key, value) = field?;
      let Some(raw) = field_value(&value)? else {
        debug!(project = %label, field = %key, "ignoring non-scalar field");
        continue;
      };
      if let Err(message) = apply_field(&mut project, &key, &vars.expand(&raw)) {
        return Err(EvalError::InvalidField {
          project: label,
          field: key,
          message,
        });
      }
    }
    workspace.insert(project);
  }

  Ok(workspace)
}

/// Flatten a Lua value into the string form the builder stores.
fn field_value(value: &LuaValue) -> LuaResult<Option<String>> {
  Ok(match value {
    LuaValue::String(s) => Some(s.to_string_lossy()),
    LuaValue::Boolean(b) => Some(b.to_string()),
    LuaValue::Integer(i) => Some(i.to_string()),
    LuaValue::Number(n) => Some(number_text(*n)),
    LuaValue::Table(t) => {
      let mut parts = Vec::new();
      for entry in t.clone().sequence_values::<LuaValue>() {
        if let Some(part) = field_value(&entry?)? {
          parts.push(part);
        }
      }
      Some(parts.join(","))
    }
    _ => None,
  })
}

/// Format a float the way Lua's `tostring` does (`%.14g`, with `.0` kept on
/// integral values).
fn number_text(n: f64) -> String {
  if n.is_nan() {
    return "nan".to_string();
  }
  if n.is_infinite() {
    return if n < 0.0 { "-inf" } else { "inf" }.to_string();
  }
  let sci = format!("{:.13e}", n);
  let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
  let exp: i32 = exp.parse().unwrap_or(0);
  let text = if !(-4..14).contains(&exp) {
    format!(
      "{}e{}{:02}",
      trim_fraction(mantissa),
      if exp < 0 { '-' } else { '+' },
      exp.abs()
    )
  } else {
    let decimals = (13 - exp).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, n))
  };
  if text.chars().all(|c| c.is_ascii_digit() || c == '-') {
    format!("{}.0", text)
  } else {
    text
  }
}

fn trim_fraction(text: &str) -> String {
  if text.contains('.') {
    text.trim_end_matches('0').trim_end_matches('.').to_string()
  } else {
    text.to_string()
  }
}

fn bool_field(value: &str) -> Result<bool, String> {
  parse_bool(value).ok_or_else(|| format!("expected a boolean, got '{}'", value))
}

fn text(value: &str) -> Option<String> {
  let trimmed = value.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Store one `m_*` field on `project`.
fn apply_field(project: &mut Project, key: &str, value: &str) -> Result<(), String> {
  let list = |target: &mut CommaList| target.append(value);
  match key {
    "label" => {}
    "m_build" => project.build = Some(value.parse::<BuildKind>()?),
    "m_installScript" => project.install_script = text(value),
    "m_definesDbg" => list(&mut project.defines_dbg),
    "m_definesRel" => list(&mut project.defines_rel),
    "m_linkWith" => list(&mut project.link_with),
    "m_libs" => list(&mut project.libs),
    "m_includePaths" => list(&mut project.include_paths),
    "m_srcPaths" => list(&mut project.src_paths),
    "m_resPaths" => list(&mut project.res_paths),
    "m_libraryPaths" => list(&mut project.library_paths),
    "m_ignore" => list(&mut project.ignore),
    "m_skipUnity" => list(&mut project.skip_unity),
    "m_disableOpts" => list(&mut project.disable),
    "m_prefixHeader" => project.prefix_header = text(value),
    "m_language" => project.language = text(value),
    "m_clanguage" => project.c_language = text(value),
    "m_bUnity" => project.unity = bool_field(value)?,

    "m_hardenedRuntime" => project.apple.hardened_runtime = bool_field(value)?,
    "m_arcEnabled" => project.apple.arc = bool_field(value)?,
    "m_universal" => project.apple.universal = bool_field(value)?,
    "m_appleSilicon" => project.apple.apple_silicon = bool_field(value)?,
    "m_enableJIT" => project.apple.enable_jit = bool_field(value)?,
    "m_disableLibValidation" => project.apple.disable_library_validation = bool_field(value)?,
    "m_noEmbedAndSign" => project.apple.no_embed_and_sign = bool_field(value)?,
    "m_deployTo" => project.apple.deployment = text(value),
    "m_sdkVersion" => project.apple.sdk_version = text(value),
    "m_bundleId" => project.apple.bundle_id = text(value),
    "m_teamName" => project.apple.team = text(value),
    "m_orgName" => project.apple.organization = text(value),
    "m_osTarget" => project.apple.os_target = text(value),
    "m_frameworkPaths" => list(&mut project.apple.framework_paths),
    "m_exportHeaders" => list(&mut project.apple.export_headers),
    "m_exportRefs" => list(&mut project.apple.export_refs),
    "m_embedAndSign" => list(&mut project.apple.embed_and_sign),
    "m_loadAllSymbols" => list(&mut project.apple.load_all),

    "m_winsdk" => project.microsoft.winsdk = text(value),
    "m_toolchain" => project.microsoft.toolchain = text(value),
    "m_def" => project.microsoft.def = text(value),
    "m_dependencies" => list(&mut project.microsoft.dependencies),

    other => debug!(project = %project.label, field = other, "unknown project field"),
  }
  Ok(())
}
