//! The generation pipeline.
//!
//! One pass per sub-platform: evaluate the script in a fresh sandbox,
//! resolve file sets, emit the primary backend's files and write them. A
//! failing pass is reported and the remaining passes still run.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::discovery::{DiscoveryError, resolve_workspace};
use crate::eval::{EvalError, config_dir, evaluate};
use crate::generator::{EmitContext, EmitError, Generator, OutputFile, write_outputs, xcode};
use crate::model::BuildKind;
use crate::options::{Backend, OptionSet, SubPlatform};
use crate::template::{TemplateError, generate_template};
use crate::util::path::{relative_path, to_slash};

/// Errors that can occur during a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("{} not found!", path.display())]
  ConfigNotFound { path: PathBuf },

  #[error("configuration script {} is empty or unreadable", path.display())]
  SourceNotFound { path: PathBuf },

  #[error("no backend selected")]
  NoBackend,

  #[error("failed to create output directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to clean {}: {source}", path.display())]
  Clean { path: PathBuf, source: std::io::Error },

  #[error(transparent)]
  Eval(#[from] EvalError),

  #[error(transparent)]
  Discovery(#[from] DiscoveryError),

  #[error(transparent)]
  Emit(#[from] EmitError),

  #[error(transparent)]
  Template(#[from] TemplateError),
}

/// Result of a successful generation run.
#[derive(Debug, Default)]
pub struct GenerateReport {
  /// Workspace name, when any pass produced one.
  pub workspace: Option<String>,
  /// Backend the files were emitted for.
  pub backend: Option<Backend>,
  /// Passes that ran (`None` for the single pass of non-xcode backends).
  pub passes: Vec<Option<SubPlatform>>,
  /// Every file written or left unchanged.
  pub written: Vec<PathBuf>,
}

/// Generate project files for `script` into `options.output`.
///
/// In template mode the script is not read and the starter set is written
/// instead.
pub fn generate(script: &Path, options: &OptionSet) -> Result<GenerateReport, GenerateError> {
  if options.generate.is_some() {
    return template(options);
  }

  if !script.is_file() {
    return Err(GenerateError::ConfigNotFound {
      path: script.to_path_buf(),
    });
  }
  match fs::read_to_string(script) {
    Ok(text) if !text.trim().is_empty() => {}
    _ => {
      return Err(GenerateError::SourceNotFound {
        path: script.to_path_buf(),
      });
    }
  }

  let Some(backend) = options.backend() else {
    return Err(GenerateError::NoBackend);
  };
  for ignored in options.active_backends().iter().skip(1) {
    warn!(backend = ignored.as_str(), primary = backend.as_str(), "ignoring lower-priority backend");
  }

  let out = create_output_dir(&options.output)?;
  let root = config_dir(script);
  let root_rel = to_slash(&relative_path(&out, &root));
  let root_rel = if root_rel.is_empty() { ".".to_string() } else { root_rel };

  let passes: Vec<Option<SubPlatform>> = if backend == Backend::Xcode {
    options.sub_platforms().into_iter().map(Some).collect()
  } else {
    vec![None]
  };

  let generator = Generator::for_backend(backend);
  let mut report = GenerateReport {
    backend: Some(backend),
    ..GenerateReport::default()
  };
  let mut xcode_members: Vec<(SubPlatform, Vec<(String, BuildKind)>)> = Vec::new();
  let mut first_error = None;

  for pass in passes {
    let ctx = EmitContext {
      options,
      sub_platform: pass,
      root_rel: root_rel.clone(),
    };
    match run_pass(script, &root, &out, generator, &ctx) {
      Ok(Some((name, written, members))) => {
        info!(workspace = %name, pass = ?pass, files = written.len(), "pass complete");
        if let (Some(sub), Some(members)) = (pass, members) {
          xcode_members.push((sub, members));
        }
        report.workspace = Some(name);
        report.written.extend(written);
        report.passes.push(pass);
      }
      Ok(None) => report.passes.push(pass),
      Err(err) => {
        error!(pass = ?pass, error = %err, "pass failed");
        if first_error.is_none() {
          first_error = Some(err);
        }
      }
    }
  }

  if let (Some(name), false) = (&report.workspace, xcode_members.is_empty()) {
    let file = xcode::workspace_file(name, &xcode_members);
    report.written.extend(write_outputs(&out, &[file])?);
  }

  match first_error {
    Some(err) => Err(err),
    None => Ok(report),
  }
}

type PassOutput = (String, Vec<PathBuf>, Option<Vec<(String, BuildKind)>>);

fn run_pass(
  script: &Path,
  root: &Path,
  out: &Path,
  generator: Generator,
  ctx: &EmitContext,
) -> Result<Option<PassOutput>, GenerateError> {
  let Some(workspace) = evaluate(script, ctx.options, ctx.sub_platform)? else {
    return Ok(None);
  };
  let resolved = resolve_workspace(workspace, root)?;
  let files: Vec<OutputFile> = generator.emit(&resolved, ctx)?;
  let written = write_outputs(out, &files)?;
  let members = ctx.sub_platform.map(|sub| xcode::pass_members(&resolved, sub));
  Ok(Some((resolved.name, written, members)))
}

/// Write the template set for `--generate`.
pub fn template(options: &OptionSet) -> Result<GenerateReport, GenerateError> {
  let out = create_output_dir(&options.output)?;
  let written = generate_template(&out, options)?;
  Ok(GenerateReport {
    workspace: options.generate.clone(),
    written,
    ..GenerateReport::default()
  })
}

/// Delete the output directory. A missing directory is not an error.
pub fn clean(out: &Path) -> Result<bool, GenerateError> {
  if !out.exists() {
    return Ok(false);
  }
  fs::remove_dir_all(out).map_err(|source| GenerateError::Clean {
    path: out.to_path_buf(),
    source,
  })?;
  info!(dir = %out.display(), "cleaned output directory");
  Ok(true)
}

fn create_output_dir(out: &Path) -> Result<PathBuf, GenerateError> {
  fs::create_dir_all(out).map_err(|source| GenerateError::CreateDir {
    path: out.to_path_buf(),
    source,
  })?;
  dunce::canonicalize(out).map_err(|source| GenerateError::CreateDir {
    path: out.to_path_buf(),
    source,
  })
}
