//! Scaffold a starter configuration for `--generate`.
//!
//! Writes a `cogfile.lua` that dispatches to one script per vendor, the
//! (empty) vendor scripts, and optionally a plugin module definition file.
//! No script is evaluated.

mod templates;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::DEFAULT_CONFIG;
use crate::generator::{EmitError, OutputFile, write_outputs};
use crate::options::OptionSet;

pub use templates::{COGFILE_TEMPLATE, MAX_PLUGIN_DEF_TEMPLATE};

/// Errors that can occur while writing the template.
#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("template mode needs a module name")]
  MissingName,

  #[error(transparent)]
  Write(#[from] EmitError),
}

/// Files written for template mode.
pub fn template_files(name: &str, options: &OptionSet) -> Vec<OutputFile> {
  let vs_script = if options.vs2022 {
    "cogfile.vs2022.lua"
  } else {
    "cogfile.vs2019.lua"
  };

  let mut files = vec![
    OutputFile::new(DEFAULT_CONFIG, COGFILE_TEMPLATE.replace("{vs_script}", vs_script)),
    OutputFile::new("cogfile.xcode.lua", ""),
    OutputFile::new("cogfile.linux.lua", ""),
    OutputFile::new(vs_script, ""),
  ];
  if let Some(ext) = &options.max_plugin {
    files.push(OutputFile::new(
      format!("{}.def", name),
      MAX_PLUGIN_DEF_TEMPLATE.replace("{name}", name).replace("{ext}", ext),
    ));
  }
  files
}

/// Write the template set into `out_dir`.
pub fn generate_template(out_dir: &Path, options: &OptionSet) -> Result<Vec<PathBuf>, TemplateError> {
  let name = options
    .generate
    .as_deref()
    .filter(|n| !n.is_empty())
    .ok_or(TemplateError::MissingName)?;
  let written = write_outputs(out_dir, &template_files(name, options))?;
  info!(dir = %out_dir.display(), files = written.len(), "template written");
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn generate(name: &str) -> OptionSet {
    OptionSet {
      generate: Some(name.to_string()),
      ..OptionSet::default()
    }
  }

  #[test]
  fn writes_dispatch_and_vendor_scripts() {
    let temp = TempDir::new().unwrap();
    generate_template(temp.path(), &generate("cog")).unwrap();

    let cogfile = fs::read_to_string(temp.path().join("cogfile.lua")).unwrap();
    assert!(cogfile.starts_with("if platform.is'apple'then\n  require'cogfile.xcode.lua'\n"));
    assert!(cogfile.contains("require'cogfile.vs2019.lua'"));
    for script in ["cogfile.xcode.lua", "cogfile.linux.lua", "cogfile.vs2019.lua"] {
      assert_eq!(fs::read_to_string(temp.path().join(script)).unwrap(), "");
    }
    assert!(!temp.path().join("cog.def").exists());
  }

  #[test]
  fn vs2022_script_name() {
    let options = OptionSet {
      vs2022: true,
      ..generate("cog")
    };
    let files = template_files("cog", &options);
    assert!(files.iter().any(|f| f.path == Path::new("cogfile.vs2022.lua")));
    assert!(files[0].contents.contains("require'cogfile.vs2022.lua'"));
  }

  #[test]
  fn max_plugin_writes_def() {
    let temp = TempDir::new().unwrap();
    let options = OptionSet {
      max_plugin: Some("dlu".to_string()),
      ..generate("MyPlugin")
    };
    generate_template(temp.path(), &options).unwrap();
    let def = fs::read_to_string(temp.path().join("MyPlugin.def")).unwrap();
    assert_eq!(
      def,
      "LIBRARY MyPlugin.dlu\nEXPORTS\n  LibDescription   @1\n  LibNumberClasses @2\n  LibClassDesc     @3\n  LibVersion       @4\n"
    );
  }

  #[test]
  fn empty_name_is_rejected() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
      generate_template(temp.path(), &generate("")),
      Err(TemplateError::MissingName)
    ));
  }
}
