//! Backend emitters.
//!
//! Every emitter is a pure function from a [`ResolvedWorkspace`] and an
//! [`EmitContext`] to a list of [`OutputFile`]s; nothing touches the disk
//! until [`write::write_outputs`] persists the whole list.

mod gradle;
mod msvc;
mod ninja;
mod qmake;
pub mod unity;
pub mod write;
pub mod xcode;

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::discovery::{ResolvedProject, ResolvedWorkspace};
use crate::model::{BuildKind, Project, UNITY_DEFINE};
use crate::options::{Backend, CStandard, CppStandard, OptionSet, SubPlatform};
use crate::util::path::prefixed;

pub use write::write_outputs;

#[derive(Debug, Error)]
pub enum EmitError {
  #[error("project '{project}': invalid {setting} '{value}'")]
  InvalidSetting {
    project: String,
    setting: &'static str,
    value: String,
  },

  #[error("project '{project}': {kind} targets are not supported on {platform}")]
  UnsupportedKind {
    project: String,
    kind: BuildKind,
    platform: &'static str,
  },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },
}

/// A generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
  pub path: PathBuf,
  pub contents: String,
}

impl OutputFile {
  pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      contents: contents.into(),
    }
  }
}

/// Everything an emitter needs besides the workspace.
#[derive(Debug, Clone)]
pub struct EmitContext<'a> {
  pub options: &'a OptionSet,
  pub sub_platform: Option<SubPlatform>,
  /// Configuration directory as seen from the output directory.
  pub root_rel: String,
}

impl EmitContext<'_> {
  /// Configuration directory as seen from `depth` levels below the output
  /// directory.
  pub fn root_at(&self, depth: usize) -> String {
    let mut prefix = "../".repeat(depth);
    if self.root_rel == "." {
      prefix.pop();
      if prefix.is_empty() {
        prefix.push('.');
      }
      return prefix;
    }
    if crate::util::path::is_absolute_str(&self.root_rel) {
      return self.root_rel.clone();
    }
    prefix.push_str(&self.root_rel);
    prefix
  }

  /// A script-relative path as seen from `depth` levels below the output
  /// directory.
  pub fn path_at(&self, depth: usize, path: &str) -> String {
    prefixed(&self.root_at(depth), path)
  }

  /// C++ standard for `project`, falling back to the run's option.
  pub fn cpp_standard(&self, project: &Project) -> Result<CppStandard, EmitError> {
    match &project.language {
      Some(value) => value.parse().map_err(|_| EmitError::InvalidSetting {
        project: project.label.clone(),
        setting: "language",
        value: value.clone(),
      }),
      None => Ok(self.options.language),
    }
  }

  /// C standard for `project`, falling back to the run's option.
  pub fn c_standard(&self, project: &Project) -> Result<CStandard, EmitError> {
    match &project.c_language {
      Some(value) => value.parse().map_err(|_| EmitError::InvalidSetting {
        project: project.label.clone(),
        setting: "c_language",
        value: value.clone(),
      }),
      None => Ok(self.options.c_language),
    }
  }

  /// Whether `project` is compiled as unity units this run. qmake and
  /// gradle never build unity units.
  pub fn unity(&self, project: &Project) -> bool {
    let supported = matches!(
      self.options.backend(),
      Some(Backend::Ninja | Backend::Wasm | Backend::VisualStudio | Backend::Xcode)
    );
    supported && project.unity_enabled(self.options.unity)
  }

  /// Preprocessor definitions for one configuration. Entries starting with
  /// `#` are commented out.
  pub fn defines(&self, project: &Project, release: bool) -> Vec<String> {
    let list = if release { &project.defines_rel } else { &project.defines_dbg };
    let unity = self.unity(project).then(|| UNITY_DEFINE.to_string());
    unity
      .into_iter()
      .chain(list.iter().filter(|d| !d.starts_with('#')).map(str::to_string))
      .collect()
  }
}

/// Output format selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
  Ninja,
  VisualStudio,
  Xcode,
  Qmake,
  Gradle,
}

impl Generator {
  pub fn for_backend(backend: Backend) -> Self {
    match backend {
      Backend::Wasm | Backend::Ninja => Self::Ninja,
      Backend::VisualStudio => Self::VisualStudio,
      Backend::Xcode => Self::Xcode,
      Backend::Qmake => Self::Qmake,
      Backend::Ndk => Self::Gradle,
    }
  }

  pub fn emit(&self, workspace: &ResolvedWorkspace, ctx: &EmitContext) -> Result<Vec<OutputFile>, EmitError> {
    match self {
      Self::Ninja => ninja::emit(workspace, ctx),
      Self::VisualStudio => msvc::emit(workspace, ctx),
      Self::Xcode => xcode::emit(workspace, ctx),
      Self::Qmake => qmake::emit(workspace, ctx),
      Self::Gradle => gradle::emit(workspace, ctx),
    }
  }
}

/// Labels in `project.link_with` that name sibling projects.
pub(crate) fn sibling_links<'a>(workspace: &'a ResolvedWorkspace, project: &Project) -> Vec<&'a ResolvedProject> {
  project
    .link_with
    .iter()
    .chain(project.microsoft.dependencies.iter())
    .filter(|name| *name != project.label)
    .filter_map(|name| workspace.project(name))
    .fold(Vec::new(), |mut acc, p| {
      if !acc.iter().any(|seen: &&ResolvedProject| seen.project.label == p.project.label) {
        acc.push(p);
      }
      acc
    })
}

/// Entries of `project.link_with` that are not sibling projects.
pub(crate) fn external_links<'a>(workspace: &ResolvedWorkspace, project: &'a Project) -> Vec<&'a str> {
  project
    .link_with
    .iter()
    .filter(|name| workspace.project(name).is_none())
    .collect()
}

/// Escape text for XML attribute and element content.
pub(crate) fn xml_escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      _ => out.push(c),
    }
  }
  out
}

/// Log settings a backend does not consume.
pub(crate) fn log_unused(project: &Project, backend: &str, unused: &[(&str, bool)]) {
  for (setting, present) in unused {
    if *present {
      debug!(project = %project.label, backend, setting, "setting ignored by this backend");
    }
  }
}


#[cfg(test)]
mod tests {
  use super::testutil::*;
  use super::*;

  #[test]
  fn root_at_depths() {
    let options = OptionSet::default();
    let mut ctx = ctx(&options);
    assert_eq!(ctx.root_at(0), "..");
    assert_eq!(ctx.root_at(2), "../../..");
    ctx.root_rel = ".".into();
    assert_eq!(ctx.root_at(0), ".");
    assert_eq!(ctx.root_at(1), "..");
    assert_eq!(ctx.path_at(1, "src/a.c"), "../src/a.c");
  }

  #[test]
  fn unity_define_is_prepended() {
    let options = OptionSet {
      ninja: true,
      unity: true,
      ..OptionSet::default()
    };
    let ctx = ctx(&options);
    let mut project = Project::new("app");
    project.unity = true;
    project.defines_dbg.append("#DISABLED,EXTRA");
    assert_eq!(
      ctx.defines(&project, false),
      vec!["__compiling_unity__=1", "_DEBUG", "DEBUG", "EXTRA"]
    );
    assert_eq!(ctx.defines(&project, true)[0], "__compiling_unity__=1");
  }

  #[test]
  fn unity_needs_a_unity_backend() {
    let options = OptionSet {
      qmake: true,
      unity: true,
      ..OptionSet::default()
    };
    let mut project = Project::new("app");
    project.unity = true;
    assert!(!ctx(&options).unity(&project));
  }

  #[test]
  fn project_language_overrides_option() {
    let options = OptionSet::default();
    let ctx = ctx(&options);
    let mut project = Project::new("app");
    assert_eq!(ctx.cpp_standard(&project).unwrap(), CppStandard::Cpp20);
    project.language = Some("c++17".into());
    assert_eq!(ctx.cpp_standard(&project).unwrap(), CppStandard::Cpp17);
    project.language = Some("fortran".into());
    assert!(ctx.cpp_standard(&project).is_err());
  }

  #[test]
  fn xml_escape_special_characters() {
    assert_eq!(xml_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    assert_eq!(xml_escape("plain"), "plain");
  }

  #[test]
  fn links_split_into_siblings_and_externals() {
    let mut app = project("app", BuildKind::Application, &[]);
    app.project.link_with.append("engine,pthread,engine");
    let ws = workspace("w", vec![app.clone(), project("engine", BuildKind::Static, &[])]);
    let siblings: Vec<_> = sibling_links(&ws, &app.project)
      .into_iter()
      .map(|p| p.project.label.as_str())
      .collect();
    assert_eq!(siblings, vec!["engine"]);
    assert_eq!(external_links(&ws, &app.project), vec!["pthread"]);
  }
}
