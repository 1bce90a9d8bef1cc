//! Workspace and project model produced by the Lua builder API.
//!
//! A [`Workspace`] owns its projects keyed by label. Projects are plain
//! records: every field the builder can set is present, and each backend
//! picks the ones it understands.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default preprocessor definitions for debug configurations.
pub const DEFAULT_DEFINES_DBG: &str = "_DEBUG,DEBUG";

/// Default preprocessor definitions for release configurations.
pub const DEFAULT_DEFINES_REL: &str = "NDEBUG,RELEASE";

/// Definition prepended when a project is compiled as unity units.
pub const UNITY_DEFINE: &str = "__compiling_unity__=1";

/// An ordered list of entries stored as a comma-joined string in Lua.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommaList(Vec<String>);

impl CommaList {
  /// Split a comma-joined value, trimming whitespace and dropping empty entries.
  pub fn parse(value: &str) -> Self {
    Self(
      value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  /// Append the entries of another comma-joined value.
  pub fn append(&mut self, value: &str) {
    self.0.extend(Self::parse(value).0);
  }

  pub fn push(&mut self, entry: impl Into<String>) {
    self.0.push(entry.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }

  pub fn contains(&self, entry: &str) -> bool {
    self.0.iter().any(|e| e.eq_ignore_ascii_case(entry))
  }

  pub fn entries(&self) -> &[String] {
    &self.0
  }

  pub fn joined(&self) -> String {
    self.0.join(",")
  }
}

impl<S: Into<String>> FromIterator<S> for CommaList {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self(iter.into_iter().map(Into::into).collect())
  }
}

/// What a project builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildKind {
  Application,
  Console,
  Static,
  Shared,
  Framework,
  Bundle,
}

impl BuildKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Application => "application",
      Self::Console => "console",
      Self::Static => "static",
      Self::Shared => "shared",
      Self::Framework => "framework",
      Self::Bundle => "bundle",
    }
  }

  /// Produces an executable.
  pub fn is_executable(&self) -> bool {
    matches!(self, Self::Application | Self::Console)
  }

  /// Produces something other projects link against.
  pub fn is_library(&self) -> bool {
    matches!(self, Self::Static | Self::Shared | Self::Framework)
  }
}

impl FromStr for BuildKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "application" | "app" => Ok(Self::Application),
      "console" | "tool" => Ok(Self::Console),
      "static" | "archive" => Ok(Self::Static),
      "shared" | "dynamic" => Ok(Self::Shared),
      "framework" => Ok(Self::Framework),
      "bundle" | "plugin" => Ok(Self::Bundle),
      other => Err(format!(
        "unknown target kind '{}' (expected application, console, static, shared, framework or bundle)",
        other
      )),
    }
  }
}

impl fmt::Display for BuildKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Settings only the Xcode backend consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleSettings {
  pub hardened_runtime: bool,
  pub arc: bool,
  pub universal: bool,
  pub apple_silicon: bool,
  pub enable_jit: bool,
  pub disable_library_validation: bool,
  pub no_embed_and_sign: bool,
  pub deployment: Option<String>,
  pub sdk_version: Option<String>,
  pub bundle_id: Option<String>,
  pub team: Option<String>,
  pub organization: Option<String>,
  pub os_target: Option<String>,
  pub framework_paths: CommaList,
  pub export_headers: CommaList,
  pub export_refs: CommaList,
  pub embed_and_sign: CommaList,
  pub load_all: CommaList,
}

impl Default for AppleSettings {
  fn default() -> Self {
    Self {
      hardened_runtime: false,
      arc: true,
      universal: false,
      apple_silicon: false,
      enable_jit: false,
      disable_library_validation: false,
      no_embed_and_sign: false,
      deployment: None,
      sdk_version: None,
      bundle_id: None,
      team: None,
      organization: None,
      os_target: None,
      framework_paths: CommaList::default(),
      export_headers: CommaList::default(),
      export_refs: CommaList::default(),
      embed_and_sign: CommaList::default(),
      load_all: CommaList::default(),
    }
  }
}

/// Settings only the Visual Studio backend consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MicrosoftSettings {
  pub winsdk: Option<String>,
  pub toolchain: Option<String>,
  /// Module definition (`.def`) file.
  pub def: Option<String>,
  pub dependencies: CommaList,
}

/// One project declared with `workspace:new(label)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
  pub label: String,
  pub build: Option<BuildKind>,
  pub install_script: Option<String>,
  pub defines_dbg: CommaList,
  pub defines_rel: CommaList,
  pub link_with: CommaList,
  pub libs: CommaList,
  pub include_paths: CommaList,
  pub src_paths: CommaList,
  pub res_paths: CommaList,
  pub library_paths: CommaList,
  pub ignore: CommaList,
  pub skip_unity: CommaList,
  pub disable: CommaList,
  pub prefix_header: Option<String>,
  pub language: Option<String>,
  pub c_language: Option<String>,
  pub unity: bool,
  pub apple: AppleSettings,
  pub microsoft: MicrosoftSettings,
}

impl Project {
  /// An empty project carrying the default define lists.
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      build: None,
      install_script: None,
      defines_dbg: CommaList::parse(DEFAULT_DEFINES_DBG),
      defines_rel: CommaList::parse(DEFAULT_DEFINES_REL),
      link_with: CommaList::default(),
      libs: CommaList::default(),
      include_paths: CommaList::default(),
      src_paths: CommaList::default(),
      res_paths: CommaList::default(),
      library_paths: CommaList::default(),
      ignore: CommaList::default(),
      skip_unity: CommaList::default(),
      disable: CommaList::default(),
      prefix_header: None,
      language: None,
      c_language: None,
      unity: false,
      apple: AppleSettings::default(),
      microsoft: MicrosoftSettings::default(),
    }
  }

  /// Project kind, defaulting to a console program.
  pub fn build_kind(&self) -> BuildKind {
    self.build.unwrap_or(BuildKind::Console)
  }

  /// Whether the project should be compiled as unity units this run.
  pub fn unity_enabled(&self, unity_requested: bool) -> bool {
    unity_requested && self.unity && !self.disable.contains("unity")
  }

  /// ARC is on unless explicitly disabled.
  pub fn arc_enabled(&self) -> bool {
    self.apple.arc && !self.disable.contains("arc")
  }

  /// Upper-case label used in Ninja rule and variable names.
  pub fn rule_name(&self) -> String {
    self
      .label
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
      .collect()
  }
}

/// Root container produced by `workspace.new(name)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
  pub name: String,
  /// Projects keyed by label; iteration is lexicographic.
  pub projects: BTreeMap<String, Project>,
}

impl Workspace {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      projects: BTreeMap::new(),
    }
  }

  pub fn project(&self, label: &str) -> Option<&Project> {
    self.projects.get(label)
  }

  pub fn insert(&mut self, project: Project) {
    self.projects.insert(project.label.clone(), project);
  }
}

/// Parse a boolean field the way scripts spell them.
pub fn parse_bool(value: &str) -> Option<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "true" | "yes" | "1" | "on" => Some(true),
    "false" | "no" | "0" | "off" => Some(false),
    _ => None,
  }
}
