//! Option resolution for a generation run.
//!
//! The [`OptionSet`] is built from compiled-in host defaults, the optional
//! user settings file, and then the command-line tokens (see [`args`]). Once
//! generation starts it is only read: it becomes the `options` table inside
//! the sandbox, selects the backend emitter, and supplies the `${...}`
//! substitution values.

mod args;
mod vars;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::consts::{DEFAULT_DEPLOYMENT, DEFAULT_OUTPUT_DIR, DEFAULT_UNITY_UNITS};
use crate::platform::{Os, Vendor};
use crate::settings::Settings;

pub use args::{ArgAction, parse_token, usage};
pub use vars::Variables;

/// Errors produced while resolving options.
#[derive(Debug, Error)]
pub enum OptionsError {
  #[error("flag '{flag}' requires a value")]
  MissingValue { flag: String },

  #[error("unknown C++ standard '{0}' (expected c++11, c++14, c++17, c++20 or c++23)")]
  UnknownLanguage(String),

  #[error("unknown C standard '{0}' (expected c11, c17 or c23)")]
  UnknownCLanguage(String),
}

/// Output backends in priority order.
///
/// When several backend flags are set, the first one in this order wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Backend {
  Wasm,
  Qmake,
  Xcode,
  VisualStudio,
  Ninja,
  Ndk,
}

impl Backend {
  pub const PRIORITY: [Backend; 6] = [
    Backend::Wasm,
    Backend::Qmake,
    Backend::Xcode,
    Backend::VisualStudio,
    Backend::Ninja,
    Backend::Ndk,
  ];

  /// Name reported by `platform.name()`.
  pub fn platform_name(&self) -> &'static str {
    match self {
      Self::Wasm => "wasm",
      Self::Qmake => "qmake",
      Self::Xcode => "macos",
      Self::VisualStudio => "win64",
      Self::Ninja => "linux",
      Self::Ndk => "android",
    }
  }

  /// Value substituted for `${PLATFORM}`.
  pub fn substitution(&self) -> &'static str {
    match self {
      Self::Xcode => "macos",
      Self::Ndk => "android",
      Self::Wasm | Self::Ninja => "linux",
      Self::VisualStudio => "windows",
      Self::Qmake => "qmake",
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Wasm => "wasm",
      Self::Qmake => "qmake",
      Self::Xcode => "xcode",
      Self::VisualStudio => "vs",
      Self::Ninja => "ninja",
      Self::Ndk => "ndk",
    }
  }
}

impl fmt::Display for Backend {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Apple sub-platform targeted by one Xcode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubPlatform {
  Macos,
  Ios,
}

impl SubPlatform {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Macos => "macos",
      Self::Ios => "ios",
    }
  }

  /// Xcode `SDKROOT` value.
  pub fn sdk_root(&self) -> &'static str {
    match self {
      Self::Macos => "macosx",
      Self::Ios => "iphoneos",
    }
  }

  /// Build setting carrying the deployment target.
  pub fn deployment_setting(&self) -> &'static str {
    match self {
      Self::Macos => "MACOSX_DEPLOYMENT_TARGET",
      Self::Ios => "IPHONEOS_DEPLOYMENT_TARGET",
    }
  }
}

impl fmt::Display for SubPlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Xcode project format generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum XcodeVersion {
  V11,
  V12,
  V14,
  V15,
  V16,
}

impl XcodeVersion {
  /// `objectVersion` written at the top of `project.pbxproj`.
  pub fn object_version(&self) -> u32 {
    match self {
      Self::V11 => 52,
      Self::V12 => 54,
      Self::V14 => 56,
      Self::V15 => 60,
      Self::V16 => 77,
    }
  }

  pub fn compatibility(&self) -> &'static str {
    match self {
      Self::V11 => "Xcode 11.0",
      Self::V12 => "Xcode 12.0",
      Self::V14 => "Xcode 14.0",
      Self::V15 => "Xcode 15.0",
      Self::V16 => "Xcode 16.0",
    }
  }
}

/// C++ language standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CppStandard {
  Cpp11,
  Cpp14,
  Cpp17,
  #[default]
  Cpp20,
  Cpp23,
}

impl CppStandard {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Cpp11 => "c++11",
      Self::Cpp14 => "c++14",
      Self::Cpp17 => "c++17",
      Self::Cpp20 => "c++20",
      Self::Cpp23 => "c++23",
    }
  }

  /// MSVC `LanguageStandard` value.
  pub fn msvc(&self) -> &'static str {
    match self {
      Self::Cpp11 | Self::Cpp14 => "stdcpp14",
      Self::Cpp17 => "stdcpp17",
      Self::Cpp20 => "stdcpp20",
      Self::Cpp23 => "stdcpplatest",
    }
  }
}

impl FromStr for CppStandard {
  type Err = OptionsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_ascii_lowercase();
    let digits = lower
      .strip_prefix("c++")
      .or_else(|| lower.strip_prefix("cxx"))
      .or_else(|| lower.strip_prefix("cpp"))
      .or_else(|| lower.strip_prefix("gnu++"))
      .unwrap_or(&lower);
    match digits {
      "11" => Ok(Self::Cpp11),
      "14" => Ok(Self::Cpp14),
      "17" => Ok(Self::Cpp17),
      "20" => Ok(Self::Cpp20),
      "23" | "2b" => Ok(Self::Cpp23),
      _ => Err(OptionsError::UnknownLanguage(s.to_string())),
    }
  }
}

impl fmt::Display for CppStandard {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// C language standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CStandard {
  C11,
  #[default]
  C17,
  C23,
}

impl CStandard {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::C11 => "c11",
      Self::C17 => "c17",
      Self::C23 => "c23",
    }
  }

  /// MSVC `LanguageStandard_C` value.
  pub fn msvc(&self) -> &'static str {
    match self {
      Self::C11 => "stdc11",
      Self::C17 | Self::C23 => "stdc17",
    }
  }
}

impl FromStr for CStandard {
  type Err = OptionsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_ascii_lowercase();
    let digits = lower
      .strip_prefix("gnu")
      .or_else(|| lower.strip_prefix('c'))
      .unwrap_or(&lower);
    match digits {
      "11" => Ok(Self::C11),
      "17" | "18" => Ok(Self::C17),
      "23" | "2x" => Ok(Self::C23),
      _ => Err(OptionsError::UnknownCLanguage(s.to_string())),
    }
  }
}

impl fmt::Display for CStandard {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Every switch that influences a generation run.
///
/// All fields are always present regardless of host; backends read only the
/// ones they understand.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSet {
  pub xcode11: bool,
  pub xcode12: bool,
  pub xcode14: bool,
  pub xcode15: bool,
  pub xcode16: bool,
  pub vs2019: bool,
  pub vs2022: bool,
  pub vs_tools143: bool,
  pub emscripten: bool,
  pub qmake: bool,
  pub ninja: bool,
  pub gradle: bool,
  pub ndk: bool,
  pub os_mac: bool,
  pub os_iphone: bool,
  pub unity: bool,
  pub utf16: bool,
  /// Template mode; the value names the generated module.
  pub generate: Option<String>,
  /// Plugin extension for template mode (e.g. `dlu`).
  pub max_plugin: Option<String>,
  pub language: CppStandard,
  pub c_language: CStandard,
  /// Cross-compilation target triple.
  pub cross: Option<String>,
  pub output: PathBuf,
  pub unity_units: usize,
  pub deployment: String,
  /// Backend flags currently set came from host defaults, not the user.
  pub(crate) seeded: bool,
}

impl Default for OptionSet {
  fn default() -> Self {
    Self {
      xcode11: false,
      xcode12: false,
      xcode14: false,
      xcode15: false,
      xcode16: false,
      vs2019: false,
      vs2022: false,
      vs_tools143: false,
      emscripten: false,
      qmake: false,
      ninja: false,
      gradle: false,
      ndk: false,
      os_mac: false,
      os_iphone: false,
      unity: false,
      utf16: false,
      generate: None,
      max_plugin: None,
      language: CppStandard::default(),
      c_language: CStandard::default(),
      cross: None,
      output: PathBuf::from(DEFAULT_OUTPUT_DIR),
      unity_units: DEFAULT_UNITY_UNITS,
      deployment: DEFAULT_DEPLOYMENT.to_string(),
      seeded: false,
    }
  }
}

impl OptionSet {
  /// Options seeded with the backend native to the host this tool was built for.
  pub fn host_default() -> Self {
    Self::for_host(Os::current())
  }

  /// Options seeded for a specific host.
  pub fn for_host(host: Option<Os>) -> Self {
    let mut options = Self::default();
    match host {
      Some(Os::MacOs) => options.xcode12 = true,
      Some(Os::Windows) => {
        options.vs2022 = true;
        options.vs_tools143 = true;
      }
      Some(Os::Linux) => options.ninja = true,
      None => {}
    }
    options.seeded = options.any_backend();
    options
  }

  /// Apply values from the user settings file.
  pub fn apply_settings(&mut self, settings: &Settings) -> Result<(), OptionsError> {
    if let Some(output) = &settings.output {
      self.output = output.clone();
    }
    if let Some(language) = &settings.language {
      self.language = language.parse()?;
    }
    if let Some(c_language) = &settings.c_language {
      self.c_language = c_language.parse()?;
    }
    if let Some(units) = settings.unity_units {
      self.unity_units = units.max(1);
    }
    if let Some(deployment) = &settings.deployment {
      self.deployment = deployment.clone();
    }
    Ok(())
  }

  /// True when any backend flag is set.
  pub fn any_backend(&self) -> bool {
    !self.active_backends().is_empty()
  }

  pub fn is_xcode(&self) -> bool {
    self.xcode11 || self.xcode12 || self.xcode14 || self.xcode15 || self.xcode16
  }

  pub fn is_vs(&self) -> bool {
    self.vs2019 || self.vs2022
  }

  /// Clear every backend selection flag.
  pub fn clear_backends(&mut self) {
    self.xcode11 = false;
    self.xcode12 = false;
    self.xcode14 = false;
    self.xcode15 = false;
    self.xcode16 = false;
    self.vs2019 = false;
    self.vs2022 = false;
    self.vs_tools143 = false;
    self.emscripten = false;
    self.qmake = false;
    self.ninja = false;
    self.gradle = false;
    self.ndk = false;
    self.seeded = false;
  }

  /// Called before the user selects a backend; drops host-seeded defaults.
  pub(crate) fn take_backend_choice(&mut self) {
    if self.seeded {
      self.clear_backends();
    }
  }

  /// Every backend whose flags are set, in priority order.
  pub fn active_backends(&self) -> Vec<Backend> {
    Backend::PRIORITY
      .into_iter()
      .filter(|backend| match backend {
        Backend::Wasm => self.emscripten,
        Backend::Qmake => self.qmake,
        Backend::Xcode => self.is_xcode(),
        Backend::VisualStudio => self.is_vs(),
        Backend::Ninja => self.ninja,
        Backend::Ndk => self.ndk || self.gradle,
      })
      .collect()
  }

  /// The single backend this run emits.
  pub fn backend(&self) -> Option<Backend> {
    self.active_backends().into_iter().next()
  }

  /// Name reported by `platform.name()`.
  pub fn platform_name(&self) -> Option<&'static str> {
    self.backend().map(|b| b.platform_name())
  }

  /// Vendor reported by `platform.vendor()`.
  pub fn vendor(&self) -> Vendor {
    if self.is_xcode() {
      Vendor::Apple
    } else if self.is_vs() {
      Vendor::Microsoft
    } else {
      Vendor::Community
    }
  }

  /// Newest Xcode format requested.
  pub fn xcode_version(&self) -> Option<XcodeVersion> {
    [
      (self.xcode16, XcodeVersion::V16),
      (self.xcode15, XcodeVersion::V15),
      (self.xcode14, XcodeVersion::V14),
      (self.xcode12, XcodeVersion::V12),
      (self.xcode11, XcodeVersion::V11),
    ]
    .into_iter()
    .find_map(|(set, version)| set.then_some(version))
  }

  /// Apple sub-platforms to evaluate, one sandbox pass each.
  pub fn sub_platforms(&self) -> Vec<SubPlatform> {
    let mut targets = Vec::new();
    if self.os_mac {
      targets.push(SubPlatform::Macos);
    }
    if self.os_iphone {
      targets.push(SubPlatform::Ios);
    }
    if targets.is_empty() {
      targets.push(SubPlatform::Macos);
    }
    targets
  }

  /// Visual Studio platform toolset.
  pub fn platform_tools(&self) -> &'static str {
    if self.vs2022 || self.vs_tools143 { "v143" } else { "v142" }
  }

  /// Substitution values for one pass.
  pub fn variables(&self, sub_platform: Option<SubPlatform>) -> Variables {
    let mut vars = Variables::default();
    vars.insert("RELEASE", "release");
    vars.insert("DEBUG", "debug");
    if let Some(backend) = self.backend() {
      vars.insert("PLATFORM", backend.substitution());
    }
    if let Some(sub) = sub_platform {
      vars.insert("SUBPLATFORM", sub.as_str());
    }
    vars
  }

  /// Lua source defining the global `options` table.
  pub fn to_lua_source(&self) -> String {
    let flags = [
      ("xcode16", self.xcode16),
      ("xcode15", self.xcode15),
      ("xcode14", self.xcode14),
      ("xcode12", self.xcode12),
      ("xcode11", self.xcode11),
      ("vs2022", self.vs2022),
      ("vs2019", self.vs2019),
      ("emscripten", self.emscripten),
      ("wasm", self.emscripten),
      ("qmake", self.qmake),
      ("ninja", self.ninja),
      ("gradle", self.gradle),
      ("ndk", self.ndk),
      ("unity", self.unity),
      ("utf16", self.utf16),
    ];
    let mut out = String::from("options = {\n");
    for (name, value) in flags {
      out.push_str(&format!("  {} = {},\n", name, value));
    }
    out.push_str(&format!("  language = {:?},\n", self.language.as_str()));
    out.push_str(&format!("  c_language = {:?},\n", self.c_language.as_str()));
    if let Some(cross) = &self.cross {
      out.push_str(&format!("  cross = {},\n", lua_quote(cross)));
    }
    out.push_str("}\n");
    out
  }
}

/// Quote a string as a Lua string literal.
fn lua_quote(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 2);
  out.push('"');
  for c in s.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      c => out.push(c),
    }
  }
  out.push('"');
  out
}
