//! Command-line token handling.
//!
//! Tokens are processed one at a time so flags and configuration paths can be
//! interleaved: every non-flag token triggers a generation with the options
//! accumulated so far.

use std::path::PathBuf;

use tracing::debug;

use super::{CStandard, CppStandard, OptionSet, OptionsError};

/// What the driver should do after a token was consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgAction {
  /// The token updated the option set.
  Applied,
  /// Delete the output directory now.
  Clean,
  Help,
  Version,
  /// Flag-shaped token nobody understands.
  Unrecognized(String),
  /// Configuration script to generate from.
  Config(PathBuf),
}

/// Apply a single command-line token to `options`.
///
/// Flag names are matched case-insensitively; values (paths, triples,
/// extensions) keep their original spelling.
pub fn parse_token(options: &mut OptionSet, token: &str) -> Result<ArgAction, OptionsError> {
  let lower = token.to_ascii_lowercase();

  if let Some(action) = parse_backend(options, &lower) {
    return Ok(action);
  }

  if !lower.starts_with('-') {
    return Ok(ArgAction::Config(PathBuf::from(token)));
  }

  match lower.as_str() {
    "--help" | "-h" | "-?" => return Ok(ArgAction::Help),
    "--version" | "-v" => return Ok(ArgAction::Version),
    "--unity" => {
      options.unity = true;
      return Ok(ArgAction::Applied);
    }
    "--utf16" => {
      options.utf16 = true;
      return Ok(ArgAction::Applied);
    }
    "--clean" => return Ok(ArgAction::Clean),
    "--generate" => {
      options.generate = Some(String::from("cog"));
      return Ok(ArgAction::Applied);
    }
    _ => {}
  }

  if let Some(version) = lower
    .strip_prefix("--xcode-v")
    .or_else(|| lower.strip_prefix("--xc"))
  {
    let set: fn(&mut OptionSet) = match version {
      "11" => |o| o.xcode11 = true,
      "12" => |o| o.xcode12 = true,
      "14" => |o| o.xcode14 = true,
      "15" => |o| o.xcode15 = true,
      "16" => |o| o.xcode16 = true,
      _ => return Ok(ArgAction::Unrecognized(token.to_string())),
    };
    options.clear_backends();
    set(options);
    return Ok(ArgAction::Applied);
  }

  if let Some(value) = value_after(token, &lower, "--cross=").or_else(|| value_after(token, &lower, "-x")) {
    options.cross = Some(require(value, "--cross")?);
    return Ok(ArgAction::Applied);
  }

  if let Some(value) = value_after(token, &lower, "--output=").or_else(|| value_after(token, &lower, "-o")) {
    options.output = PathBuf::from(require(value, "-o")?);
    return Ok(ArgAction::Applied);
  }

  if let Some(value) = value_after(token, &lower, "--maxplugin=") {
    options.max_plugin = Some(require(value, "--maxplugin")?);
    return Ok(ArgAction::Applied);
  }

  if let Some(value) = value_after(token, &lower, "--generate=") {
    options.generate = Some(require(value, "--generate")?);
    return Ok(ArgAction::Applied);
  }

  for prefix in ["--c++", "--cxx", "--cpp"] {
    if let Some(digits) = lower.strip_prefix(prefix) {
      return match format!("c++{}", digits).parse::<CppStandard>() {
        Ok(language) => {
          options.language = language;
          Ok(ArgAction::Applied)
        }
        Err(_) => Ok(ArgAction::Unrecognized(token.to_string())),
      };
    }
  }

  if let Some(digits) = lower.strip_prefix("--c")
    && !digits.is_empty()
    && digits.chars().all(|c| c.is_ascii_digit())
  {
    return match format!("c{}", digits).parse::<CStandard>() {
      Ok(language) => {
        options.c_language = language;
        Ok(ArgAction::Applied)
      }
      Err(_) => Ok(ArgAction::Unrecognized(token.to_string())),
    };
  }

  debug!(token, "unrecognized flag");
  Ok(ArgAction::Unrecognized(token.to_string()))
}

/// Backend selector tokens (no leading dash).
fn parse_backend(options: &mut OptionSet, lower: &str) -> Option<ArgAction> {
  let apply: fn(&mut OptionSet) = match lower {
    "qmake" => |o| o.qmake = true,
    "ndk" | "gradle" => |o| {
      o.gradle = true;
      o.ndk = true;
    },
    "vs2019" => |o| o.vs2019 = true,
    "vs2022" | "vs2022=v143" => |o| {
      o.vs2022 = true;
      o.vs_tools143 = true;
    },
    "emscripten" | "wasm" => |o| {
      o.emscripten = true;
      o.ninja = true;
    },
    "ninja" => |o| o.ninja = true,
    "xcode" | "xcode=macos" => |o| {
      o.xcode12 = true;
      o.os_mac = true;
    },
    "xcode=ios" => |o| {
      o.xcode12 = true;
      o.os_iphone = true;
    },
    "xcode=ios,macos" | "xcode=macos,ios" => |o| {
      o.xcode12 = true;
      o.os_mac = true;
      o.os_iphone = true;
    },
    _ => return None,
  };
  options.take_backend_choice();
  apply(options);
  Some(ArgAction::Applied)
}

/// The original-case remainder of `token` after a case-insensitive `prefix`.
fn value_after<'a>(token: &'a str, lower: &str, prefix: &str) -> Option<&'a str> {
  lower.starts_with(prefix).then(|| &token[prefix.len()..])
}

fn require(value: &str, flag: &str) -> Result<String, OptionsError> {
  if value.is_empty() {
    Err(OptionsError::MissingValue { flag: flag.to_string() })
  } else {
    Ok(value.to_string())
  }
}

/// Usage text printed for `--help`.
pub fn usage() -> &'static str {
  "Usage: cog [options] [cogfile.lua ...]

Backends:
  xcode | xcode=macos | xcode=ios | xcode=ios,macos
  vs2019 | vs2022[=v143]
  ninja
  qmake
  ndk | gradle
  emscripten | wasm

Options:
  -o<path>, --output=<path>   output directory (default tmp)
  --unity                     enable unity builds for projects that opt in
  --clean                     delete the output directory
  --cross=<triple>, -x<triple>
                              cross-compilation target
  --c++{11|14|17|20|23}       C++ standard (default c++20)
  --c{11|17|23}               C standard (default c17)
  --xcode-v{11|12|14|15|16}   select the Xcode project format
  --utf16                     Unicode character set for Visual Studio
  --generate[=<name>]         write a template cogfile set
  --maxplugin=<ext>           template mode: emit a plugin .def file
  -h, --help                  show this text
  -v, --version               show the version

Every argument that is not an option is a configuration script and is
generated immediately with the options given before it."
}
