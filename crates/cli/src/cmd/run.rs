//! The token-stream driver behind `cog`.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use tracing::warn;

use cog_lib::consts::DEFAULT_CONFIG;
use cog_lib::options::{ArgAction, OptionSet, parse_token, usage};
use cog_lib::settings::Settings;

use super::{cmd_clean, cmd_generate};
use crate::output::{print_error, print_warning};

fn print_banner() {
  println!(
    "{} v{}",
    "cog".if_supports_color(Stream::Stdout, |s| s.bold()),
    env!("CARGO_PKG_VERSION")
  );
}

/// Run every token in order.
///
/// Returns `Ok(false)` when any generation or clean failed.
pub fn cmd_run(tokens: &[String]) -> Result<bool> {
  let settings = Settings::load().context("Failed to load settings")?;
  let mut options = OptionSet::host_default();
  options
    .apply_settings(&settings)
    .context("Invalid value in settings file")?;

  print_banner();

  let mut ok = true;
  let mut config_given = false;
  let mut informational = false;

  for token in tokens {
    let action = match parse_token(&mut options, token) {
      Ok(action) => action,
      Err(err) => {
        print_error(&err.to_string());
        ok = false;
        continue;
      }
    };
    match action {
      ArgAction::Applied => {}
      ArgAction::Clean => ok &= cmd_clean(&options.output),
      ArgAction::Help => {
        println!("{}", usage());
        informational = true;
      }
      ArgAction::Version => informational = true,
      ArgAction::Unrecognized(flag) => {
        warn!(flag = %flag, "unrecognized flag");
        print_warning(&format!("Ignoring unrecognized option {}", flag));
      }
      ArgAction::Config(path) => {
        config_given = true;
        if !path.exists() {
          warn!(path = %path.display(), "configuration script not found");
          print_warning(&format!("{} not found, skipping", path.display()));
          continue;
        }
        ok &= cmd_generate(&path, &options);
      }
    }
  }

  if !config_given && !informational {
    let default = Path::new(DEFAULT_CONFIG);
    if options.generate.is_none() && !default.exists() {
      print_error(&format!("{} not found!", DEFAULT_CONFIG));
      return Ok(false);
    }
    ok &= cmd_generate(default, &options);
  }

  Ok(ok)
}
