mod cmd;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cmd::cmd_run;
use crate::output::print_error;

/// cog - cross-platform project file generator
///
/// Tokens are processed left to right: backends and options update the
/// current option set, and every other token is a configuration script that
/// is generated immediately.
#[derive(Parser)]
#[command(name = "cog", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
  /// Backends, options and configuration scripts
  #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
  tokens: Vec<String>,
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let cli = Cli::parse();

  match cmd_run(&cli.tokens) {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::FAILURE,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
