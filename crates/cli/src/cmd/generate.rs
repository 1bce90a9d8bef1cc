//! Generate project files from one configuration script.

use std::path::Path;

use owo_colors::{OwoColorize, Stream};

use cog_lib::generate::generate;
use cog_lib::options::OptionSet;

use crate::output::{pluralize, print_error, print_stat, print_success, symbols};

/// Generate from `script`, printing a summary. Returns whether it succeeded.
pub fn cmd_generate(script: &Path, options: &OptionSet) -> bool {
  match generate(script, options) {
    Ok(report) => {
      let name = report.workspace.as_deref().unwrap_or("(none)");
      match report.backend {
        Some(backend) => print_success(&format!("Generated {} for {}", name, backend.as_str())),
        None => print_success(&format!("Wrote template {}", name)),
      }
      if report.passes.iter().any(Option::is_some) {
        let passes: Vec<&str> = report.passes.iter().flatten().map(|p| p.as_str()).collect();
        print_stat("Passes", &passes.join(", "));
      }
      print_stat("Files", &pluralize(report.written.len(), "file"));
      for path in &report.written {
        println!(
          "  {} {}",
          symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.dimmed()),
          path.display()
        );
      }
      true
    }
    Err(err) => {
      print_error(&format!("{}: {}", script.display(), err));
      false
    }
  }
}
