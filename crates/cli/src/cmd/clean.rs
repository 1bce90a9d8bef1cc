use std::path::Path;

use cog_lib::generate::clean;

use crate::output::{print_error, print_info, print_success};

/// Delete the output directory. Returns whether it succeeded.
pub fn cmd_clean(out: &Path) -> bool {
  match clean(out) {
    Ok(true) => {
      print_success(&format!("Removed {}", out.display()));
      true
    }
    Ok(false) => {
      print_info(&format!("Nothing to clean at {}", out.display()));
      true
    }
    Err(err) => {
      print_error(&err.to_string());
      false
    }
  }
}
