//! Persisting generated files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{EmitError, OutputFile};

/// Write every file under `out_dir`.
///
/// Each file is written to a sibling `.tmp` file and renamed into place, so
/// a reader never observes a half-written project. Files whose contents are
/// already identical are left untouched. Returns the paths written.
pub fn write_outputs(out_dir: &Path, files: &[OutputFile]) -> Result<Vec<PathBuf>, EmitError> {
  let mut written = Vec::with_capacity(files.len());
  for file in files {
    let path = out_dir.join(&file.path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|source| EmitError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    if fs::read(&path).is_ok_and(|existing| existing == file.contents.as_bytes()) {
      debug!(path = %path.display(), "unchanged");
      written.push(path);
      continue;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, &file.contents).map_err(|source| EmitError::Write {
      path: temp_path.clone(),
      source,
    })?;
    fs::rename(&temp_path, &path).map_err(|source| EmitError::Write {
      path: path.clone(),
      source,
    })?;
    debug!(path = %path.display(), bytes = file.contents.len(), "wrote");
    written.push(path);
  }
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn creates_nested_directories() {
    let temp = TempDir::new().unwrap();
    let files = vec![
      OutputFile::new("build.ninja", "rule cc\n"),
      OutputFile::new("macos/app.xcodeproj/project.pbxproj", "// !$*UTF8*$!\n"),
    ];
    let written = write_outputs(temp.path(), &files).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(
      fs::read_to_string(temp.path().join("macos/app.xcodeproj/project.pbxproj")).unwrap(),
      "// !$*UTF8*$!\n"
    );
  }

  #[test]
  fn leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    write_outputs(temp.path(), &[OutputFile::new("a.pro", "TEMPLATE = app\n")]).unwrap();
    let names: Vec<_> = fs::read_dir(temp.path())
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["a.pro"]);
  }

  #[test]
  fn overwrites_changed_files() {
    let temp = TempDir::new().unwrap();
    write_outputs(temp.path(), &[OutputFile::new("a.pro", "old")]).unwrap();
    write_outputs(temp.path(), &[OutputFile::new("a.pro", "new")]).unwrap();
    assert_eq!(fs::read_to_string(temp.path().join("a.pro")).unwrap(), "new");
  }
}
