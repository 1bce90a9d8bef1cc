use std::path::{Component, Path, PathBuf};

/// Render a path with `/` separators regardless of host.
pub fn to_slash(path: &Path) -> String {
  path
    .components()
    .filter_map(|component| match component {
      Component::CurDir => None,
      Component::RootDir => Some(String::new()),
      other => Some(other.as_os_str().to_string_lossy().into_owned()),
    })
    .collect::<Vec<_>>()
    .join("/")
}

/// Relative path leading from directory `from` to `to`.
///
/// Both paths should be absolute and canonical; when they share no prefix
/// (different drives) `to` is returned unchanged.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
  let from: Vec<Component> = from.components().collect();
  let to_components: Vec<Component> = to.components().collect();

  let common = from
    .iter()
    .zip(to_components.iter())
    .take_while(|(a, b)| a == b)
    .count();
  if common == 0 {
    return to.to_path_buf();
  }

  let mut rel = PathBuf::new();
  for _ in common..from.len() {
    rel.push("..");
  }
  for component in &to_components[common..] {
    rel.push(component.as_os_str());
  }
  if rel.as_os_str().is_empty() {
    rel.push(".");
  }
  rel
}

/// True for `/abs`, `\\server` and `C:`-style paths.
pub fn is_absolute_str(path: &str) -> bool {
  let bytes = path.as_bytes();
  path.starts_with('/')
    || path.starts_with('\\')
    || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Join a script-relative `path` onto `prefix`, leaving absolute paths alone.
pub fn prefixed(prefix: &str, path: &str) -> String {
  if is_absolute_str(path) || prefix.is_empty() || prefix == "." {
    path.to_string()
  } else {
    format!("{}/{}", prefix.trim_end_matches('/'), path)
  }
}
