//! File discovery.
//!
//! Expands each project's comma-separated path and glob entries into sorted,
//! deduplicated file lists relative to the configuration directory, with
//! ignore patterns applied across every category.

mod glob;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::model::{CommaList, Project, Workspace};
use crate::util::path::to_slash;

pub use glob::{is_glob, to_regex as glob_to_regex};

const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "cc", "cxx", "m", "mm"];
const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh", "hxx", "inl"];
const LIBRARY_EXTENSIONS: &[&str] = &["a", "lib", "so", "dylib", "dll", "tbd"];

/// Directories treated as a single file.
const BUNDLE_EXTENSIONS: &[&str] = &["xcassets", "framework", "bundle"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
  #[error("project '{project}': invalid ignore pattern '{pattern}': {source}")]
  BadIgnore {
    project: String,
    pattern: String,
    source: regex::Error,
  },

  #[error("project '{project}': invalid glob '{pattern}': {source}")]
  BadGlob {
    project: String,
    pattern: String,
    source: regex::Error,
  },

  #[error("failed to walk {}: {source}", path.display())]
  Walk { path: PathBuf, source: walkdir::Error },
}

/// Concrete files for one project. Paths are relative to the configuration
/// directory and use `/` separators; absolute entries stay absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileSet {
  pub sources: Vec<String>,
  pub headers: Vec<String>,
  pub resources: Vec<String>,
  pub libraries: Vec<String>,
  pub frameworks: Vec<String>,
  /// Include directories, in declaration order.
  pub include_dirs: Vec<String>,
  /// Library search directories, in declaration order.
  pub library_dirs: Vec<String>,
  /// Framework search directories, in declaration order.
  pub framework_dirs: Vec<String>,
  /// Sources matching a `skip_unity` pattern.
  pub unity_excluded: Vec<String>,
}

impl ResolvedFileSet {
  /// Sources that may go into unity units.
  pub fn unity_candidates(&self) -> impl Iterator<Item = &str> {
    self
      .sources
      .iter()
      .filter(|src| !self.unity_excluded.contains(src))
      .map(String::as_str)
  }
}

/// A project together with its discovered files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
  pub project: Project,
  pub files: ResolvedFileSet,
}

/// A workspace whose projects have all been resolved, sorted by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWorkspace {
  pub name: String,
  pub projects: Vec<ResolvedProject>,
}

impl ResolvedWorkspace {
  pub fn project(&self, label: &str) -> Option<&ResolvedProject> {
    self.projects.iter().find(|p| p.project.label == label)
  }
}

/// Resolve every project in `workspace` against `root`.
pub fn resolve_workspace(workspace: Workspace, root: &Path) -> Result<ResolvedWorkspace, DiscoveryError> {
  let mut projects = Vec::with_capacity(workspace.projects.len());
  for (_, project) in workspace.projects {
    let files = resolve_project(&project, root)?;
    info!(
      project = %project.label,
      sources = files.sources.len(),
      headers = files.headers.len(),
      resources = files.resources.len(),
      "resolved project"
    );
    projects.push(ResolvedProject { project, files });
  }
  Ok(ResolvedWorkspace {
    name: workspace.name,
    projects,
  })
}

/// Resolve one project's path specifications against `root`.
pub fn resolve_project(project: &Project, root: &Path) -> Result<ResolvedFileSet, DiscoveryError> {
  let ignore = compile_patterns(&project.ignore, |pattern, source| DiscoveryError::BadIgnore {
    project: project.label.clone(),
    pattern: pattern.to_string(),
    source,
  })?;
  let skip_unity = compile_patterns(&project.skip_unity, |pattern, source| DiscoveryError::BadIgnore {
    project: project.label.clone(),
    pattern: pattern.to_string(),
    source,
  })?;
  let ignored = |rel: &str| ignore.iter().any(|re| re.is_match(rel));

  let walker = Walker { project, root };

  let mut sources = BTreeSet::new();
  let mut headers = BTreeSet::new();
  for file in walker.expand(&project.src_paths)? {
    if ignored(&file) {
      continue;
    }
    match extension(&file).as_deref() {
      Some(ext) if SOURCE_EXTENSIONS.contains(&ext) => {
        sources.insert(file);
      }
      Some(ext) if HEADER_EXTENSIONS.contains(&ext) => {
        headers.insert(file);
      }
      _ => debug!(project = %project.label, file = %file, "not a source or header"),
    }
  }

  let resources: BTreeSet<String> = walker
    .expand(&project.res_paths)?
    .into_iter()
    .filter(|file| !ignored(file))
    .collect();

  let mut libraries = BTreeSet::new();
  for file in walker.expand(&project.library_paths)? {
    if ignored(&file) {
      continue;
    }
    if extension(&file).is_some_and(|ext| LIBRARY_EXTENSIONS.contains(&ext.as_str())) {
      libraries.insert(file);
    }
  }

  let frameworks: BTreeSet<String> = walker
    .expand(&project.apple.framework_paths)?
    .into_iter()
    .filter(|file| !ignored(file) && file.ends_with(".framework"))
    .collect();

  let include_dirs = directories(&project.include_paths, root, &ignored);
  let library_dirs = directories(&project.library_paths, root, &ignored);
  let framework_dirs = directories(&project.apple.framework_paths, root, &ignored);

  let unity_excluded = sources
    .iter()
    .filter(|src| skip_unity.iter().any(|re| re.is_match(src)))
    .cloned()
    .collect();

  Ok(ResolvedFileSet {
    sources: sources.into_iter().collect(),
    headers: headers.into_iter().collect(),
    resources: resources.into_iter().collect(),
    libraries: libraries.into_iter().collect(),
    frameworks: frameworks.into_iter().collect(),
    include_dirs,
    library_dirs,
    framework_dirs,
    unity_excluded,
  })
}

fn compile_patterns(
  list: &CommaList,
  on_error: impl Fn(&str, regex::Error) -> DiscoveryError,
) -> Result<Vec<Regex>, DiscoveryError> {
  list
    .iter()
    .map(|pattern| Regex::new(pattern).map_err(|e| on_error(pattern, e)))
    .collect()
}

fn extension(file: &str) -> Option<String> {
  let name = file.rsplit('/').next()?;
  let (_, ext) = name.rsplit_once('.')?;
  Some(ext.to_ascii_lowercase())
}

fn is_bundle(name: &str) -> bool {
  extension(name).is_some_and(|ext| BUNDLE_EXTENSIONS.contains(&ext.as_str()))
}

/// Literal directory entries, deduplicated in declaration order.
fn directories(list: &CommaList, root: &Path, ignored: &dyn Fn(&str) -> bool) -> Vec<String> {
  let mut seen = BTreeSet::new();
  let mut out = Vec::new();
  for entry in list.iter() {
    if is_glob(entry) {
      continue;
    }
    let entry = entry.trim_end_matches('/');
    let path = root.join(entry);
    if !path.is_dir() || ignored(entry) {
      continue;
    }
    let normalized = to_slash(Path::new(entry));
    if seen.insert(normalized.clone()) {
      out.push(normalized);
    }
  }
  out
}

struct Walker<'a> {
  project: &'a Project,
  root: &'a Path,
}

impl Walker<'_> {
  /// Expand every entry of `list` into root-relative file paths.
  fn expand(&self, list: &CommaList) -> Result<Vec<String>, DiscoveryError> {
    let mut files = Vec::new();
    for entry in list.iter() {
      if is_glob(entry) {
        self.expand_glob(entry, &mut files)?;
      } else {
        self.expand_literal(entry, &mut files)?;
      }
    }
    Ok(files)
  }

  fn expand_literal(&self, entry: &str, files: &mut Vec<String>) -> Result<(), DiscoveryError> {
    let entry = entry.trim_end_matches('/');
    let path = self.root.join(entry);
    if path.is_file() || (path.is_dir() && is_bundle(entry)) {
      files.push(to_slash(Path::new(entry)));
    } else if path.is_dir() {
      self.walk(&path, |_| true, files)?;
    } else {
      warn!(project = %self.project.label, path = %entry, "path does not exist, skipping");
    }
    Ok(())
  }

  fn expand_glob(&self, pattern: &str, files: &mut Vec<String>) -> Result<(), DiscoveryError> {
    let re = glob::to_regex(pattern).map_err(|source| DiscoveryError::BadGlob {
      project: self.project.label.clone(),
      pattern: pattern.to_string(),
      source,
    })?;
    let base = self.root.join(glob::literal_base(pattern));
    if !base.is_dir() {
      warn!(project = %self.project.label, pattern, "glob base does not exist, skipping");
      return Ok(());
    }
    let before = files.len();
    self.walk(&base, |rel| re.is_match(rel), files)?;
    if files.len() == before {
      debug!(project = %self.project.label, pattern, "glob matched nothing");
    }
    Ok(())
  }

  /// Walk `dir`, pushing files (and bundle directories) accepted by `keep`.
  fn walk(&self, dir: &Path, keep: impl Fn(&str) -> bool, files: &mut Vec<String>) -> Result<(), DiscoveryError> {
    let mut it = WalkDir::new(dir).sort_by_file_name().min_depth(1).into_iter();
    while let Some(entry) = it.next() {
      let entry = entry.map_err(|source| DiscoveryError::Walk {
        path: dir.to_path_buf(),
        source,
      })?;
      let name = entry.file_name().to_string_lossy();
      if name.starts_with('.') && !is_bundle(&name) {
        if entry.file_type().is_dir() {
          it.skip_current_dir();
        }
        continue;
      }
      let bundle = entry.file_type().is_dir() && is_bundle(&name);
      if entry.file_type().is_dir() && !bundle {
        continue;
      }
      let rel = self.relative(entry.path());
      if bundle {
        it.skip_current_dir();
      }
      if keep(&rel) {
        files.push(rel);
      }
    }
    Ok(())
  }

  fn relative(&self, path: &Path) -> String {
    match path.strip_prefix(self.root) {
      Ok(rel) => to_slash(rel),
      Err(_) => to_slash(path),
    }
  }
}
