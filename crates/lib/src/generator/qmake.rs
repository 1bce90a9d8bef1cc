//! qmake emitter: a `subdirs` workspace plus one `.pro` per project.

use std::fmt::Write as _;

use tracing::debug;

use super::{EmitContext, EmitError, OutputFile, external_links, log_unused, sibling_links};
use crate::discovery::{ResolvedProject, ResolvedWorkspace};
use crate::model::BuildKind;

const COMMENT_LINE: &str = "#-------------------------------------------------------------------------------\n";

/// Depth of a project's `.pro` below the output directory.
const PROJECT_DEPTH: usize = 1;

/// Order `SUBDIRS` are listed in, so libraries build before their users.
const BUILD_ORDER: [BuildKind; 4] = [
  BuildKind::Static,
  BuildKind::Shared,
  BuildKind::Console,
  BuildKind::Application,
];

/// qmake has no framework or bundle templates; both build as shared libraries.
fn qmake_kind(kind: BuildKind) -> BuildKind {
  match kind {
    BuildKind::Framework | BuildKind::Bundle => BuildKind::Shared,
    other => other,
  }
}

fn header(out: &mut String, title: &str) {
  out.push_str(COMMENT_LINE);
  let _ = writeln!(out, "# {}", title);
  out.push_str("# Generated file, do not edit.\n");
  out.push_str(COMMENT_LINE);
  out.push('\n');
}

pub fn emit(workspace: &ResolvedWorkspace, ctx: &EmitContext) -> Result<Vec<OutputFile>, EmitError> {
  let mut pro = String::new();
  header(&mut pro, &format!("Workspace \"{}\"", workspace.name));
  pro += "TEMPLATE = subdirs\nCONFIG += ordered\n";

  let mut files = Vec::new();
  for kind in BUILD_ORDER {
    for resolved in workspace
      .projects
      .iter()
      .filter(|p| qmake_kind(p.project.build_kind()) == kind)
    {
      let label = &resolved.project.label;
      let _ = writeln!(pro, "SUBDIRS += {}", label);
      files.push(OutputFile::new(
        format!("{}/{}.pro", label, label),
        project_file(workspace, resolved, ctx)?,
      ));
    }
  }

  for resolved in &workspace.projects {
    let deps: Vec<&str> = sibling_links(workspace, &resolved.project)
      .into_iter()
      .filter(|sibling| sibling.project.build_kind().is_library())
      .map(|sibling| sibling.project.label.as_str())
      .collect();
    if !deps.is_empty() {
      let _ = writeln!(pro, "{}.depends = {}", resolved.project.label, deps.join(" "));
    }
  }

  files.insert(0, OutputFile::new(format!("{}.pro", workspace.name), pro));
  Ok(files)
}

fn project_file(workspace: &ResolvedWorkspace, resolved: &ResolvedProject, ctx: &EmitContext) -> Result<String, EmitError> {
  let project = &resolved.project;
  let files = &resolved.files;
  let path = |p: &str| ctx.path_at(PROJECT_DEPTH, p);

  log_unused(
    project,
    "qmake",
    &[
      ("bundle_id", project.apple.bundle_id.is_some()),
      ("winsdk", project.microsoft.winsdk.is_some()),
      ("resources", !files.resources.is_empty()),
    ],
  );

  let mut out = String::new();
  header(&mut out, &format!("Project \"{}\"", project.label));

  match qmake_kind(project.build_kind()) {
    BuildKind::Console => out += "TEMPLATE = app\nCONFIG += console\n",
    BuildKind::Static => out += "TEMPLATE = lib\nCONFIG += staticlib\n",
    BuildKind::Shared => out += "TEMPLATE = lib\nCONFIG += shared\n",
    _ => out += "TEMPLATE = app\n",
  }
  let _ = writeln!(out, "CONFIG += {}", ctx.cpp_standard(project)?.as_str());
  let _ = writeln!(out, "QMAKE_CFLAGS += -std={}", ctx.c_standard(project)?.as_str());
  let _ = writeln!(out, "TARGET = {}", project.label);

  if let Some(prefix) = &project.prefix_header {
    let _ = writeln!(out, "QMAKE_CXXFLAGS += -include {}", path(prefix));
    let _ = writeln!(out, "QMAKE_CFLAGS += -include {}", path(prefix));
  }
  if let Some(triple) = &ctx.options.cross {
    let _ = writeln!(out, "QMAKE_CXXFLAGS += --target={}", triple);
    let _ = writeln!(out, "QMAKE_CFLAGS += --target={}", triple);
    let _ = writeln!(out, "QMAKE_LFLAGS += --target={}", triple);
  }

  let _ = write!(
    out,
    "\nCONFIG(debug, debug|release) {{\n  DEFINES += {}\n}} else {{\n  DEFINES += {}\n}}\n",
    ctx.defines(project, false).join(" "),
    ctx.defines(project, true).join(" ")
  );

  if !files.include_dirs.is_empty() {
    out += "\n";
    for dir in &files.include_dirs {
      let _ = writeln!(out, "INCLUDEPATH += {}", path(dir));
    }
  }

  let mut libs = Vec::new();
  for sibling in sibling_links(workspace, project) {
    let label = &sibling.project.label;
    if sibling.project.build_kind().is_library() {
      libs.push(format!("-L$$OUT_PWD/../{} -l{}", label, label));
    }
  }
  for dir in &files.library_dirs {
    libs.push(format!("-L{}", path(dir)));
  }
  for lib in &files.libraries {
    libs.push(path(lib));
  }
  for entry in external_links(workspace, project) {
    libs.push(format!("-l{}", entry));
  }
  for lib in project.libs.iter() {
    libs.push(format!("-l{}", lib));
  }
  if !libs.is_empty() {
    out += "\n";
    for lib in libs {
      let _ = writeln!(out, "LIBS += {}", lib);
    }
  }

  if !files.sources.is_empty() {
    out += "\n";
    out += COMMENT_LINE;
    out += "# Source files.\n";
    out += COMMENT_LINE;
    out += "\n";
    for src in &files.sources {
      if src.ends_with(".m") || src.ends_with(".mm") {
        debug!(project = %project.label, source = %src, "objective-c source listed as OBJECTIVE_SOURCES");
        let _ = writeln!(out, "OBJECTIVE_SOURCES += {}", path(src));
      } else {
        let _ = writeln!(out, "SOURCES += {}", path(src));
      }
    }
  }
  if !files.headers.is_empty() {
    out += "\n";
    out += COMMENT_LINE;
    out += "# Header files.\n";
    out += COMMENT_LINE;
    out += "\n";
    for header in &files.headers {
      let _ = writeln!(out, "HEADERS += {}", path(header));
    }
  }
  Ok(out)
}
