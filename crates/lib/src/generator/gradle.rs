//! gradle/NDK emitter.
//!
//! Each project becomes a gradle module whose native code is built by a
//! generated `CMakeLists.txt` four levels below the output directory.

use std::fmt::Write as _;

use super::{EmitContext, EmitError, OutputFile, external_links, log_unused, sibling_links};
use crate::discovery::{ResolvedProject, ResolvedWorkspace};
use crate::model::BuildKind;
use crate::util::path::is_absolute_str;

const AGP_VERSION: &str = "7.4.1";
const GRADLE_VERSION: &str = "8.0.1";
const CMAKE_VERSION: &str = "3.22.1";
const COMPILE_SDK: u32 = 33;
const MIN_SDK: u32 = 27;

/// Depth of `<label>/src/main/cpp/CMakeLists.txt` below the output directory.
const CMAKE_DEPTH: usize = 4;

const COMMENT_LINE: &str = "//------------------------------------------------------------------------------\n";

fn header(out: &mut String) {
  out.push_str(COMMENT_LINE);
  out.push_str("// Generated file, do not edit.\n");
  out.push_str(COMMENT_LINE);
  out.push('\n');
}

/// Android plugin id for a build kind.
fn plugin(kind: BuildKind) -> &'static str {
  if kind.is_executable() {
    "com.android.application"
  } else {
    "com.android.library"
  }
}

/// CMake library type. Android loads executables as shared objects.
fn cmake_kind(kind: BuildKind) -> &'static str {
  match kind {
    BuildKind::Static => "STATIC",
    _ => "SHARED",
  }
}

pub fn emit(workspace: &ResolvedWorkspace, ctx: &EmitContext) -> Result<Vec<OutputFile>, EmitError> {
  let mut labels: Vec<&ResolvedProject> = workspace.projects.iter().collect();
  labels.sort_by(|a, b| a.project.label.cmp(&b.project.label));

  let mut files = vec![
    OutputFile::new("settings.gradle", settings(workspace, &labels)),
    OutputFile::new("build.gradle", root_build(&labels)),
    OutputFile::new("gradle/wrapper/gradle-wrapper.properties", wrapper()),
  ];
  for resolved in labels {
    let label = &resolved.project.label;
    files.push(OutputFile::new(
      format!("{}/build.gradle", label),
      module_build(workspace, resolved, ctx)?,
    ));
    files.push(OutputFile::new(
      format!("{}/src/main/cpp/CMakeLists.txt", label),
      cmake_lists(workspace, resolved, ctx),
    ));
  }
  Ok(files)
}

fn settings(workspace: &ResolvedWorkspace, labels: &[&ResolvedProject]) -> String {
  let mut out = String::new();
  header(&mut out);
  out += "pluginManagement{\n  repositories{\n    gradlePluginPortal()\n    mavenCentral()\n    google()\n  }\n}\n";
  let _ = writeln!(out, "rootProject.name = '{}'", workspace.name);
  for resolved in labels {
    let _ = writeln!(out, "include('{}')", resolved.project.label);
  }
  out
}

fn root_build(labels: &[&ResolvedProject]) -> String {
  let mut plugins: Vec<&str> = labels.iter().map(|p| plugin(p.project.build_kind())).collect();
  plugins.sort_unstable();
  plugins.dedup();

  let mut out = String::new();
  header(&mut out);
  out += "plugins{\n";
  for id in plugins {
    let _ = writeln!(out, "  id '{}' version '{}' apply false", id, AGP_VERSION);
  }
  out += "}\n";
  out
}

fn wrapper() -> String {
  format!(
    "distributionBase=GRADLE_USER_HOME\n\
     distributionUrl=https://services.gradle.org/distributions/gradle-{}-bin.zip\n\
     distributionPath=wrapper/dists\n\
     zipStorePath=wrapper/dists\n\
     zipStoreBase=GRADLE_USER_HOME\n",
    GRADLE_VERSION
  )
}

fn module_build(workspace: &ResolvedWorkspace, resolved: &ResolvedProject, ctx: &EmitContext) -> Result<String, EmitError> {
  let project = &resolved.project;
  let kind = project.build_kind();

  log_unused(
    project,
    "gradle",
    &[
      ("prefix_header", project.prefix_header.is_some()),
      ("install_script", project.install_script.is_some()),
      ("winsdk", project.microsoft.winsdk.is_some()),
      ("resources", !resolved.files.resources.is_empty()),
    ],
  );

  let namespace = project
    .apple
    .bundle_id
    .clone()
    .unwrap_or_else(|| format!("com.{}.{}", workspace.name.to_lowercase(), project.label.to_lowercase()));

  let mut out = String::new();
  header(&mut out);
  let _ = writeln!(out, "plugins{{\n  id '{}'\n}}", plugin(kind));
  out += "android{\n";
  let _ = writeln!(out, "  namespace '{}'", namespace);
  let _ = writeln!(out, "  compileSdk {}", COMPILE_SDK);
  out += "  defaultConfig{\n";
  let _ = writeln!(out, "    minSdk {}", MIN_SDK);
  let _ = writeln!(out, "    targetSdk {}", COMPILE_SDK);
  out += "    externalNativeBuild{\n      cmake{\n";
  let _ = writeln!(out, "        cppFlags '-std={}'", ctx.cpp_standard(project)?.as_str());
  let _ = writeln!(out, "        cFlags '-std={}'", ctx.c_standard(project)?.as_str());
  if let Some(triple) = &ctx.options.cross {
    let _ = writeln!(out, "        arguments '-DCMAKE_C_COMPILER_TARGET={}', '-DCMAKE_CXX_COMPILER_TARGET={}'", triple, triple);
  }
  out += "      }\n    }\n  }\n";
  out += "  externalNativeBuild{\n    cmake{\n";
  out += "      path \"src/main/cpp/CMakeLists.txt\"\n";
  let _ = writeln!(out, "      version \"{}\"", CMAKE_VERSION);
  out += "    }\n  }\n}\n";

  if kind != BuildKind::Static {
    out += "dependencies{\n  implementation 'androidx.appcompat:appcompat:1.6.1'\n";
    for sibling in sibling_links(workspace, project) {
      let _ = writeln!(out, "  implementation project(path: ':{}')", sibling.project.label);
    }
    out += "}\n";
  }
  Ok(out)
}

fn cmake_path(ctx: &EmitContext, path: &str) -> String {
  let rel = ctx.path_at(CMAKE_DEPTH, path);
  if is_absolute_str(&rel) {
    rel
  } else {
    format!("${{CMAKE_CURRENT_SOURCE_DIR}}/{}", rel)
  }
}

fn cmake_lists(workspace: &ResolvedWorkspace, resolved: &ResolvedProject, ctx: &EmitContext) -> String {
  let project = &resolved.project;
  let files = &resolved.files;
  let label = &project.label;
  let kind = project.build_kind();

  let mut out = String::new();
  out += "# Generated file, do not edit.\n";
  let _ = writeln!(out, "cmake_minimum_required(VERSION {})", CMAKE_VERSION);
  let _ = writeln!(out, "project(\"{}\")", label);
  let _ = writeln!(out, "add_library(\n  {}\n  {}", label, cmake_kind(kind));
  for src in files
    .sources
    .iter()
    .filter(|s| !(s.ends_with(".m") || s.ends_with(".mm")))
  {
    let _ = writeln!(out, "  {}", cmake_path(ctx, src));
  }
  out += ")\n";

  if !files.include_dirs.is_empty() {
    let _ = write!(out, "target_include_directories({} PUBLIC", label);
    for dir in &files.include_dirs {
      let _ = write!(out, "\n  {}", cmake_path(ctx, dir));
    }
    out += ")\n";
  }

  let defines: Vec<String> = std::iter::once("ANDROID=1".to_string())
    .chain(ctx.defines(project, true))
    .collect();
  let _ = write!(out, "target_compile_definitions({} PUBLIC", label);
  for define in &defines {
    let _ = write!(out, "\n  {}", define);
  }
  out += ")\n";

  if let Some(prefix) = &project.prefix_header {
    let _ = writeln!(out, "target_compile_options({} PRIVATE -include {})", label, cmake_path(ctx, prefix));
  }

  if kind != BuildKind::Static {
    out += "find_library(\n  log-lib\n  log\n)\n";
    let _ = write!(out, "target_link_libraries({} PUBLIC\n  ${{log-lib}}", label);
    for sibling in sibling_links(workspace, project) {
      let _ = write!(out, "\n  {}", sibling.project.label);
    }
    for lib in &files.libraries {
      let _ = write!(out, "\n  {}", cmake_path(ctx, lib));
    }
    for entry in external_links(workspace, project) {
      let _ = write!(out, "\n  {}", entry);
    }
    for lib in project.libs.iter() {
      let _ = write!(out, "\n  {}", lib);
    }
    out += ")\n";
  }
  out
}
