//! `build.ninja` emitter for Linux, WebAssembly and cross builds.
//!
//! One file holds every project. Ninja is expected to run from the output
//! directory, so sources are addressed through the configuration root,
//! objects live under `.intermediate/<label>/` and products under `.output/`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::debug;

use super::unity::{self, UnityPlan};
use super::{EmitContext, EmitError, OutputFile, external_links, log_unused, sibling_links};
use crate::consts::{INTERMEDIATE_DIR, PRODUCT_DIR};
use crate::discovery::{ResolvedProject, ResolvedWorkspace};
use crate::model::BuildKind;
use crate::util::hash::object_id;
use crate::util::path::is_absolute_str;

const RULE_LINE: &str = "#-------------------------------------------------------------------------------\n";

#[derive(Clone, Default)]
struct NinjaRule {
  name: String,
  command: Vec<String>,
  depfile: Option<String>,
  deps: Option<String>,
  description: Option<String>,
}

impl NinjaRule {
  fn as_string(&self) -> String {
    let mut ret = format!("rule {}\n  command = {}", self.name, self.command.join(" "));
    if let Some(depfile) = &self.depfile {
      ret += "\n  depfile = ";
      ret += depfile;
    }
    if let Some(deps) = &self.deps {
      ret += "\n  deps = ";
      ret += deps;
    }
    if let Some(desc) = &self.description {
      ret += "\n  description = ";
      ret += desc;
    }
    ret += "\n\n";
    ret
  }
}

struct NinjaBuild<'a> {
  outputs: Vec<String>,
  rule: &'a str,
  inputs: Vec<String>,
  implicit: Vec<String>,
  keyvals: Vec<(&'static str, String)>,
}

impl NinjaBuild<'_> {
  fn as_string(&self) -> String {
    let mut ret = format!(
      "build {}: {} {}",
      escape_all(&self.outputs),
      self.rule,
      escape_all(&self.inputs)
    );
    if !self.implicit.is_empty() {
      ret += " | ";
      ret += &escape_all(&self.implicit);
    }
    ret += "\n";
    for (key, value) in &self.keyvals {
      if !value.is_empty() {
        let _ = writeln!(ret, "  {} = {}", key, value);
      }
    }
    ret
  }
}

fn escape(path: &str) -> String {
  path.replace('$', "$$").replace(' ', "$ ").replace(':', "$:")
}

fn escape_all(paths: &[String]) -> String {
  paths.iter().map(|p| escape(p)).collect::<Vec<_>>().join(" ")
}

/// Toolchain commands for this run.
struct Tools {
  cxx: &'static str,
  cc: &'static str,
  ar: &'static str,
  wasm: bool,
  target: Option<String>,
}

impl Tools {
  fn new(ctx: &EmitContext) -> Self {
    let wasm = ctx.options.emscripten;
    Self {
      cxx: if wasm { "em++" } else { "clang++" },
      cc: if wasm { "emcc" } else { "clang" },
      ar: if wasm { "emar" } else { "ar" },
      wasm,
      target: ctx.options.cross.as_ref().map(|triple| format!("--target={}", triple)),
    }
  }
}

/// Ninja's single build kind for a project.
fn link_kind(kind: BuildKind) -> BuildKind {
  match kind {
    BuildKind::Framework | BuildKind::Bundle => BuildKind::Shared,
    other => other,
  }
}

/// Output-relative path of a project's product.
fn product_path(label: &str, kind: BuildKind, wasm: bool) -> String {
  match link_kind(kind) {
    BuildKind::Static => format!("{}/lib{}.a", PRODUCT_DIR, label),
    BuildKind::Shared if wasm => format!("{}/lib{}.wasm", PRODUCT_DIR, label),
    BuildKind::Shared => format!("{}/lib{}.so", PRODUCT_DIR, label),
    _ if wasm => format!("{}/{}.html", PRODUCT_DIR, label),
    _ => format!("{}/{}", PRODUCT_DIR, label),
  }
}

/// Object file for a source. Parent-directory and root components are
/// folded so every object stays under the project's intermediate directory.
fn object_path(label: &str, source: &str) -> String {
  let folded: Vec<&str> = source
    .split('/')
    .filter(|part| !part.is_empty() && *part != ".")
    .map(|part| if part == ".." { "__" } else { part })
    .collect();
  format!("{}/{}/{}.o", INTERMEDIATE_DIR, label, folded.join("/"))
}

/// `-L`/`-l` style reference for a non-sibling `link_with` entry.
fn external_flag(ctx: &EmitContext, entry: &str) -> String {
  if entry.contains('/') || is_absolute_str(entry) {
    ctx.path_at(0, entry)
  } else {
    format!("-l{}", entry)
  }
}

fn is_objc(source: &str) -> bool {
  source.ends_with(".m") || source.ends_with(".mm")
}

/// Whether ninja has anything to compile for `plan`.
fn compiles(plan: &UnityPlan) -> bool {
  !plan.units.is_empty() || plan.individual.iter().any(|src| !is_objc(src))
}

/// Rule-name stem per built project. Labels that fold to the same stem get a
/// hash suffix so every rule and variable name stays unique.
fn rule_stems<'a>(labels: impl Iterator<Item = &'a ResolvedProject>) -> BTreeMap<&'a str, String> {
  let mut by_stem: BTreeMap<String, Vec<&str>> = BTreeMap::new();
  for resolved in labels {
    by_stem
      .entry(resolved.project.rule_name())
      .or_default()
      .push(&resolved.project.label);
  }
  let mut stems = BTreeMap::new();
  for (stem, labels) in by_stem {
    if let [label] = labels.as_slice() {
      stems.insert(*label, stem);
      continue;
    }
    for label in labels {
      let suffix = &object_id(&["ninja-rule", label])[..6];
      stems.insert(label, format!("{}_{}", stem, suffix));
    }
  }
  stems
}

pub fn emit(workspace: &ResolvedWorkspace, ctx: &EmitContext) -> Result<Vec<OutputFile>, EmitError> {
  let tools = Tools::new(ctx);
  let mut files = Vec::new();
  let mut out = String::new();

  out += RULE_LINE;
  let _ = writeln!(out, "# Workspace \"{}\"", workspace.name);
  out += "# Generated file, do not edit.\n";
  out += RULE_LINE;
  out += "\nninja_required_version = 1.5\n\n";

  let mut planned = Vec::new();
  for resolved in &workspace.projects {
    let plan = unity::plan(resolved, ctx);
    if !compiles(&plan) {
      debug!(project = %resolved.project.label, "no sources; skipping");
      continue;
    }
    planned.push((resolved, plan));
  }
  let stems = rule_stems(planned.iter().map(|(resolved, _)| *resolved));

  let mut defaults = Vec::new();
  for (resolved, plan) in planned {
    out += &project_section(workspace, resolved, &plan, &stems, &tools, ctx)?;
    defaults.push(product_path(
      &resolved.project.label,
      resolved.project.build_kind(),
      tools.wasm,
    ));
    files.extend(plan.units);
  }

  if !defaults.is_empty() {
    let _ = writeln!(out, "default {}", escape_all(&defaults));
  }

  files.insert(0, OutputFile::new("build.ninja", out));
  Ok(files)
}

fn project_section(
  workspace: &ResolvedWorkspace,
  resolved: &ResolvedProject,
  plan: &UnityPlan,
  stems: &BTreeMap<&str, String>,
  tools: &Tools,
  ctx: &EmitContext,
) -> Result<String, EmitError> {
  let project = &resolved.project;
  let label = &project.label;
  let upper = stems.get(label.as_str()).cloned().unwrap_or_else(|| project.rule_name());
  let kind = link_kind(project.build_kind());

  log_unused(
    project,
    "ninja",
    &[
      ("resources", !resolved.files.resources.is_empty()),
      ("frameworks", !resolved.files.frameworks.is_empty()),
      ("bundle_id", project.apple.bundle_id.is_some()),
      ("winsdk", project.microsoft.winsdk.is_some()),
      ("def", project.microsoft.def.is_some()),
    ],
  );

  let mut out = String::new();
  out += RULE_LINE;
  let _ = writeln!(out, "# Project \"{}\"", label);
  out += RULE_LINE;
  out += "\n";

  // Flags shared by both compilers.
  let mut cflags = Vec::new();
  if tools.wasm {
    cflags.push("-O3".to_string());
  }
  if let Some(target) = &tools.target {
    cflags.push(target.clone());
  }
  for dir in &resolved.files.include_dirs {
    cflags.push(format!("-I{}", ctx.path_at(0, dir)));
  }
  for define in ctx.defines(project, true) {
    cflags.push(format!("-D{}", define));
  }
  if let Some(prefix) = &project.prefix_header {
    cflags.push(format!("-include {}", ctx.path_at(0, prefix)));
  }
  if kind == BuildKind::Shared {
    cflags.push("-fPIC".to_string());
  }
  let cflags_var = format!("{}_CFLAGS", upper);
  let _ = writeln!(out, "{} = {}", cflags_var, cflags.join(" "));

  let mut lflags = Vec::new();
  if let Some(target) = &tools.target {
    lflags.push(target.clone());
  }
  for dir in &resolved.files.library_dirs {
    lflags.push(format!("-L{}", ctx.path_at(0, dir)));
  }
  let lflags_var = format!("{}_LFLAGS", upper);
  let _ = writeln!(out, "{} = {}\n", lflags_var, lflags.join(" "));

  let cxx_rule = NinjaRule {
    name: format!("CXX_{}", upper),
    command: vec![
      tools.cxx.to_string(),
      format!("-std={}", ctx.cpp_standard(project)?.as_str()),
      format!("${}", cflags_var),
      "-MMD -MF $out.d -o $out -c $in".to_string(),
    ],
    depfile: Some("$out.d".to_string()),
    deps: Some("gcc".to_string()),
    description: Some("Building C++ object $out".to_string()),
  };
  let c_rule = NinjaRule {
    name: format!("C_{}", upper),
    command: vec![
      tools.cc.to_string(),
      format!("-std={}", ctx.c_standard(project)?.as_str()),
      format!("${}", cflags_var),
      "-MMD -MF $out.d -o $out -c $in".to_string(),
    ],
    depfile: Some("$out.d".to_string()),
    deps: Some("gcc".to_string()),
    description: Some("Building C object $out".to_string()),
  };
  let link_rule = match kind {
    BuildKind::Static => NinjaRule {
      name: format!("STATIC_LIB_{}", upper),
      command: vec![format!("rm -f $out && {} rcs $out $in", tools.ar)],
      description: Some("Linking static library $out".to_string()),
      ..Default::default()
    },
    BuildKind::Shared => NinjaRule {
      name: format!("SHARED_LIB_{}", upper),
      command: vec![
        tools.cxx.to_string(),
        "-shared".to_string(),
        format!("${}", lflags_var),
        "$in -o $out $LINK_LIBRARIES".to_string(),
      ],
      description: Some("Linking shared library $out".to_string()),
      ..Default::default()
    },
    _ => NinjaRule {
      name: format!("{}_LINKER_{}", if tools.wasm { "WASM" } else { "ELF" }, upper),
      command: vec![
        tools.cxx.to_string(),
        format!("${}", lflags_var),
        "$in -o $out $LINK_LIBRARIES".to_string(),
      ],
      description: Some("Linking $out".to_string()),
      ..Default::default()
    },
  };
  out += &cxx_rule.as_string();
  out += &c_rule.as_string();
  out += &link_rule.as_string();

  // Compile edges: unity units are already output-relative.
  let sources = plan
    .unit_paths()
    .map(|unit| (unit.clone(), unit))
    .chain(plan.individual.iter().map(|src| (src.clone(), ctx.path_at(0, src))));

  let mut objects = Vec::new();
  for (name, input) in sources {
    let rule = if name.ends_with(".c") {
      &c_rule.name
    } else if is_objc(&name) {
      debug!(project = %label, source = %name, "objective-c source skipped by ninja");
      continue;
    } else {
      &cxx_rule.name
    };
    let object = object_path(label, &name);
    let build = NinjaBuild {
      outputs: vec![object.clone()],
      rule,
      inputs: vec![input],
      implicit: Vec::new(),
      keyvals: Vec::new(),
    };
    out += &build.as_string();
    objects.push(object);
  }
  out += "\n";

  // Link edge.
  let mut implicit = Vec::new();
  let mut libraries = Vec::new();
  if kind != BuildKind::Static {
    for sibling in sibling_links(workspace, project) {
      let sibling_kind = sibling.project.build_kind();
      if !sibling_kind.is_library() {
        continue;
      }
      if !stems.contains_key(sibling.project.label.as_str()) {
        debug!(project = %label, sibling = %sibling.project.label, "sibling has nothing to build; not linked");
        continue;
      }
      let product = product_path(&sibling.project.label, sibling_kind, tools.wasm);
      libraries.push(product.clone());
      implicit.push(product);
    }
    for entry in external_links(workspace, project) {
      libraries.push(external_flag(ctx, entry));
    }
    for lib in &resolved.files.libraries {
      libraries.push(ctx.path_at(0, lib));
    }
    for lib in project.libs.iter() {
      libraries.push(format!("-l{}", lib));
    }
  }

  let link = NinjaBuild {
    outputs: vec![product_path(label, kind, tools.wasm)],
    rule: &link_rule.name,
    inputs: objects,
    implicit,
    keyvals: vec![("LINK_LIBRARIES", libraries.join(" "))],
  };
  out += &link.as_string();
  out += "\n";
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::super::testutil::*;
  use super::*;
  use crate::options::OptionSet;

  fn ninja_options() -> OptionSet {
    OptionSet {
      ninja: true,
      ..OptionSet::default()
    }
  }

  #[test]
  fn rule_as_string() {
    let rule = NinjaRule {
      name: "CXX_APP".into(),
      command: vec!["clang++".into(), "-c $in".into()],
      description: Some("Building $out".into()),
      ..Default::default()
    };
    assert_eq!(
      rule.as_string(),
      "rule CXX_APP\n  command = clang++ -c $in\n  description = Building $out\n\n"
    );
  }

  #[test]
  fn object_paths_stay_inside_intermediate() {
    assert_eq!(object_path("app", "src/main.cpp"), ".intermediate/app/src/main.cpp.o");
    assert_eq!(object_path("app", "../shared/x.c"), ".intermediate/app/__/shared/x.c.o");
    assert_eq!(object_path("app", "/abs/y.cpp"), ".intermediate/app/abs/y.cpp.o");
  }

  #[test]
  fn emits_compile_and_link_edges() {
    let options = ninja_options();
    let mut engine = project("engine", BuildKind::Static, &["src/engine.cpp", "src/util.c"]);
    engine.files.include_dirs = vec!["include".into()];
    let mut app = project("app", BuildKind::Console, &["src/main.cpp"]);
    app.project.link_with.append("engine,pthread");
    let ws = workspace("game", vec![app, engine]);

    let files = emit(&ws, &ctx(&options)).unwrap();
    let ninja = file(&files, "build.ninja");

    assert!(ninja.contains("ninja_required_version = 1.5"));
    assert!(ninja.contains("rule CXX_ENGINE\n  command = clang++ -std=c++20 $ENGINE_CFLAGS"));
    assert!(ninja.contains("rule C_ENGINE\n  command = clang -std=c17 $ENGINE_CFLAGS"));
    assert!(ninja.contains("ENGINE_CFLAGS = -I../include -DNDEBUG -DRELEASE\n"));
    assert!(ninja.contains("build .intermediate/engine/src/engine.cpp.o: CXX_ENGINE ../src/engine.cpp\n"));
    assert!(ninja.contains("build .intermediate/engine/src/util.c.o: C_ENGINE ../src/util.c\n"));
    assert!(ninja.contains(
      "build .output/libengine.a: STATIC_LIB_ENGINE .intermediate/engine/src/engine.cpp.o .intermediate/engine/src/util.c.o\n"
    ));
    assert!(ninja.contains(
      "build .output/app: ELF_LINKER_APP .intermediate/app/src/main.cpp.o | .output/libengine.a\n  LINK_LIBRARIES = .output/libengine.a -lpthread\n"
    ));
    assert!(ninja.contains("default .output/app .output/libengine.a\n"));
  }

  #[test]
  fn wasm_and_cross_toolchains() {
    let options = OptionSet {
      emscripten: true,
      ninja: true,
      cross: Some("aarch64-linux-gnu".into()),
      ..OptionSet::default()
    };
    let ws = workspace("w", vec![project("app", BuildKind::Application, &["main.cpp"])]);
    let files = emit(&ws, &ctx(&options)).unwrap();
    let ninja = file(&files, "build.ninja");
    assert!(ninja.contains("command = em++ -std=c++20"));
    assert!(ninja.contains("APP_CFLAGS = -O3 --target=aarch64-linux-gnu"));
    assert!(ninja.contains("rule WASM_LINKER_APP"));
    assert!(ninja.contains("build .output/app.html: WASM_LINKER_APP"));
  }

  #[test]
  fn projects_without_sources_are_skipped() {
    let options = ninja_options();
    let ws = workspace("w", vec![project("headers", BuildKind::Static, &[])]);
    let files = emit(&ws, &ctx(&options)).unwrap();
    assert!(!file(&files, "build.ninja").contains("headers"));
  }

  #[test]
  fn unity_units_replace_sources() {
    let options = OptionSet {
      ninja: true,
      unity: true,
      unity_units: 1,
      ..OptionSet::default()
    };
    let mut app = project("app", BuildKind::Console, &["a.cpp", "b.cpp"]);
    app.project.unity = true;
    let files = emit(&workspace("w", vec![app]), &ctx(&options)).unwrap();
    let ninja = file(&files, "build.ninja");
    assert!(ninja.contains("-D__compiling_unity__=1"));
    assert!(ninja.contains("build .intermediate/app/.unity/app/unity_0.cpp.o: CXX_APP .unity/app/unity_0.cpp\n"));
    assert!(!ninja.contains("../a.cpp"));
    assert_eq!(
      file(&files, ".unity/app/unity_0.cpp"),
      "#include \"../../../a.cpp\"\n#include \"../../../b.cpp\"\n"
    );
  }

  #[test]
  fn colliding_labels_get_distinct_rules() {
    let options = ninja_options();
    let ws = workspace(
      "w",
      vec![
        project("my-lib", BuildKind::Static, &["a.cpp"]),
        project("my_lib", BuildKind::Static, &["b.cpp"]),
        project("tool", BuildKind::Console, &["main.cpp"]),
      ],
    );
    let files = emit(&ws, &ctx(&options)).unwrap();
    let ninja = file(&files, "build.ninja");

    let dash = format!("MY_LIB_{}", &object_id(&["ninja-rule", "my-lib"])[..6]);
    let under = format!("MY_LIB_{}", &object_id(&["ninja-rule", "my_lib"])[..6]);
    assert_ne!(dash, under);
    assert!(ninja.contains(&format!("rule CXX_{}\n", dash)));
    assert!(ninja.contains(&format!("rule CXX_{}\n", under)));
    assert!(!ninja.contains("rule CXX_MY_LIB\n"));
    assert_eq!(ninja.matches(&format!("{}_CFLAGS = ", dash)).count(), 1);
    assert!(ninja.contains("rule CXX_TOOL\n"));
  }

  #[test]
  fn empty_siblings_are_not_linked() {
    let options = ninja_options();
    let mut app = project("app", BuildKind::Console, &["main.cpp"]);
    app.project.link_with.append("headers_only");
    let ws = workspace("w", vec![app, project("headers_only", BuildKind::Static, &[])]);
    let files = emit(&ws, &ctx(&options)).unwrap();
    let ninja = file(&files, "build.ninja");
    assert!(!ninja.contains("libheaders_only.a"));
    assert!(ninja.contains("build .output/app: ELF_LINKER_APP .intermediate/app/main.cpp.o\n"));
  }
}
