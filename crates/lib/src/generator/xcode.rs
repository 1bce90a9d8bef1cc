//! Xcode emitter.
//!
//! Each pass writes one `<sub-platform>/<label>.xcodeproj/project.pbxproj`
//! per project. The driver ties the passes together with a single
//! `.xcworkspace` built by [`workspace_file`].
//!
//! Object identifiers are derived from the pass, the project label and the
//! object's role, so regenerating an unchanged script is byte-identical.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use tracing::debug;

use super::unity;
use super::{EmitContext, EmitError, OutputFile, external_links, log_unused, sibling_links, xml_escape};
use crate::discovery::{ResolvedProject, ResolvedWorkspace};
use crate::model::{BuildKind, Project};
use crate::options::{SubPlatform, XcodeVersion};
use crate::util::hash::object_id;
use crate::util::path::is_absolute_str;

/// Depth of a project's source root below the output directory.
const PROJECT_DEPTH: usize = 1;

/// `buildActionMask` Xcode writes for every build phase.
const BUILD_ACTION_MASK: &str = "2147483647";

#[derive(Debug, Clone)]
enum Value {
  Str(String),
  Ref(String, String),
  List(Vec<Value>),
  Dict(Vec<(String, Value)>),
}

fn s(value: impl Into<String>) -> Value {
  Value::Str(value.into())
}

fn r(id: &str, comment: &str) -> Value {
  Value::Ref(id.to_string(), comment.to_string())
}

fn strings<I, S>(items: I) -> Value
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  Value::List(items.into_iter().map(|item| Value::Str(item.into())).collect())
}

fn dict(entries: Vec<(&str, Value)>) -> Value {
  Value::Dict(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// Quote a plist string unless it is a bare word.
fn quote(text: &str) -> String {
  let bare = !text.is_empty()
    && !text.contains("//")
    && !text.contains("/*")
    && text
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.'));
  if bare {
    return text.to_string();
  }
  let mut out = String::with_capacity(text.len() + 2);
  out.push('"');
  for c in text.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      '\t' => out.push_str("\\t"),
      _ => out.push(c),
    }
  }
  out.push('"');
  out
}

fn tabs(out: &mut String, depth: usize) {
  for _ in 0..depth {
    out.push('\t');
  }
}

impl Value {
  fn render(&self, indent: usize, out: &mut String) {
    match self {
      Value::Str(text) => out.push_str(&quote(text)),
      Value::Ref(id, comment) => {
        let _ = write!(out, "{} /* {} */", id, comment);
      }
      Value::List(items) => {
        out.push_str("(\n");
        for item in items {
          tabs(out, indent + 1);
          item.render(indent + 1, out);
          out.push_str(",\n");
        }
        tabs(out, indent);
        out.push(')');
      }
      Value::Dict(entries) => {
        out.push_str("{\n");
        for (key, value) in entries {
          tabs(out, indent + 1);
          let _ = write!(out, "{} = ", quote(key));
          value.render(indent + 1, out);
          out.push_str(";\n");
        }
        tabs(out, indent);
        out.push('}');
      }
    }
  }

  fn render_inline(&self, out: &mut String) {
    match self {
      Value::List(items) => {
        out.push('(');
        for item in items {
          item.render_inline(out);
          out.push_str(", ");
        }
        out.push(')');
      }
      Value::Dict(entries) => {
        out.push('{');
        for (key, value) in entries {
          let _ = write!(out, "{} = ", quote(key));
          value.render_inline(out);
          out.push_str("; ");
        }
        out.push('}');
      }
      other => other.render(0, out),
    }
  }
}

struct Object {
  id: String,
  comment: String,
  isa: &'static str,
  fields: Vec<(String, Value)>,
}

impl Object {
  fn new(id: &str, comment: impl Into<String>, isa: &'static str) -> Self {
    Self {
      id: id.to_string(),
      comment: comment.into(),
      isa,
      fields: vec![("isa".to_string(), s(isa))],
    }
  }

  fn with(mut self, key: &str, value: Value) -> Self {
    self.fields.push((key.to_string(), value));
    self
  }

  fn render(self, out: &mut String) {
    let inline = matches!(self.isa, "PBXBuildFile" | "PBXFileReference");
    tabs(out, 2);
    if self.comment.is_empty() {
      let _ = write!(out, "{} = ", self.id);
    } else {
      let _ = write!(out, "{} /* {} */ = ", self.id, self.comment);
    }
    let body = Value::Dict(self.fields);
    if inline {
      body.render_inline(out);
    } else {
      body.render(2, out);
    }
    out.push_str(";\n");
  }
}

/// Serialize objects into a complete `project.pbxproj`, one section per isa.
fn render_document(objects: Vec<Object>, root: &str, version: XcodeVersion) -> String {
  let mut sections: BTreeMap<&'static str, Vec<Object>> = BTreeMap::new();
  for object in objects {
    sections.entry(object.isa).or_default().push(object);
  }

  let mut out = String::from("// !$*UTF8*$!\n{\n\tarchiveVersion = 1;\n\tclasses = {\n\t};\n");
  let _ = write!(out, "\tobjectVersion = {};\n\tobjects = {{\n", version.object_version());
  for (isa, mut objects) in sections {
    objects.sort_by(|a, b| a.id.cmp(&b.id));
    let _ = write!(out, "\n/* Begin {} section */\n", isa);
    for object in objects {
      object.render(&mut out);
    }
    let _ = writeln!(out, "/* End {} section */", isa);
  }
  let _ = write!(out, "\t}};\n\trootObject = {} /* Project object */;\n}}\n", root);
  out
}

fn file_name(path: &str) -> &str {
  path.rsplit('/').next().unwrap_or(path)
}

fn extension(path: &str) -> String {
  let name = file_name(path);
  match name.rfind('.') {
    Some(dot) if dot > 0 => name[dot + 1..].to_ascii_lowercase(),
    _ => String::new(),
  }
}

/// `lastKnownFileType` for a file.
fn file_type(path: &str) -> &'static str {
  match extension(path).as_str() {
    "cpp" | "cc" | "cxx" => "sourcecode.cpp.cpp",
    "c" => "sourcecode.c.c",
    "m" => "sourcecode.c.objc",
    "mm" => "sourcecode.cpp.objcpp",
    "h" => "sourcecode.c.h",
    "hpp" | "hh" | "hxx" | "inl" => "sourcecode.cpp.h",
    "xcassets" => "folder.assetcatalog",
    "plist" => "text.plist.xml",
    "framework" => "wrapper.framework",
    "a" => "archive.ar",
    "dylib" => "compiled.mach-o.dylib",
    "tbd" => "sourcecode.text-based-dylib-definition",
    "storyboard" => "file.storyboard",
    "xib" => "file.xib",
    "strings" => "text.plist.strings",
    "json" => "text.json",
    "png" => "image.png",
    "metal" => "sourcecode.metal",
    "" => "folder",
    _ => "file",
  }
}

/// Product file name, file type and product type for a build kind.
fn product(label: &str, kind: BuildKind) -> (String, &'static str, &'static str) {
  match kind {
    BuildKind::Application => (
      format!("{}.app", label),
      "wrapper.application",
      "com.apple.product-type.application",
    ),
    BuildKind::Console => (
      label.to_string(),
      "compiled.mach-o.executable",
      "com.apple.product-type.tool",
    ),
    BuildKind::Static => (
      format!("lib{}.a", label),
      "archive.ar",
      "com.apple.product-type.library.static",
    ),
    BuildKind::Shared => (
      format!("lib{}.dylib", label),
      "compiled.mach-o.dylib",
      "com.apple.product-type.library.dynamic",
    ),
    BuildKind::Framework => (
      format!("{}.framework", label),
      "wrapper.framework",
      "com.apple.product-type.framework",
    ),
    BuildKind::Bundle => (
      format!("{}.bundle", label),
      "wrapper.cfbundle",
      "com.apple.product-type.bundle",
    ),
  }
}

/// Projects emitted in a pass, honoring `os_target`.
pub fn pass_members(workspace: &ResolvedWorkspace, sub: SubPlatform) -> Vec<(String, BuildKind)> {
  workspace
    .projects
    .iter()
    .filter(|resolved| targets(&resolved.project, sub))
    .map(|resolved| (resolved.project.label.clone(), resolved.project.build_kind()))
    .collect()
}

fn targets(project: &Project, sub: SubPlatform) -> bool {
  match &project.apple.os_target {
    Some(os) => os.eq_ignore_ascii_case(sub.as_str()),
    None => true,
  }
}

pub fn emit(workspace: &ResolvedWorkspace, ctx: &EmitContext) -> Result<Vec<OutputFile>, EmitError> {
  let sub = ctx.sub_platform.unwrap_or(SubPlatform::Macos);
  let version = ctx.options.xcode_version().unwrap_or(XcodeVersion::V12);

  let mut files = Vec::new();
  for resolved in &workspace.projects {
    if !targets(&resolved.project, sub) {
      debug!(project = %resolved.project.label, pass = %sub, "os_target excludes project from pass");
      continue;
    }
    let writer = ProjectWriter::new(ctx, sub, &resolved.project.label);
    files.extend(writer.write(workspace, resolved, version)?);
  }
  Ok(files)
}

/// Build the `.xcworkspace` tying every pass's projects together.
pub fn workspace_file(name: &str, passes: &[(SubPlatform, Vec<(String, BuildKind)>)]) -> OutputFile {
  let mut libraries = Vec::new();
  let mut apps = Vec::new();
  for (sub, members) in passes {
    for (label, kind) in members {
      let location = format!("group:{}/{}.xcodeproj", sub, label);
      if kind.is_executable() {
        apps.push(location);
      } else {
        libraries.push(location);
      }
    }
  }

  let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Workspace\n   version = \"1.0\">\n");
  for (group, refs) in [("Libraries", &libraries), ("Apps", &apps)] {
    if refs.is_empty() {
      continue;
    }
    let _ = write!(
      out,
      "   <Group\n      location = \"container:\"\n      name = \"{}\">\n",
      group
    );
    for location in refs {
      let _ = write!(
        out,
        "      <FileRef\n         location = \"{}\">\n      </FileRef>\n",
        xml_escape(location)
      );
    }
    out += "   </Group>\n";
  }
  out += "</Workspace>\n";
  OutputFile::new(format!("{}.xcworkspace/contents.xcworkspacedata", name), out)
}

/// Entitlements plist for JIT and library validation exceptions.
fn entitlements(project: &Project) -> Option<String> {
  let keys: Vec<&str> = [
    (project.apple.enable_jit, "com.apple.security.cs.allow-jit"),
    (
      project.apple.disable_library_validation,
      "com.apple.security.cs.disable-library-validation",
    ),
  ]
  .into_iter()
  .filter_map(|(set, key)| set.then_some(key))
  .collect();
  if keys.is_empty() {
    return None;
  }
  let mut out = String::from(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n<plist version=\"1.0\">\n<dict>\n",
  );
  for key in keys {
    let _ = write!(out, "\t<key>{}</key>\n\t<true/>\n", key);
  }
  out += "</dict>\n</plist>\n";
  Some(out)
}

/// A file placed in a group and optionally in a build phase.
struct Member {
  id: String,
  name: String,
}

struct ProjectWriter<'a> {
  ctx: &'a EmitContext<'a>,
  sub: SubPlatform,
  label: &'a str,
  objects: Vec<Object>,
  seen: BTreeSet<String>,
}

impl<'a> ProjectWriter<'a> {
  fn new(ctx: &'a EmitContext<'a>, sub: SubPlatform, label: &'a str) -> Self {
    Self {
      ctx,
      sub,
      label,
      objects: Vec::new(),
      seen: BTreeSet::new(),
    }
  }

  fn id(&self, parts: &[&str]) -> String {
    let mut all = vec![self.sub.as_str(), self.label];
    all.extend_from_slice(parts);
    object_id(&all)
  }

  /// Add an object; a file referenced twice keeps its first entry.
  fn push(&mut self, object: Object) {
    if self.seen.insert(object.id.clone()) {
      self.objects.push(object);
    }
  }

  /// Reference a script-relative file.
  fn file_ref(&mut self, path: &str) -> Member {
    let (xcode_path, tree) = if is_absolute_str(path) {
      (path.to_string(), "<absolute>")
    } else {
      (self.ctx.path_at(PROJECT_DEPTH, path), "SOURCE_ROOT")
    };
    let name = file_name(path).to_string();
    let id = self.id(&["fileref", path]);
    self.push(
      Object::new(&id, name.clone(), "PBXFileReference")
        .with("lastKnownFileType", s(file_type(path)))
        .with("name", s(name.clone()))
        .with("path", s(xcode_path))
        .with("sourceTree", s(tree)),
    );
    Member { id, name }
  }

  /// Reference a generated unity unit, given relative to the output directory.
  fn unit_ref(&mut self, unit: &str) -> Member {
    let name = file_name(unit).to_string();
    let id = self.id(&["unit", unit]);
    self.push(
      Object::new(&id, name.clone(), "PBXFileReference")
        .with("lastKnownFileType", s(file_type(unit)))
        .with("name", s(name.clone()))
        .with("path", s(format!("{}{}", "../".repeat(PROJECT_DEPTH), unit)))
        .with("sourceTree", s("SOURCE_ROOT")),
    );
    Member { id, name }
  }

  /// Reference a product built by this or a sibling project.
  fn product_ref(&mut self, name: &str, file_type: &str) -> Member {
    let id = self.id(&["product", name]);
    self.push(
      Object::new(&id, name, "PBXFileReference")
        .with("explicitFileType", s(file_type))
        .with("includeInIndex", s("0"))
        .with("path", s(name))
        .with("sourceTree", s("BUILT_PRODUCTS_DIR")),
    );
    Member {
      id,
      name: name.to_string(),
    }
  }

  fn build_file(&mut self, member: &Member, phase: &str, settings: Option<Value>) -> Value {
    let id = self.id(&["buildfile", phase, &member.id]);
    let comment = format!("{} in {}", member.name, phase);
    let mut object = Object::new(&id, comment.clone(), "PBXBuildFile").with("fileRef", r(&member.id, &member.name));
    if let Some(settings) = settings {
      object = object.with("settings", settings);
    }
    self.push(object);
    r(&id, &comment)
  }

  fn group(&mut self, role: &str, name: &str, children: &[Member]) -> Member {
    let id = self.id(&["group", role]);
    self.push(
      Object::new(&id, name, "PBXGroup")
        .with(
          "children",
          Value::List(children.iter().map(|c| r(&c.id, &c.name)).collect()),
        )
        .with("name", s(name))
        .with("sourceTree", s("<group>")),
    );
    Member {
      id,
      name: name.to_string(),
    }
  }

  fn phase(&mut self, isa: &'static str, name: &str, files: Vec<Value>, extra: Vec<(&str, Value)>) -> Value {
    let id = self.id(&["phase", name]);
    let mut object = Object::new(&id, name, isa)
      .with("buildActionMask", s(BUILD_ACTION_MASK))
      .with("files", Value::List(files));
    for (key, value) in extra {
      object = object.with(key, value);
    }
    object = object.with("runOnlyForDeploymentPostprocessing", s("0"));
    self.push(object);
    r(&id, name)
  }

  fn write(
    mut self,
    workspace: &ResolvedWorkspace,
    resolved: &ResolvedProject,
    version: XcodeVersion,
  ) -> Result<Vec<OutputFile>, EmitError> {
    let ctx = self.ctx;
    let project = &resolved.project;
    let files = &resolved.files;
    let label = self.label;
    let kind = project.build_kind();

    if self.sub == SubPlatform::Ios && matches!(kind, BuildKind::Console | BuildKind::Shared | BuildKind::Bundle) {
      return Err(EmitError::UnsupportedKind {
        project: label.to_string(),
        kind,
        platform: "ios",
      });
    }

    log_unused(
      project,
      "xcode",
      &[
        ("winsdk", project.microsoft.winsdk.is_some()),
        ("toolchain", project.microsoft.toolchain.is_some()),
        ("def", project.microsoft.def.is_some()),
      ],
    );

    let links_binary = kind != BuildKind::Static;
    let embeds = matches!(kind, BuildKind::Application | BuildKind::Framework | BuildKind::Bundle)
      && !project.apple.no_embed_and_sign;
    let exports_headers = matches!(kind, BuildKind::Static | BuildKind::Shared | BuildKind::Framework);
    let bundles_resources = matches!(kind, BuildKind::Application | BuildKind::Framework | BuildKind::Bundle);

    // Sources and headers. Unity units replace the sources they include.
    let plan = unity::plan(resolved, ctx);
    let mut source_members = Vec::new();
    let mut sources_phase = Vec::new();
    for src in &plan.individual {
      let member = self.file_ref(src);
      sources_phase.push(self.build_file(&member, "Sources", None));
      source_members.push(member);
    }
    for unit in plan.unit_paths() {
      let member = self.unit_ref(&unit);
      sources_phase.push(self.build_file(&member, "Sources", None));
      source_members.push(member);
    }

    let mut headers_phase = Vec::new();
    for header in &files.headers {
      let member = self.file_ref(header);
      if exports_headers {
        let public = project.apple.export_headers.iter().any(|entry| header.contains(entry));
        let attribute = if public { "Public" } else { "Project" };
        let settings = dict(vec![("ATTRIBUTES", strings([attribute]))]);
        headers_phase.push(self.build_file(&member, "Headers", Some(settings)));
      }
      source_members.push(member);
    }
    for entry in project.apple.export_refs.iter() {
      let member = self.file_ref(entry);
      if exports_headers {
        let settings = dict(vec![("ATTRIBUTES", strings(["Public"]))]);
        headers_phase.push(self.build_file(&member, "Headers", Some(settings)));
      }
      source_members.push(member);
    }

    // Resources.
    let mut resource_members = Vec::new();
    let mut resources_phase = Vec::new();
    for res in &files.resources {
      let member = self.file_ref(res);
      if bundles_resources {
        resources_phase.push(self.build_file(&member, "Resources", None));
      }
      resource_members.push(member);
    }

    // Libraries, frameworks and sibling products.
    let mut link_members = Vec::new();
    let mut frameworks_phase = Vec::new();
    let mut embed_phase = Vec::new();
    let mut linkables: Vec<Member> = files
      .libraries
      .iter()
      .chain(&files.frameworks)
      .map(|path| self.file_ref(path))
      .collect();
    for sibling in sibling_links(workspace, project) {
      let sibling_kind = sibling.project.build_kind();
      if !sibling_kind.is_library() {
        continue;
      }
      let (name, file_type, _) = product(&sibling.project.label, sibling_kind);
      linkables.push(self.product_ref(&name, file_type));
    }
    for member in linkables {
      if links_binary {
        frameworks_phase.push(self.build_file(&member, "Frameworks", None));
        let embeddable = member.name.ends_with(".framework") || member.name.ends_with(".dylib");
        if embeds && embeddable && project.apple.embed_and_sign.iter().any(|e| member.name.contains(e)) {
          let settings = dict(vec![(
            "ATTRIBUTES",
            strings(["CodeSignOnCopy", "RemoveHeadersOnCopy"]),
          )]);
          embed_phase.push(self.build_file(&member, "Embed Frameworks", Some(settings)));
        }
      }
      link_members.push(member);
    }

    // Product and groups.
    let (product_name, product_type_file, product_type) = product(label, kind);
    let product_id = self.id(&["product", &product_name]);
    self.push(
      Object::new(&product_id, product_name.clone(), "PBXFileReference")
        .with("explicitFileType", s(product_type_file))
        .with("includeInIndex", s("0"))
        .with("path", s(product_name.clone()))
        .with("sourceTree", s("BUILT_PRODUCTS_DIR")),
    );
    let product_member = Member {
      id: product_id.clone(),
      name: product_name.clone(),
    };

    let mut main_children = Vec::new();
    main_children.push(self.group("sources", label, &source_members));
    if !resource_members.is_empty() {
      main_children.push(self.group("resources", "Resources", &resource_members));
    }
    if !link_members.is_empty() {
      main_children.push(self.group("frameworks", "Frameworks", &link_members));
    }
    let products_group = self.group("products", "Products", &[product_member]);
    let products_group_id = products_group.id.clone();
    main_children.push(products_group);
    let main_group_id = self.id(&["group", "main"]);
    self.push(
      Object::new(&main_group_id, "", "PBXGroup")
        .with(
          "children",
          Value::List(main_children.iter().map(|c| r(&c.id, &c.name)).collect()),
        )
        .with("sourceTree", s("<group>")),
    );

    // Build phases, in the order Xcode runs them.
    let mut phases = vec![self.phase("PBXFrameworksBuildPhase", "Frameworks", frameworks_phase, vec![])];
    if exports_headers && !headers_phase.is_empty() {
      phases.push(self.phase("PBXHeadersBuildPhase", "Headers", headers_phase, vec![]));
    }
    phases.push(self.phase("PBXSourcesBuildPhase", "Sources", sources_phase, vec![]));
    if bundles_resources {
      phases.push(self.phase("PBXResourcesBuildPhase", "Resources", resources_phase, vec![]));
    }
    if !embed_phase.is_empty() {
      phases.push(self.phase(
        "PBXCopyFilesBuildPhase",
        "Embed Frameworks",
        embed_phase,
        vec![
          ("dstPath", s("")),
          ("dstSubfolderSpec", s("10")),
          ("name", s("Embed Frameworks")),
        ],
      ));
    }
    if let Some(script) = &project.install_script {
      let command = format!("\"${{SRCROOT}}/{}\"\n", ctx.path_at(PROJECT_DEPTH, script));
      phases.push(self.phase(
        "PBXShellScriptBuildPhase",
        "Install",
        vec![],
        vec![
          ("inputPaths", Value::List(vec![])),
          ("name", s("Install")),
          ("outputPaths", Value::List(vec![])),
          ("shellPath", s("/bin/sh")),
          ("shellScript", s(command)),
        ],
      ));
    }

    // Build configurations.
    let mut outputs = plan.units;
    let entitlements_file = if self.sub == SubPlatform::Macos {
      entitlements(project).map(|plist| {
        let name = format!("{}.entitlements", label);
        outputs.push(OutputFile::new(format!("{}/{}", self.sub, name), plist));
        name
      })
    } else {
      None
    };

    let mut project_configs = Vec::new();
    let mut target_configs = Vec::new();
    for release in [false, true] {
      let config_name = if release { "Release" } else { "Debug" };
      let project_settings = self.project_settings(project, release)?;
      let target_settings = self.target_settings(workspace, resolved, entitlements_file.as_deref());

      let project_config = self.id(&["config", "project", config_name]);
      self.push(
        Object::new(&project_config, config_name, "XCBuildConfiguration")
          .with("buildSettings", project_settings)
          .with("name", s(config_name)),
      );
      project_configs.push(r(&project_config, config_name));

      let target_config = self.id(&["config", "target", config_name]);
      self.push(
        Object::new(&target_config, config_name, "XCBuildConfiguration")
          .with("buildSettings", target_settings)
          .with("name", s(config_name)),
      );
      target_configs.push(r(&target_config, config_name));
    }

    let project_list = self.id(&["configlist", "project"]);
    let project_list_comment = format!("Build configuration list for PBXProject \"{}\"", label);
    self.push(
      Object::new(&project_list, project_list_comment.clone(), "XCConfigurationList")
        .with("buildConfigurations", Value::List(project_configs))
        .with("defaultConfigurationIsVisible", s("0"))
        .with("defaultConfigurationName", s("Release")),
    );
    let target_list = self.id(&["configlist", "target"]);
    let target_list_comment = format!("Build configuration list for PBXNativeTarget \"{}\"", label);
    self.push(
      Object::new(&target_list, target_list_comment.clone(), "XCConfigurationList")
        .with("buildConfigurations", Value::List(target_configs))
        .with("defaultConfigurationIsVisible", s("0"))
        .with("defaultConfigurationName", s("Release")),
    );

    // Target and project.
    let target_id = self.id(&["target"]);
    self.push(
      Object::new(&target_id, label, "PBXNativeTarget")
        .with("buildConfigurationList", r(&target_list, &target_list_comment))
        .with("buildPhases", Value::List(phases))
        .with("buildRules", Value::List(vec![]))
        .with("dependencies", Value::List(vec![]))
        .with("name", s(label))
        .with("productName", s(label))
        .with("productReference", r(&product_id, &product_name))
        .with("productType", s(product_type)),
    );

    let mut attributes = vec![
      ("BuildIndependentTargetsInParallel", s("1")),
      ("LastUpgradeCheck", s(last_upgrade_check(version))),
    ];
    if let Some(org) = &project.apple.organization {
      attributes.push(("ORGANIZATIONNAME", s(org.clone())));
    }
    let project_id = self.id(&["project"]);
    self.push(
      Object::new(&project_id, "Project object", "PBXProject")
        .with("attributes", dict(attributes))
        .with("buildConfigurationList", r(&project_list, &project_list_comment))
        .with("compatibilityVersion", s(version.compatibility()))
        .with("developmentRegion", s("en"))
        .with("hasScannedForEncodings", s("0"))
        .with("knownRegions", strings(["en", "Base"]))
        .with("mainGroup", Value::Str(main_group_id))
        .with("productRefGroup", r(&products_group_id, "Products"))
        .with("projectDirPath", s(""))
        .with("projectRoot", s(""))
        .with("targets", Value::List(vec![r(&target_id, label)])),
    );

    let document = render_document(self.objects, &project_id, version);
    outputs.insert(
      0,
      OutputFile::new(format!("{}/{}.xcodeproj/project.pbxproj", self.sub, label), document),
    );
    Ok(outputs)
  }

  fn project_settings(&self, project: &Project, release: bool) -> Result<Value, EmitError> {
    let ctx = self.ctx;
    let deployment = project
      .apple
      .deployment
      .clone()
      .unwrap_or_else(|| ctx.options.deployment.clone());
    let sdk_root = match &project.apple.sdk_version {
      Some(version) => format!("{}{}", self.sub.sdk_root(), version),
      None => self.sub.sdk_root().to_string(),
    };
    let defines = std::iter::once("$(inherited)".to_string()).chain(ctx.defines(project, release));

    let mut settings = vec![
      ("ALWAYS_SEARCH_USER_PATHS", s("NO")),
      ("CLANG_CXX_LANGUAGE_STANDARD", s(ctx.cpp_standard(project)?.as_str())),
      ("CLANG_CXX_LIBRARY", s("libc++")),
      ("CLANG_ENABLE_MODULES", s("YES")),
      ("CLANG_ENABLE_OBJC_ARC", s(yes_no(project.arc_enabled()))),
      ("COPY_PHASE_STRIP", s("NO")),
      (
        "DEBUG_INFORMATION_FORMAT",
        s(if release { "dwarf-with-dsym" } else { "dwarf" }),
      ),
    ];
    if !release {
      settings.push(("ENABLE_TESTABILITY", s("YES")));
    }
    settings.push(("GCC_C_LANGUAGE_STANDARD", s(ctx.c_standard(project)?.as_str())));
    settings.push(("GCC_OPTIMIZATION_LEVEL", s(if release { "s" } else { "0" })));
    settings.push(("GCC_PREPROCESSOR_DEFINITIONS", strings(defines)));
    settings.push((self.sub.deployment_setting(), s(deployment)));
    if !release {
      settings.push(("ONLY_ACTIVE_ARCH", s("YES")));
    }
    settings.push(("SDKROOT", s(sdk_root)));
    if release {
      settings.push(("VALIDATE_PRODUCT", s("YES")));
    }
    Ok(dict(settings))
  }

  fn target_settings(&self, workspace: &ResolvedWorkspace, resolved: &ResolvedProject, entitlements: Option<&str>) -> Value {
    let ctx = self.ctx;
    let project = &resolved.project;
    let files = &resolved.files;
    let kind = project.build_kind();
    let search = |dirs: &[String]| {
      strings(std::iter::once("$(inherited)".to_string()).chain(dirs.iter().map(|dir| ctx.path_at(PROJECT_DEPTH, dir))))
    };

    let mut settings = Vec::new();
    if project.apple.universal {
      settings.push(("ARCHS", s("$(ARCHS_STANDARD)")));
    } else if project.apple.apple_silicon {
      settings.push(("ARCHS", s("arm64")));
    }
    if let Some(path) = entitlements {
      settings.push(("CODE_SIGN_ENTITLEMENTS", s(path)));
    }
    settings.push(("CODE_SIGN_STYLE", s("Automatic")));
    if let Some(team) = &project.apple.team {
      settings.push(("DEVELOPMENT_TEAM", s(team.clone())));
    }
    if matches!(kind, BuildKind::Shared | BuildKind::Framework) {
      settings.push(("DYLIB_INSTALL_NAME_BASE", s("@rpath")));
    }
    settings.push(("ENABLE_HARDENED_RUNTIME", s(yes_no(project.apple.hardened_runtime))));
    if !files.framework_dirs.is_empty() {
      settings.push(("FRAMEWORK_SEARCH_PATHS", search(&files.framework_dirs)));
    }
    if let Some(prefix) = &project.prefix_header {
      settings.push(("GCC_PRECOMPILE_PREFIX_HEADER", s("YES")));
      settings.push(("GCC_PREFIX_HEADER", s(ctx.path_at(PROJECT_DEPTH, prefix))));
    }
    if matches!(kind, BuildKind::Application | BuildKind::Framework | BuildKind::Bundle) {
      settings.push(("GENERATE_INFOPLIST_FILE", s("YES")));
    }
    if matches!(kind, BuildKind::Application | BuildKind::Framework) {
      let runpath = match (self.sub, kind) {
        (SubPlatform::Macos, BuildKind::Application) => "@executable_path/../Frameworks",
        (SubPlatform::Macos, _) => "@loader_path/Frameworks",
        _ => "@executable_path/Frameworks",
      };
      settings.push(("LD_RUNPATH_SEARCH_PATHS", strings(["$(inherited)", runpath])));
    }
    if !files.library_dirs.is_empty() {
      settings.push(("LIBRARY_SEARCH_PATHS", search(&files.library_dirs)));
    }
    settings.push(("OTHER_LDFLAGS", strings(self.linker_flags(workspace, resolved))));
    if matches!(kind, BuildKind::Application | BuildKind::Framework | BuildKind::Bundle) {
      let bundle_id = project.apple.bundle_id.clone().unwrap_or_else(|| {
        let org = project.apple.organization.as_deref().unwrap_or("cog");
        format!("com.{}.{}", identifier_part(org), identifier_part(&project.label))
      });
      settings.push(("PRODUCT_BUNDLE_IDENTIFIER", s(bundle_id)));
    }
    settings.push(("PRODUCT_NAME", s("$(TARGET_NAME)")));
    if kind.is_library() {
      settings.push(("SKIP_INSTALL", s("YES")));
    }
    if !files.include_dirs.is_empty() {
      settings.push(("SYSTEM_HEADER_SEARCH_PATHS", search(&files.include_dirs)));
    }
    if self.sub == SubPlatform::Ios {
      settings.push(("TARGETED_DEVICE_FAMILY", s("1,2")));
    }
    dict(settings)
  }

  fn linker_flags(&self, workspace: &ResolvedWorkspace, resolved: &ResolvedProject) -> Vec<String> {
    let project = &resolved.project;
    let load_all = &project.apple.load_all;
    let mut flags = vec!["$(inherited)".to_string()];
    if project.build_kind() == BuildKind::Static {
      return flags;
    }

    if load_all.iter().any(|entry| entry == "*" || entry.eq_ignore_ascii_case("all")) {
      flags.push("-all_load".to_string());
    } else if !load_all.is_empty() {
      for lib in &resolved.files.libraries {
        if load_all.iter().any(|entry| file_name(lib).contains(entry)) {
          flags.push("-force_load".to_string());
          flags.push(self.ctx.path_at(PROJECT_DEPTH, lib));
        }
      }
      for sibling in sibling_links(workspace, project) {
        if sibling.project.build_kind() == BuildKind::Static && load_all.contains(&sibling.project.label) {
          flags.push("-force_load".to_string());
          flags.push(format!("$(BUILT_PRODUCTS_DIR)/lib{}.a", sibling.project.label));
        }
      }
    }

    for entry in external_links(workspace, project) {
      match entry.strip_suffix(".framework") {
        Some(framework) => {
          flags.push("-framework".to_string());
          flags.push(framework.to_string());
        }
        None => flags.push(format!("-l{}", entry)),
      }
    }
    for lib in project.libs.iter() {
      flags.push(format!("-l{}", lib));
    }
    flags
  }
}

fn yes_no(value: bool) -> &'static str {
  if value { "YES" } else { "NO" }
}

fn last_upgrade_check(version: XcodeVersion) -> &'static str {
  match version {
    XcodeVersion::V11 => "1120",
    XcodeVersion::V12 => "1200",
    XcodeVersion::V14 => "1400",
    XcodeVersion::V15 => "1500",
    XcodeVersion::V16 => "1600",
  }
}

/// Lower-case reverse-DNS component.
fn identifier_part(text: &str) -> String {
  text
    .chars()
    .filter_map(|c| match c {
      c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
      '-' | '.' => Some(c),
      ' ' | '_' => Some('-'),
      _ => None,
    })
    .collect()
}
