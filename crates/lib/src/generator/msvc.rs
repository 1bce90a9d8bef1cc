//! Visual Studio solution and `.vcxproj` emitter.

use std::fmt::{self, Write as _};

use tracing::debug;

use super::unity::{self, UnityPlan};
use super::{EmitContext, EmitError, OutputFile, external_links, log_unused, sibling_links, xml_escape};
use crate::consts::{INTERMEDIATE_DIR, PRODUCT_DIR};
use crate::discovery::{ResolvedProject, ResolvedWorkspace};
use crate::model::BuildKind;
use crate::util::hash::{project_guid, solution_guid};

const VS_CPP_GUID: &str = "8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942";

/// Windows SDK used when a project does not name one.
const DEFAULT_WINSDK: &str = "10.0.22000.0";

#[derive(Clone, Copy, PartialEq, Eq)]
enum ConfigType {
  Debug,
  Release,
}

impl ConfigType {
  const ALL: [ConfigType; 2] = [ConfigType::Debug, ConfigType::Release];

  fn optimization(&self) -> &str {
    match self {
      ConfigType::Debug => "Disabled",
      ConfigType::Release => "MaxSpeed",
    }
  }

  fn runtime_library(&self) -> &str {
    match self {
      ConfigType::Debug => "MultiThreadedDebugDLL",
      ConfigType::Release => "MultiThreadedDLL",
    }
  }

  fn is_release(&self) -> bool {
    *self == ConfigType::Release
  }
}

impl fmt::Display for ConfigType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ConfigType::Debug => "Debug",
      ConfigType::Release => "Release",
    };
    write!(f, "{}", s)
  }
}

struct VsProject {
  name: String,
  guid: String,
  dependencies: Vec<String>,
}

impl VsProject {
  fn to_sln_project_section(&self) -> String {
    let mut ret = format!(
      "Project(\"{{{}}}\") = \"{}\", \"{}.vcxproj\", \"{}\"\n",
      VS_CPP_GUID, self.name, self.name, self.guid
    );
    if !self.dependencies.is_empty() {
      ret += "\tProjectSection(ProjectDependencies) = postProject\n";
      for dep in &self.dependencies {
        let _ = writeln!(ret, "\t\t{} = {}", dep, dep);
      }
      ret += "\tEndProjectSection\n";
    }
    ret += "EndProject\n";
    ret
  }
}

fn win_path(path: &str) -> String {
  path.replace('/', "\\")
}

fn configuration_type(kind: BuildKind) -> &'static str {
  match kind {
    BuildKind::Application | BuildKind::Console => "Application",
    BuildKind::Static => "StaticLibrary",
    BuildKind::Shared | BuildKind::Framework | BuildKind::Bundle => "DynamicLibrary",
  }
}

/// `foo` becomes `foo.lib`; paths and names with an extension are kept.
fn library_name(entry: &str) -> String {
  if entry.contains('.') || entry.contains('/') {
    win_path(entry)
  } else {
    format!("{}.lib", entry)
  }
}

pub fn emit(workspace: &ResolvedWorkspace, ctx: &EmitContext) -> Result<Vec<OutputFile>, EmitError> {
  let mut files = Vec::new();
  let mut vs_projects = Vec::new();

  for resolved in &workspace.projects {
    let plan = unity::plan(resolved, ctx);
    let (contents, vs_project) = make_vcxproj(workspace, resolved, &plan, ctx)?;
    files.push(OutputFile::new(format!("{}.vcxproj", resolved.project.label), contents));
    files.extend(plan.units);
    vs_projects.push(vs_project);
  }

  let sln = make_solution(&workspace.name, &vs_projects, ctx);
  files.insert(0, OutputFile::new(format!("{}.sln", workspace.name), sln));
  Ok(files)
}

fn make_solution(name: &str, projects: &[VsProject], ctx: &EmitContext) -> String {
  let (version, full_version) = if ctx.options.vs2022 {
    ("17", "17.0.31903.59")
  } else {
    ("16", "16.0.28701.123")
  };
  let mut sln = format!(
    "\u{feff}\nMicrosoft Visual Studio Solution File, Format Version 12.00\n# Visual Studio Version {}\nVisualStudioVersion = {}\nMinimumVisualStudioVersion = 10.0.40219.1\n",
    version, full_version
  );
  for project in projects {
    sln += &project.to_sln_project_section();
  }
  sln += "Global\n\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\n";
  for config in ConfigType::ALL {
    let _ = writeln!(sln, "\t\t{c}|x64 = {c}|x64", c = config);
  }
  sln += "\tEndGlobalSection\n\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n";
  for project in projects {
    for config in ConfigType::ALL {
      let _ = writeln!(sln, "\t\t{g}.{c}|x64.ActiveCfg = {c}|x64", g = project.guid, c = config);
      let _ = writeln!(sln, "\t\t{g}.{c}|x64.Build.0 = {c}|x64", g = project.guid, c = config);
    }
  }
  sln += "\tEndGlobalSection\n\tGlobalSection(SolutionProperties) = preSolution\n\t\tHideSolutionNode = FALSE\n\tEndGlobalSection\n";
  let _ = write!(
    sln,
    "\tGlobalSection(ExtensibilityGlobals) = postSolution\n\t\tSolutionGuid = {}\n\tEndGlobalSection\nEndGlobal\n",
    solution_guid(name)
  );
  sln
}

fn make_vcxproj(
  workspace: &ResolvedWorkspace,
  resolved: &ResolvedProject,
  plan: &UnityPlan,
  ctx: &EmitContext,
) -> Result<(String, VsProject), EmitError> {
  let project = &resolved.project;
  let label = &project.label;
  let kind = project.build_kind();
  let guid = project_guid(&workspace.name, label);
  let toolset = project
    .microsoft
    .toolchain
    .as_deref()
    .unwrap_or_else(|| ctx.options.platform_tools());
  let winsdk = project.microsoft.winsdk.as_deref().unwrap_or(DEFAULT_WINSDK);
  let charset = if ctx.options.utf16 { "Unicode" } else { "MultiByte" };

  log_unused(
    project,
    "vs",
    &[
      ("bundle_id", project.apple.bundle_id.is_some()),
      ("frameworks", !resolved.files.frameworks.is_empty()),
      ("team", project.apple.team.is_some()),
    ],
  );

  let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
  out += "<Project DefaultTargets=\"Build\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\n";
  out += "  <ItemGroup Label=\"ProjectConfigurations\">\n";
  for config in ConfigType::ALL {
    let _ = write!(
      out,
      "    <ProjectConfiguration Include=\"{c}|x64\">\n      <Configuration>{c}</Configuration>\n      <Platform>x64</Platform>\n    </ProjectConfiguration>\n",
      c = config
    );
  }
  out += "  </ItemGroup>\n";
  let _ = write!(
    out,
    r#"  <PropertyGroup Label="Globals">
    <VCProjectVersion>16.0</VCProjectVersion>
    <Keyword>Win32Proj</Keyword>
    <ProjectGuid>{guid}</ProjectGuid>
    <RootNamespace>{name}</RootNamespace>
    <WindowsTargetPlatformVersion>{winsdk}</WindowsTargetPlatformVersion>
  </PropertyGroup>
  <Import Project="$(VCTargetsPath)\Microsoft.Cpp.default.props" />
"#,
    guid = guid,
    name = xml_escape(label),
    winsdk = xml_escape(winsdk),
  );
  for config in ConfigType::ALL {
    let _ = write!(
      out,
      r#"  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='{c}|x64'" Label="Configuration">
    <ConfigurationType>{ty}</ConfigurationType>
    <UseDebugLibraries>{debug}</UseDebugLibraries>
    <PlatformToolset>{toolset}</PlatformToolset>
    <CharacterSet>{charset}</CharacterSet>
  </PropertyGroup>
"#,
      c = config,
      ty = configuration_type(kind),
      debug = !config.is_release(),
      toolset = xml_escape(toolset),
      charset = charset,
    );
  }
  out += r#"  <Import Project="$(VCTargetsPath)\Microsoft.Cpp.props" />
  <ImportGroup Label="ExtensionSettings" />
  <ImportGroup Label="PropertySheets" />
  <PropertyGroup Label="UserMacros" />
"#;
  for config in ConfigType::ALL {
    let _ = write!(
      out,
      r#"  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='{c}|x64'">
    <OutDir>$(ProjectDir){out_dir}\$(Configuration)\</OutDir>
    <IntDir>$(ProjectDir){int_dir}\{name}\$(Configuration)\</IntDir>
    <TargetName>{name}</TargetName>
  </PropertyGroup>
"#,
      c = config,
      out_dir = PRODUCT_DIR,
      int_dir = INTERMEDIATE_DIR,
      name = xml_escape(label),
    );
  }

  let externals: Vec<String> = external_links(workspace, project)
    .into_iter()
    .map(library_name)
    .collect();
  for config in ConfigType::ALL {
    out += &item_definition_group(config, resolved, &externals, ctx)?;
  }

  // Sources. Unity units live under the output directory already.
  let mut compile: Vec<String> = plan.unit_paths().map(|unit| win_path(&unit)).collect();
  for src in &plan.individual {
    if src.ends_with(".m") || src.ends_with(".mm") {
      debug!(project = %label, source = %src, "objective-c source skipped by vs");
      continue;
    }
    compile.push(win_path(&ctx.path_at(0, src)));
  }
  if !compile.is_empty() {
    out += "  <ItemGroup>\n";
    for src in compile {
      let _ = writeln!(out, "    <ClCompile Include=\"{}\" />", xml_escape(&src));
    }
    out += "  </ItemGroup>\n";
  }
  if !resolved.files.headers.is_empty() {
    out += "  <ItemGroup>\n";
    for header in &resolved.files.headers {
      let _ = writeln!(out, "    <ClInclude Include=\"{}\" />", xml_escape(&win_path(&ctx.path_at(0, header))));
    }
    out += "  </ItemGroup>\n";
  }
  if !resolved.files.resources.is_empty() {
    out += "  <ItemGroup>\n";
    for res in &resolved.files.resources {
      let _ = writeln!(out, "    <None Include=\"{}\" />", xml_escape(&win_path(&ctx.path_at(0, res))));
    }
    out += "  </ItemGroup>\n";
  }

  let mut dependencies = Vec::new();
  let siblings = sibling_links(workspace, project);
  if !siblings.is_empty() {
    out += "  <ItemGroup>\n";
    for sibling in siblings {
      let sibling_guid = project_guid(&workspace.name, &sibling.project.label);
      let _ = write!(
        out,
        r#"    <ProjectReference Include="{name}.vcxproj">
      <Project>{guid}</Project>
      <Name>{name}</Name>
      <ReferenceOutputAssembly>false</ReferenceOutputAssembly>
    </ProjectReference>
"#,
        name = xml_escape(&sibling.project.label),
        guid = sibling_guid,
      );
      dependencies.push(sibling_guid);
    }
    out += "  </ItemGroup>\n";
  }

  out += "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.targets\" />\n";
  out += "  <ImportGroup Label=\"ExtensionTargets\" />\n";
  out += "</Project>\n";

  Ok((
    out,
    VsProject {
      name: label.clone(),
      guid,
      dependencies,
    },
  ))
}

fn item_definition_group(
  config: ConfigType,
  resolved: &ResolvedProject,
  externals: &[String],
  ctx: &EmitContext,
) -> Result<String, EmitError> {
  let project = &resolved.project;
  let kind = project.build_kind();

  let includes: Vec<String> = resolved
    .files
    .include_dirs
    .iter()
    .map(|dir| win_path(&ctx.path_at(0, dir)))
    .collect();
  let defines = ctx.defines(project, config.is_release());

  let mut ret = format!(
    r#"  <ItemDefinitionGroup Condition="'$(Configuration)|$(Platform)'=='{config}|x64'">
    <ClCompile>
      <WarningLevel>Level3</WarningLevel>
      <ConformanceMode>true</ConformanceMode>
      <Optimization>{opt}</Optimization>
      <RuntimeLibrary>{rt}</RuntimeLibrary>
      <LanguageStandard>{cpp}</LanguageStandard>
      <LanguageStandard_C>{c}</LanguageStandard_C>
      <PrecompiledHeader>NotUsing</PrecompiledHeader>
      <AdditionalIncludeDirectories>{inc}%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>
      <PreprocessorDefinitions>{defs}%(PreprocessorDefinitions)</PreprocessorDefinitions>
"#,
    config = config,
    opt = config.optimization(),
    rt = config.runtime_library(),
    cpp = ctx.cpp_standard(project)?.msvc(),
    c = ctx.c_standard(project)?.msvc(),
    inc = joined_with_semicolon(&includes),
    defs = joined_with_semicolon(&defines),
  );
  if let Some(prefix) = &project.prefix_header {
    let _ = writeln!(
      ret,
      "      <ForcedIncludeFiles>{}</ForcedIncludeFiles>",
      xml_escape(&win_path(&ctx.path_at(0, prefix)))
    );
  }
  ret += "    </ClCompile>\n";

  if kind == BuildKind::Static {
    ret += "    <Lib>\n      <AdditionalOptions>%(AdditionalOptions) /machine:x64</AdditionalOptions>\n    </Lib>\n";
  } else {
    let workspace_libs: Vec<String> = resolved
      .files
      .libraries
      .iter()
      .map(|lib| win_path(&ctx.path_at(0, lib)))
      .chain(externals.iter().cloned())
      .chain(project.libs.iter().map(library_name))
      .collect();
    let library_dirs: Vec<String> = resolved
      .files
      .library_dirs
      .iter()
      .map(|dir| win_path(&ctx.path_at(0, dir)))
      .collect();
    let subsystem = if kind == BuildKind::Application { "Windows" } else { "Console" };
    let _ = write!(
      ret,
      r#"    <Link>
      <SubSystem>{subsystem}</SubSystem>
      <GenerateDebugInformation>true</GenerateDebugInformation>
      <AdditionalLibraryDirectories>{dirs}%(AdditionalLibraryDirectories)</AdditionalLibraryDirectories>
      <AdditionalDependencies>{libs}%(AdditionalDependencies)</AdditionalDependencies>
"#,
      subsystem = subsystem,
      dirs = joined_with_semicolon(&library_dirs),
      libs = joined_with_semicolon(&workspace_libs),
    );
    if let Some(def) = &project.microsoft.def {
      let _ = writeln!(
        ret,
        "      <ModuleDefinitionFile>{}</ModuleDefinitionFile>",
        xml_escape(&win_path(&ctx.path_at(0, def)))
      );
    }
    ret += "    </Link>\n";
  }
  ret += "  </ItemDefinitionGroup>\n";
  Ok(ret)
}

/// `a;b;` with a trailing separator, ready for an MSBuild `%(...)` suffix.
fn joined_with_semicolon(items: &[String]) -> String {
  items.iter().map(|item| format!("{};", xml_escape(item))).collect()
}

#[cfg(test)]
mod tests {
  use super::super::testutil::*;
  use super::*;
  use crate::options::OptionSet;

  fn vs_options() -> OptionSet {
    OptionSet {
      vs2022: true,
      vs_tools143: true,
      ..OptionSet::default()
    }
  }

  #[test]
  fn writes_solution_and_projects() {
    let options = vs_options();
    let mut app = project("app", BuildKind::Application, &["src/main.cpp"]);
    app.project.link_with.append("engine,user32");
    let engine = project("engine", BuildKind::Static, &["src/engine.cpp"]);
    let ws = workspace("game", vec![app, engine]);
    let files = emit(&ws, &ctx(&options)).unwrap();

    let paths: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
    assert_eq!(paths, vec!["game.sln", "app.vcxproj", "engine.vcxproj"]);

    let app_guid = project_guid("game", "app");
    let engine_guid = project_guid("game", "engine");
    let sln = file(&files, "game.sln");
    assert!(sln.contains(&format!(
      "Project(\"{{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}}\") = \"app\", \"app.vcxproj\", \"{}\"",
      app_guid
    )));
    assert!(sln.contains(&format!("\t\t{g} = {g}\n", g = engine_guid)));
    assert!(sln.contains("# Visual Studio Version 17"));

    let vcxproj = file(&files, "app.vcxproj");
    assert!(vcxproj.contains("<PlatformToolset>v143</PlatformToolset>"));
    assert!(vcxproj.contains("<WindowsTargetPlatformVersion>10.0.22000.0</WindowsTargetPlatformVersion>"));
    assert!(vcxproj.contains("<ConfigurationType>Application</ConfigurationType>"));
    assert!(vcxproj.contains("<ClCompile Include=\"..\\src\\main.cpp\" />"));
    assert!(vcxproj.contains("<LanguageStandard>stdcpp20</LanguageStandard>"));
    assert!(vcxproj.contains("<PreprocessorDefinitions>_DEBUG;DEBUG;%(PreprocessorDefinitions)"));
    assert!(vcxproj.contains("<AdditionalDependencies>user32.lib;%(AdditionalDependencies)"));
    assert!(vcxproj.contains(&format!("<Project>{}</Project>", engine_guid)));
    assert!(vcxproj.contains("<IntDir>$(ProjectDir).intermediate\\app\\$(Configuration)\\</IntDir>"));

    let engine = file(&files, "engine.vcxproj");
    assert!(engine.contains("<ConfigurationType>StaticLibrary</ConfigurationType>"));
    assert!(!engine.contains("<Link>"));
  }

  #[test]
  fn project_overrides() {
    let options = OptionSet {
      vs2019: true,
      utf16: true,
      ..OptionSet::default()
    };
    let mut plugin = project("plugin", BuildKind::Shared, &["plugin.cpp"]);
    plugin.project.microsoft.winsdk = Some("10.0.19041.0".into());
    plugin.project.microsoft.def = Some("plugin.def".into());
    let files = emit(&workspace("w", vec![plugin]), &ctx(&options)).unwrap();
    let vcxproj = file(&files, "plugin.vcxproj");
    assert!(vcxproj.contains("<PlatformToolset>v142</PlatformToolset>"));
    assert!(vcxproj.contains("<WindowsTargetPlatformVersion>10.0.19041.0</WindowsTargetPlatformVersion>"));
    assert!(vcxproj.contains("<CharacterSet>Unicode</CharacterSet>"));
    assert!(vcxproj.contains("<ConfigurationType>DynamicLibrary</ConfigurationType>"));
    assert!(vcxproj.contains("<ModuleDefinitionFile>..\\plugin.def</ModuleDefinitionFile>"));
    assert!(file(&files, "w.sln").contains("# Visual Studio Version 16"));
  }

  #[test]
  fn toolchain_override_wins() {
    let options = vs_options();
    let mut app = project("app", BuildKind::Console, &["main.cpp"]);
    app.project.microsoft.toolchain = Some("ClangCL".into());
    let files = emit(&workspace("w", vec![app]), &ctx(&options)).unwrap();
    let vcxproj = file(&files, "app.vcxproj");
    assert!(vcxproj.contains("<PlatformToolset>ClangCL</PlatformToolset>"));
    assert!(vcxproj.contains("<SubSystem>Console</SubSystem>"));
  }

  #[test]
  fn guids_are_stable() {
    let options = vs_options();
    let ws = workspace("w", vec![project("app", BuildKind::Console, &["main.cpp"])]);
    assert_eq!(emit(&ws, &ctx(&options)).unwrap(), emit(&ws, &ctx(&options)).unwrap());
  }
}
