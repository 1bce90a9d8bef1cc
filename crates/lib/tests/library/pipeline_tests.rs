//! End-to-end generation runs against temporary configuration directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cog_lib::generate::{GenerateError, generate};
use cog_lib::options::SubPlatform;

use super::common::{Fixture, options_for};

const APP_SCRIPT: &str = r#"
wsp = workspace.new('demo')
wsp:new('app'):target('application'):find_sources('src')
"#;

fn snapshot(dir: &Path) -> BTreeMap<PathBuf, String> {
  walkdir::WalkDir::new(dir)
    .into_iter()
    .filter_map(Result::ok)
    .filter(|e| e.file_type().is_file())
    .map(|e| {
      let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
      (rel, fs::read_to_string(e.path()).unwrap())
    })
    .collect()
}

#[test]
fn xcode_ios_and_macos_in_one_run() {
  let fixture = Fixture::new();
  fixture
    .write("src/main.mm", "int main(){}\n")
    .write_script(APP_SCRIPT);
  let mut options = options_for("xcode", &fixture.out());
  options.os_iphone = true;

  let report = generate(&fixture.script(), &options).unwrap();
  assert_eq!(report.passes, vec![Some(SubPlatform::Macos), Some(SubPlatform::Ios)]);

  let mac = fixture.read_output("macos/app.xcodeproj/project.pbxproj");
  let ios = fixture.read_output("ios/app.xcodeproj/project.pbxproj");
  assert!(mac.contains("SDKROOT = macosx;"));
  assert!(ios.contains("SDKROOT = iphoneos;"));
  assert!(mac.contains("main.mm"));
  assert!(ios.contains("main.mm"));

  let workspace = fixture.read_output("demo.xcworkspace/contents.xcworkspacedata");
  assert!(workspace.contains("group:macos/app.xcodeproj"));
  assert!(workspace.contains("group:ios/app.xcodeproj"));
}

#[test]
fn target_global_differs_per_pass() {
  let fixture = Fixture::new();
  fixture.write_script("wsp = workspace.new('demo')\nwsp:new('app_' .. __target):target('application')");
  let mut options = options_for("xcode", &fixture.out());
  options.os_iphone = true;

  generate(&fixture.script(), &options).unwrap();
  assert!(fixture.out().join("macos/app_macos.xcodeproj/project.pbxproj").is_file());
  assert!(fixture.out().join("ios/app_ios.xcodeproj/project.pbxproj").is_file());
  assert!(!fixture.out().join("ios/app_macos.xcodeproj").exists());
}

#[test]
fn regeneration_is_byte_identical() {
  let fixture = Fixture::new();
  fixture
    .write("src/main.cpp", "int main(){}\n")
    .write("src/util.cpp", "\n")
    .write("src/util.h", "\n")
    .write_script(
      r#"
        wsp = workspace.new('demo')
        wsp:new('core'):target('static'):find_sources('src/util.cpp,src/util.h')
        wsp:new('app'):target('console'):find_sources('src/main.cpp'):link_with('core')
      "#,
    );

  for backend in ["vs2022", "ninja", "qmake", "gradle", "xcode"] {
    let options = options_for(backend, &fixture.out());
    generate(&fixture.script(), &options).unwrap();
    let first = snapshot(&fixture.out());
    generate(&fixture.script(), &options).unwrap();
    assert_eq!(first, snapshot(&fixture.out()), "{} output changed", backend);
    fs::remove_dir_all(fixture.out()).unwrap();
  }
}

#[test]
fn ignore_patterns_filter_discovered_files() {
  let fixture = Fixture::new();
  fixture
    .write("src/main.cpp", "\n")
    .write("src/test_main.cpp", "\n")
    .write("src/platform/win32.cpp", "\n")
    .write_script(
      r#"
        wsp = workspace.new('demo')
        wsp:new('app'):find_sources('src'):ignore('test_'):ignore('/win32\\.')
      "#,
    );
  generate(&fixture.script(), &options_for("ninja", &fixture.out())).unwrap();
  let ninja = fixture.read_output("build.ninja");
  assert!(ninja.contains("src/main.cpp"));
  assert!(!ninja.contains("test_main"));
  assert!(!ninja.contains("win32"));
}

#[test]
fn no_ignore_keeps_everything() {
  let fixture = Fixture::new();
  fixture
    .write("src/a.cpp", "\n")
    .write("src/b.cpp", "\n")
    .write_script("wsp = workspace.new('demo')\nwsp:new('app'):find_sources('src')");
  generate(&fixture.script(), &options_for("ninja", &fixture.out())).unwrap();
  let ninja = fixture.read_output("build.ninja");
  assert!(ninja.contains("src/a.cpp"));
  assert!(ninja.contains("src/b.cpp"));
}

#[test]
fn unity_units_for_ninja() {
  let fixture = Fixture::new();
  fixture
    .write("src/a.cpp", "\n")
    .write("src/b.cpp", "\n")
    .write("src/c.cpp", "\n")
    .write("src/d.c", "\n")
    .write_script("wsp = workspace.new('demo')\nwsp:new('app'):find_sources('src'):unity()");
  let mut options = options_for("ninja", &fixture.out());
  options.unity = true;
  options.unity_units = 2;

  generate(&fixture.script(), &options).unwrap();
  let unit = fixture.read_output(".unity/app/unity_0.cpp");
  assert!(unit.contains("#include \"../../../src/a.cpp\""));
  assert!(unit.contains("#include \"../../../src/c.cpp\""));
  assert!(fixture.read_output(".unity/app/unity_1.cpp").contains("src/b.cpp"));
  assert!(fixture.read_output(".unity/app/unity_0.c").contains("src/d.c"));

  let ninja = fixture.read_output("build.ninja");
  assert!(ninja.contains("__compiling_unity__=1"));
  assert!(ninja.contains(".unity/app/unity_0.cpp"));
  assert!(!ninja.contains("../src/a.cpp"));
}

#[test]
fn script_error_fails_the_run() {
  let fixture = Fixture::new();
  fixture.write_script("error('broken cogfile')");
  let err = generate(&fixture.script(), &options_for("ninja", &fixture.out())).unwrap_err();
  assert!(matches!(err, GenerateError::Eval(_)));
  assert!(err.to_string().contains("broken cogfile"));
}

#[test]
fn failing_pass_does_not_stop_the_other() {
  let fixture = Fixture::new();
  fixture.write_script(
    r#"
      wsp = workspace.new('demo')
      if __target == 'ios' then
        wsp:new('tool'):target('console')
      else
        wsp:new('app'):target('application')
      end
    "#,
  );
  let mut options = options_for("xcode", &fixture.out());
  options.os_iphone = true;

  assert!(generate(&fixture.script(), &options).is_err());
  assert!(fixture.out().join("macos/app.xcodeproj/project.pbxproj").is_file());
}

#[test]
fn visual_studio_solution_layout() {
  let fixture = Fixture::new();
  fixture
    .write("src/main.cpp", "\n")
    .write_script(
      r#"
        wsp = workspace.new('demo')
        wsp:new('app'):target('application'):find_sources('src'):winsdk('10.0.19041.0')
      "#,
    );
  generate(&fixture.script(), &options_for("vs2022", &fixture.out())).unwrap();
  let sln = fixture.read_output("demo.sln");
  assert!(sln.contains("app.vcxproj"));
  let vcxproj = fixture.read_output("app.vcxproj");
  assert!(vcxproj.contains("<PlatformToolset>v143</PlatformToolset>"));
  assert!(vcxproj.contains("<WindowsTargetPlatformVersion>10.0.19041.0</WindowsTargetPlatformVersion>"));
  assert!(vcxproj.contains("..\\src\\main.cpp"));
}

#[test]
fn qmake_and_gradle_layouts() {
  let fixture = Fixture::new();
  fixture.write("src/main.cpp", "\n").write_script(APP_SCRIPT);

  generate(&fixture.script(), &options_for("qmake", &fixture.out())).unwrap();
  assert!(fixture.read_output("demo.pro").contains("SUBDIRS += app"));
  assert!(fixture.read_output("app/app.pro").contains("SOURCES += ../../src/main.cpp"));

  let out = fixture.root().join("android");
  generate(&fixture.script(), &options_for("gradle", &out)).unwrap();
  assert!(out.join("settings.gradle").is_file());
  assert!(out.join("gradle/wrapper/gradle-wrapper.properties").is_file());
  assert!(out.join("app/build.gradle").is_file());
  assert!(out.join("app/src/main/cpp/CMakeLists.txt").is_file());
}

#[test]
fn variables_expand_in_labels_and_script_literals() {
  let fixture = Fixture::new();
  fixture
    .write("src/main.cpp", "\n")
    .write_script(
      r#"
        wsp = workspace.new('demo')
        wsp:new('app_${SUBPLATFORM}'):target('application'):find_sources('src')
      "#,
    );
  let mut options = options_for("xcode", &fixture.out());
  options.os_iphone = true;
  generate(&fixture.script(), &options).unwrap();
  assert!(fixture.out().join("macos/app_macos.xcodeproj/project.pbxproj").is_file());
  assert!(fixture.out().join("ios/app_ios.xcodeproj/project.pbxproj").is_file());

  let out = fixture.root().join("linux");
  fixture.write_script(
    r#"
      wsp = workspace.new('demo')
      if '${PLATFORM}' == 'linux' then
        wsp:new('app'):find_sources('src')
      end
    "#,
  );
  generate(&fixture.script(), &options_for("ninja", &out)).unwrap();
  let ninja = fs::read_to_string(out.join("build.ninja")).unwrap();
  assert!(ninja.contains("# Project \"app\""));
  assert!(ninja.contains("src/main.cpp"));
}

#[test]
fn unity_units_for_xcode_passes() {
  let fixture = Fixture::new();
  fixture
    .write("src/a.cpp", "\n")
    .write("src/b.cpp", "\n")
    .write("src/c.cpp", "\n")
    .write_script("wsp = workspace.new('demo')\nwsp:new('app'):target('application'):find_sources('src'):unity()");
  let mut options = options_for("xcode", &fixture.out());
  options.os_iphone = true;
  options.unity = true;
  options.unity_units = 2;

  generate(&fixture.script(), &options).unwrap();
  for sub in ["macos", "ios"] {
    let unit = fixture.read_output(&format!(".unity/{}/app/unity_0.cpp", sub));
    assert!(unit.contains("#include \"../../../../src/a.cpp\""));
    assert!(unit.contains("#include \"../../../../src/c.cpp\""));
    assert!(fixture.read_output(&format!(".unity/{}/app/unity_1.cpp", sub)).contains("src/b.cpp"));

    let pbx = fixture.read_output(&format!("{}/app.xcodeproj/project.pbxproj", sub));
    assert!(pbx.contains("unity_0.cpp in Sources"));
    assert!(pbx.contains("unity_1.cpp in Sources"));
    assert!(!pbx.contains("a.cpp in Sources"));
  }
}
