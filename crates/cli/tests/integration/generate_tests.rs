//! Generation through the command line.

use predicates::prelude::*;

use super::common::TestEnv;

const GAME: &str = r#"
wsp = workspace.new('game')
wsp:new('engine'):target('static'):find_sources('engine')
wsp:new('app'):target('application'):find_sources('app'):link_with('engine')
"#;

fn game() -> TestEnv {
  let env = TestEnv::with_cogfile(GAME);
  env.write_file("engine/engine.cpp", "int engine(){return 1;}\n");
  env.write_file("engine/engine.h", "int engine();\n");
  env.write_file("app/main.cpp", "int main(){}\n");
  env
}

#[test]
fn ninja_from_default_cogfile() {
  let env = game();
  env
    .cog_cmd()
    .arg("ninja")
    .assert()
    .success()
    .stdout(predicate::str::contains("Generated game for ninja"));

  let ninja = env.read_output("build.ninja");
  assert!(ninja.contains("rule CXX_ENGINE"));
  assert!(ninja.contains(".output/libengine.a"));
}

#[test]
fn backend_token_replaces_host_default() {
  let env = game();
  env.cog_cmd().arg("qmake").assert().success();
  assert!(env.out().join("game.pro").is_file());
  assert!(!env.out().join("build.ninja").exists());
  assert!(!env.out().join("game.sln").exists());
}

#[test]
fn vs2022_solution() {
  let env = game();
  env.cog_cmd().arg("vs2022").assert().success();
  let sln = env.read_output("game.sln");
  assert!(sln.contains("# Visual Studio Version 17"));
  assert!(env.read_output("app.vcxproj").contains("<ProjectReference Include=\"engine.vcxproj\">"));
}

#[test]
fn xcode_both_sub_platforms() {
  let env = game();
  env
    .cog_cmd()
    .arg("xcode=ios,macos")
    .assert()
    .success()
    .stdout(predicate::str::contains("macos, ios"));
  assert!(env.out().join("macos/app.xcodeproj/project.pbxproj").is_file());
  assert!(env.out().join("ios/app.xcodeproj/project.pbxproj").is_file());
  assert!(env.out().join("game.xcworkspace/contents.xcworkspacedata").is_file());
}

#[test]
fn output_flag_and_explicit_script() {
  let env = game();
  std::fs::rename(env.root().join("cogfile.lua"), env.root().join("game.lua")).unwrap();
  env
    .cog_cmd()
    .args(["ninja", "-obuild/gen", "game.lua"])
    .assert()
    .success();
  let ninja = std::fs::read_to_string(env.root().join("build/gen/build.ninja")).unwrap();
  assert!(ninja.contains("../../app/main.cpp"));
}

#[test]
fn options_apply_only_to_later_scripts() {
  let env = game();
  env.write_file("other.lua", "wsp = workspace.new('other')\nwsp:new('tool'):find_sources('app')");
  env
    .cog_cmd()
    .args(["ninja", "cogfile.lua", "-oother_out", "other.lua"])
    .assert()
    .success();
  assert!(env.out().join("build.ninja").is_file());
  assert!(env.root().join("other_out/build.ninja").is_file());
  assert!(!env.read_output("build.ninja").contains("tool"));
}

#[test]
fn clean_removes_previous_output() {
  let env = game();
  env.cog_cmd().arg("ninja").assert().success();
  env.write_file("tmp/stale.txt", "old");
  env.cog_cmd().args(["--clean", "ninja"]).assert().success();
  assert!(!env.out().join("stale.txt").exists());
  assert!(env.out().join("build.ninja").is_file());
}

#[test]
fn script_error_exits_nonzero() {
  let env = TestEnv::with_cogfile("wsp = workspace.new('w')\nwsp:new('app'):target('rocket')");
  env
    .cog_cmd()
    .arg("ninja")
    .assert()
    .failure()
    .stderr(predicate::str::contains("rocket"));
}

#[test]
fn regenerating_is_stable() {
  let env = game();
  env.cog_cmd().arg("vs2022").assert().success();
  let first = env.read_output("app.vcxproj");
  env.cog_cmd().arg("vs2022").assert().success();
  assert_eq!(first, env.read_output("app.vcxproj"));
}
