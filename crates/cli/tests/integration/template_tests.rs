//! `--generate` template mode.

use super::common::TestEnv;

#[test]
fn generate_writes_template_without_cogfile() {
  let env = TestEnv::new();
  env.cog_cmd().arg("--generate").assert().success();

  let cogfile = env.read_output("cogfile.lua");
  assert!(cogfile.contains("require'cogfile.xcode.lua'"));
  assert!(cogfile.contains("require'cogfile.linux.lua'"));
  assert!(env.out().join("cogfile.vs2019.lua").is_file());
}

#[test]
fn generate_max_plugin_def() {
  let env = TestEnv::new();
  env
    .cog_cmd()
    .args(["vs2022", "--generate=Exporter", "--maxplugin=dle"])
    .assert()
    .success();

  assert!(env.read_output("Exporter.def").starts_with("LIBRARY Exporter.dle\nEXPORTS\n"));
  assert!(env.out().join("cogfile.vs2022.lua").is_file());
}

#[test]
fn template_runs_the_generated_dispatch() {
  let env = TestEnv::new();
  env.cog_cmd().arg("--generate").assert().success();
  std::fs::write(
    env.out().join("cogfile.linux.lua"),
    "wsp = workspace.new('t')\nwsp:new('app')\n",
  )
  .unwrap();

  env
    .cog_cmd()
    .args(["ninja", "-ogen", "tmp/cogfile.lua"])
    .assert()
    .success();
  assert!(env.root().join("gen/build.ninja").is_file());
}
