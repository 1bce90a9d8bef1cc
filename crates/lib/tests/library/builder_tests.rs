//! Builder API and sandbox tests, from Lua source to the project model.

use mlua::prelude::*;

use cog_lib::eval::evaluate;
use cog_lib::model::BuildKind;
use cog_lib::options::{OptionSet, SubPlatform};

use super::common::{Fixture, create_test_runtime, options_for};

fn ninja() -> OptionSet {
  let mut options = OptionSet::default();
  options.ninja = true;
  options
}

#[test]
fn accumulating_setters_append_in_order() {
  let fixture = Fixture::new();
  fixture.write_script(
    r#"
      wsp = workspace.new('demo')
      wsp:new('app')
        :find_sources('src/a')
        :find_sources('src/b')
        :find_sources({ 'src/c', 'src/d' })
        :link_with('core')
        :link_with('m')
        :ignore('x')
        :ignore('y')
    "#,
  );
  let ws = evaluate(&fixture.script(), &ninja(), None).unwrap().unwrap();
  let app = ws.project("app").unwrap();
  assert_eq!(app.src_paths.joined(), "src/a,src/b,src/c,src/d");
  assert_eq!(app.link_with.joined(), "core,m");
  assert_eq!(app.ignore.joined(), "x,y");
}

#[test]
fn overwriting_setters_keep_last_value() {
  let fixture = Fixture::new();
  fixture.write_script(
    r#"
      wsp = workspace.new('demo')
      wsp:new('app'):target('static'):target('shared'):prefix('a.h'):prefix('b.h')
    "#,
  );
  let ws = evaluate(&fixture.script(), &ninja(), None).unwrap().unwrap();
  let app = ws.project("app").unwrap();
  assert_eq!(app.build, Some(BuildKind::Shared));
  assert_eq!(app.prefix_header.as_deref(), Some("b.h"));
}

#[test]
fn defines_table_and_string_shapes() {
  let fixture = Fixture::new();
  fixture.write_script(
    r#"
      wsp = workspace.new('demo')
      wsp:new('pair'):defines({ 'DBG_ONLY', 'REL_ONLY' })
      wsp:new('single'):defines('BOTH_NOT')
    "#,
  );
  let ws = evaluate(&fixture.script(), &ninja(), None).unwrap().unwrap();

  let pair = ws.project("pair").unwrap();
  assert_eq!(pair.defines_dbg.joined(), "_DEBUG,DEBUG,DBG_ONLY");
  assert_eq!(pair.defines_rel.joined(), "NDEBUG,RELEASE,REL_ONLY");

  let single = ws.project("single").unwrap();
  assert_eq!(single.defines_dbg.joined(), "_DEBUG,DEBUG,BOTH_NOT");
  assert_eq!(single.defines_rel.joined(), "NDEBUG,RELEASE");
}

#[test]
fn apple_and_microsoft_methods_exist_everywhere() {
  let fixture = Fixture::new();
  fixture.write_script(
    r#"
      wsp = workspace.new('demo')
      wsp:new('app')
        :harden()
        :identifier('com.example.app')
        :team('ABCDE')
        :winsdk('10.0.19041.0')
        :toolchain('v143')
        :disable('arc')
        :unity()
    "#,
  );
  let ws = evaluate(&fixture.script(), &ninja(), None).unwrap().unwrap();
  let app = ws.project("app").unwrap();
  assert!(app.apple.hardened_runtime);
  assert_eq!(app.apple.bundle_id.as_deref(), Some("com.example.app"));
  assert_eq!(app.microsoft.winsdk.as_deref(), Some("10.0.19041.0"));
  assert!(!app.arc_enabled());
  assert!(app.unity);
}

#[test]
fn substitutions_expand_in_field_values() {
  let fixture = Fixture::new();
  fixture.write_script(
    r#"
      wsp = workspace.new('demo')
      wsp:new('app'):find_sources('src/${PLATFORM}'):find_libraries('lib/${SUBPLATFORM}/${RELEASE}/${UNKNOWN}')
    "#,
  );
  let options = options_for("xcode", &fixture.out());
  let ws = evaluate(&fixture.script(), &options, Some(SubPlatform::Macos))
    .unwrap()
    .unwrap();
  let app = ws.project("app").unwrap();
  assert_eq!(app.src_paths.joined(), "src/macos");
  assert_eq!(app.library_paths.joined(), "lib/macos/release/${UNKNOWN}");
}

#[test]
fn invalid_target_kind_is_reported() {
  let fixture = Fixture::new();
  fixture.write_script("wsp = workspace.new('demo')\nwsp:new('app'):target('rocket')");
  let err = evaluate(&fixture.script(), &ninja(), None).unwrap_err();
  assert!(err.to_string().contains("rocket"));
}

#[test]
fn require_loads_sibling_script() {
  let fixture = Fixture::new();
  fixture
    .write("cogfile.linux.lua", "wsp:new('from_sibling')")
    .write_script("wsp = workspace.new('demo')\nif platform.is'linux' then require'cogfile.linux.lua' end");
  let ws = evaluate(&fixture.script(), &ninja(), None).unwrap().unwrap();
  assert!(ws.project("from_sibling").is_some());
}

#[test]
fn sandbox_hides_host_access() -> LuaResult<()> {
  let (lua, _temp) = create_test_runtime(&ninja(), None)?;

  lua
    .load(
      r#"
        assert(io == nil, 'io should not be loaded')
        assert(os == nil, 'os should not be loaded')
        assert(debug == nil, 'debug should not be loaded')
        assert(package.loadlib == nil, 'loadlib should be removed')
      "#,
    )
    .exec()?;

  Ok(())
}

#[test]
fn platform_and_vars_globals() -> LuaResult<()> {
  let (lua, _temp) = create_test_runtime(&ninja(), None)?;

  lua
    .load(
      r#"
        assert(platform.name() == 'linux', 'ninja reports linux')
        assert(platform.vendor() == 'community', 'ninja vendor is community')
        assert(platform.is('linux'), 'is(linux)')
        assert(not platform.is('apple'), 'not apple')
        assert(vars.PLATFORM == 'linux', 'PLATFORM var')
        assert(vars.RELEASE == 'release', 'RELEASE var')
        assert(vars.SUBPLATFORM == nil, 'no SUBPLATFORM outside xcode')
        assert(__target == 'linux', '__target is the platform name')
        assert(options.ninja == true, 'options table')
      "#,
    )
    .exec()?;

  let assign = lua.load("vars.PLATFORM = 'x'").exec();
  assert!(assign.is_err());

  Ok(())
}

#[test]
fn unity_keeps_the_chain() -> LuaResult<()> {
  let (lua, _temp) = create_test_runtime(&ninja(), None)?;

  let same: bool = lua
    .load(
      r#"
        local p = workspace.new('w'):new('app')
        return p:unity() == p and p:unity(false) == p
      "#,
    )
    .eval()?;
  assert!(same);

  Ok(())
}
