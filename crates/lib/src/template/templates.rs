//! Template content for `--generate`.

/// Dispatch script; `{vs_script}` names the Visual Studio variant.
pub const COGFILE_TEMPLATE: &str = "\
if platform.is'apple'then
  require'cogfile.xcode.lua'
elseif platform.is'microsoft'then
  require'{vs_script}'
elseif platform.is'linux'then
  require'cogfile.linux.lua'
end
";

/// Module definition for a 3ds Max plugin.
/// Contains `{name}` and `{ext}` placeholders.
pub const MAX_PLUGIN_DEF_TEMPLATE: &str = "\
LIBRARY {name}.{ext}
EXPORTS
  LibDescription   @1
  LibNumberClasses @2
  LibClassDesc     @3
  LibVersion       @4
";
