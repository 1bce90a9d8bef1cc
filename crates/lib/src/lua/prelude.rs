//! Builder API evaluated before every user script.
//!
//! Defines the global `workspace` constructor and the project methods. All
//! project state lives in `m_*` fields on the project table; list-valued
//! fields are comma-joined strings so chained calls accumulate.

/// Lua source of the builder API.
pub const PRELUDE: &str = r#"
local function join(value)
  if type(value) == 'table' then
    local parts = {}
    for _, entry in ipairs(value) do
      parts[#parts + 1] = tostring(entry)
    end
    return table.concat(parts, ',')
  end
  return tostring(value)
end

local function append(self, key, value)
  if value == nil then
    return
  end
  value = join(value)
  if value == '' then
    return
  end
  local prev = rawget(self, key)
  if prev == nil or prev == '' then
    rawset(self, key, value)
  else
    rawset(self, key, prev .. ',' .. value)
  end
end

local function accumulate(key)
  return function(self, value)
    append(self, key, value)
    return self
  end
end

local function assign(key)
  return function(self, value)
    rawset(self, key, value)
    return self
  end
end

local function flag(key)
  return function(self, value)
    if value == nil then
      value = true
    end
    rawset(self, key, value)
    return self
  end
end

local project = {}
project.__index = project

project.find_sources = accumulate('m_srcPaths')
project.find_includes = accumulate('m_includePaths')
project.set_include_paths = project.find_includes
project.find_resources = accumulate('m_resPaths')
project.find_libraries = accumulate('m_libraryPaths')
project.find_frameworks = accumulate('m_frameworkPaths')
project.link_with = accumulate('m_linkWith')
project.ignore = accumulate('m_ignore')
project.skip_unity = accumulate('m_skipUnity')
project.libs = accumulate('m_libs')
project.export_headers = accumulate('m_exportHeaders')
project.export_refs = accumulate('m_exportRefs')
project.embed_and_sign = accumulate('m_embedAndSign')
project.load_all_symbols = accumulate('m_loadAllSymbols')
project.dependencies = accumulate('m_dependencies')
project.disable = accumulate('m_disableOpts')

project.target = assign('m_build')
project.install = assign('m_installScript')
project.prefix = assign('m_prefixHeader')
project.lang = assign('m_language')
project.language = project.lang
project.c_lang = assign('m_clanguage')
project.c_language = project.c_lang
project.winsdk = assign('m_winsdk')
project.toolchain = assign('m_toolchain')
project.def = assign('m_def')
project.deployment = assign('m_deployTo')
project.sdk_version = assign('m_sdkVersion')
project.identifier = assign('m_bundleId')
project.team = assign('m_teamName')
project.organization = assign('m_orgName')
project.os_target = assign('m_osTarget')

project.unity = flag('m_bUnity')
project.harden = flag('m_hardenedRuntime')
project.enableARC = flag('m_arcEnabled')
project.universal = flag('m_universal')
project.appleSilicon = flag('m_appleSilicon')
project.enableJIT = flag('m_enableJIT')
project.disableLibraryValidation = flag('m_disableLibValidation')

function project:not_embedded()
  rawset(self, 'm_noEmbedAndSign', true)
  return self
end

function project:defines(dbg, rel)
  if type(dbg) == 'table' then
    append(self, 'm_definesDbg', dbg[1])
    append(self, 'm_definesRel', dbg[2])
  else
    append(self, 'm_definesDbg', dbg)
  end
  append(self, 'm_definesRel', rel)
  return self
end

local workspace_mt = {}
workspace_mt.__index = workspace_mt

function workspace_mt:new(label)
  if type(label) ~= 'string' or label == '' then
    error('project label must be a non-empty string', 2)
  end
  local existing = self.m_tProjects[label]
  if existing ~= nil then
    return existing
  end
  local p = setmetatable({ label = label }, project)
  self.m_tProjects[label] = p
  return p
end

function workspace_mt:save()
  platform.save(self)
  return self
end

workspace = {}

function workspace.new(first, second)
  local name = first
  if first == workspace then
    name = second
  end
  if type(name) ~= 'string' or name == '' then
    error('workspace name must be a non-empty string', 2)
  end
  return setmetatable({ m_sName = name, m_tProjects = {} }, workspace_mt)
end
"#;
