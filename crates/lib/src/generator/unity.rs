//! Unity (jumbo) translation units.
//!
//! Sources of a unity-enabled project are spread round-robin over
//! `unity_units` generated files under `.unity/<label>/` (or
//! `.unity/<sub-platform>/<label>/` on Xcode passes). Each language gets its
//! own units since they go through different compilers. Objective-C and
//! Objective-C++ units are only built for Xcode.

use tracing::debug;

use super::{EmitContext, OutputFile};
use crate::discovery::ResolvedProject;
use crate::options::Backend;

/// Unit extensions, in emission order, with the source extensions they take.
const CHANNELS: &[(&str, &[&str], bool)] = &[
  ("cpp", &["cpp", "cc", "cxx"], false),
  ("c", &["c"], false),
  ("mm", &["mm"], true),
  ("m", &["m"], true),
];

/// How a project's sources are compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnityPlan {
  /// Generated units, paths relative to the output directory.
  pub units: Vec<OutputFile>,
  /// Script-relative sources compiled on their own.
  pub individual: Vec<String>,
}

impl UnityPlan {
  /// Output-relative paths of the generated units.
  pub fn unit_paths(&self) -> impl Iterator<Item = String> + '_ {
    self
      .units
      .iter()
      .map(|unit| crate::util::path::to_slash(&unit.path))
  }
}

fn extension(path: &str) -> &str {
  path.rsplit_once('.').map_or("", |(_, ext)| ext)
}

/// Plan `resolved` for this run. Without unity every source is individual.
pub fn plan(resolved: &ResolvedProject, ctx: &EmitContext) -> UnityPlan {
  let files = &resolved.files;
  if !ctx.unity(&resolved.project) {
    return UnityPlan {
      units: Vec::new(),
      individual: files.sources.clone(),
    };
  }

  let objc = ctx.options.backend() == Some(Backend::Xcode);
  let (dir, depth) = match ctx.sub_platform {
    Some(sub) => (format!(".unity/{}/{}", sub, resolved.project.label), 3),
    None => (format!(".unity/{}", resolved.project.label), 2),
  };
  let count = ctx.options.unity_units.max(1);
  let candidates: Vec<&str> = files.unity_candidates().collect();

  let mut units = Vec::new();
  let mut merged: Vec<&str> = Vec::new();
  for (unit_ext, source_exts, needs_objc) in CHANNELS {
    if *needs_objc && !objc {
      continue;
    }
    let sources: Vec<&str> = candidates
      .iter()
      .copied()
      .filter(|src| source_exts.contains(&extension(src)))
      .collect();
    units.extend(distribute(ctx, &dir, depth, unit_ext, &sources, count));
    merged.extend(sources);
  }

  let individual = files
    .sources
    .iter()
    .filter(|src| !merged.contains(&src.as_str()))
    .cloned()
    .collect();
  debug!(project = %resolved.project.label, units = units.len(), "planned unity build");

  UnityPlan { units, individual }
}

fn distribute(ctx: &EmitContext, dir: &str, depth: usize, ext: &str, sources: &[&str], count: usize) -> Vec<OutputFile> {
  let mut buckets = vec![String::new(); count.min(sources.len())];
  for (i, src) in sources.iter().enumerate() {
    let bucket = &mut buckets[i % count];
    bucket.push_str(&format!("#include \"{}\"\n", ctx.path_at(depth, src)));
  }
  buckets
    .into_iter()
    .enumerate()
    .map(|(i, body)| OutputFile::new(format!("{}/unity_{}.{}", dir, i, ext), body))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::super::testutil::*;
  use super::*;
  use crate::model::BuildKind;
  use crate::options::OptionSet;

  fn unity_options(units: usize) -> OptionSet {
    OptionSet {
      ninja: true,
      unity: true,
      unity_units: units,
      ..OptionSet::default()
    }
  }

  #[test]
  fn disabled_keeps_all_sources() {
    let options = OptionSet::default();
    let mut app = project("app", BuildKind::Console, &["a.cpp", "b.cpp"]);
    app.project.unity = true;
    let plan = plan(&app, &ctx(&options));
    assert!(plan.units.is_empty());
    assert_eq!(plan.individual, vec!["a.cpp", "b.cpp"]);
  }

  #[test]
  fn round_robin_across_units() {
    let options = unity_options(2);
    let mut app = project("app", BuildKind::Console, &["a.cpp", "b.cpp", "c.cpp", "d.c", "e.m"]);
    app.project.unity = true;
    let plan = plan(&app, &ctx(&options));

    let paths: Vec<_> = plan.unit_paths().collect();
    assert_eq!(
      paths,
      vec![".unity/app/unity_0.cpp", ".unity/app/unity_1.cpp", ".unity/app/unity_0.c"]
    );
    assert_eq!(
      plan.units[0].contents,
      "#include \"../../../a.cpp\"\n#include \"../../../c.cpp\"\n"
    );
    assert_eq!(plan.units[1].contents, "#include \"../../../b.cpp\"\n");
    assert_eq!(plan.individual, vec!["e.m"]);
  }

  #[test]
  fn skip_unity_sources_stay_individual() {
    let options = unity_options(4);
    let mut app = project("app", BuildKind::Console, &["a.cpp", "gen.cpp"]);
    app.project.unity = true;
    app.files.unity_excluded = vec!["gen.cpp".into()];
    let plan = plan(&app, &ctx(&options));
    assert_eq!(plan.units.len(), 1);
    assert_eq!(plan.individual, vec!["gen.cpp"]);
  }

  #[test]
  fn xcode_passes_get_objective_c_units() {
    let options = OptionSet {
      xcode12: true,
      unity: true,
      unity_units: 2,
      ..OptionSet::default()
    };
    let ctx = EmitContext {
      sub_platform: Some(crate::options::SubPlatform::Ios),
      ..ctx(&options)
    };
    let mut app = project("app", BuildKind::Application, &["a.cpp", "b.mm", "c.m", "d.mm", "e.c"]);
    app.project.unity = true;
    let plan = plan(&app, &ctx);

    let paths: Vec<_> = plan.unit_paths().collect();
    assert_eq!(
      paths,
      vec![
        ".unity/ios/app/unity_0.cpp",
        ".unity/ios/app/unity_0.c",
        ".unity/ios/app/unity_0.mm",
        ".unity/ios/app/unity_1.mm",
        ".unity/ios/app/unity_0.m",
      ]
    );
    assert_eq!(plan.units[2].contents, "#include \"../../../../b.mm\"\n");
    assert!(plan.individual.is_empty());
  }
}
