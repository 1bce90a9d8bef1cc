//! cog-lib: Core types and logic for cog
//!
//! This crate turns a `cogfile.lua` description into native project files:
//! - `OptionSet`: the resolved command-line switches for one run
//! - `Workspace`/`Project`: the model produced by the Lua builder API
//! - `ResolvedProject`: concrete file lists after discovery
//! - `Generator`: the backend emitters (Ninja, Visual Studio, Xcode, qmake, gradle)

pub mod consts;
pub mod discovery;
pub mod eval;
pub mod generate;
pub mod generator;
pub mod lua;
pub mod model;
pub mod options;
pub mod platform;
pub mod settings;
pub mod template;
pub mod util;
