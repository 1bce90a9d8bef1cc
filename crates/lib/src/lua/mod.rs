//! Lua sandbox for configuration scripts.
//!
//! # Submodules
//!
//! - [`runtime`] - Sandbox creation and script execution
//! - [`globals`] - `options`, `platform`, `vars` and `__target`
//! - [`loaders`] - `require`/`dofile`/`loadfile` relative to the script
//! - [`prelude`] - The `workspace`/project builder API
//! - [`extract`] - Conversion of the built workspace into the model

pub mod extract;
pub mod globals;
pub mod loaders;
pub mod prelude;
pub mod runtime;
