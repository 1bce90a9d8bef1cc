//! Shared utilities.
//!
//! Deterministic identifiers for generated project files and relative path
//! arithmetic between the output and configuration directories.

pub mod hash;
pub mod path;
