//! Host platform detection and per-user directories.

pub mod os;
pub mod paths;

pub use os::{Os, Vendor};

/// Returns the host OS name (e.g. "macos"), or "unknown" on unsupported hosts
pub fn host_name() -> &'static str {
  Os::current().map(|os| os.as_str()).unwrap_or("unknown")
}
