//! Deterministic identifiers for generated files.
//!
//! Regenerating from the same script must produce byte-identical output, so
//! every identifier is derived from stable names instead of random values:
//! - `object_id()`: 24-character Xcode object identifier
//! - `project_guid()`: Visual Studio project GUID (UUID v5)

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of an Xcode object identifier.
const OBJECT_ID_LEN: usize = 24;

/// Hash `parts` into an Xcode object identifier (upper-case hex).
///
/// Parts are separated by a NUL byte so `["ab", "c"]` and `["a", "bc"]`
/// produce different identifiers.
pub fn object_id(parts: &[&str]) -> String {
  let mut hasher = Sha256::new();
  for (i, part) in parts.iter().enumerate() {
    if i > 0 {
      hasher.update([0u8]);
    }
    hasher.update(part.as_bytes());
  }
  let mut full = hex::encode_upper(hasher.finalize());
  full.truncate(OBJECT_ID_LEN);
  full
}

/// Stable GUID for a project inside a workspace, formatted the way
/// Visual Studio writes them (`{XXXXXXXX-...}`).
pub fn project_guid(workspace: &str, label: &str) -> String {
  let namespace = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("cog:{}", workspace).as_bytes());
  braced(Uuid::new_v5(&namespace, label.as_bytes()))
}

/// GUID identifying the solution folder itself.
pub fn solution_guid(workspace: &str) -> String {
  braced(Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("cog-solution:{}", workspace).as_bytes()))
}

fn braced(uuid: Uuid) -> String {
  format!("{{{}}}", uuid.hyphenated().to_string().to_uppercase())
}
