//! Shared helpers for integration tests.

use std::path::Path;

/// Writes `content` to `name` under `dir` and returns the full path as a
/// string.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_file(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
    path.display().to_string()
}

/// A schema for a box object requiring a numeric `height`.
pub const BOX_SCHEMA: &str = r#"{
  "type": "object",
  "required": ["height"],
  "properties": {"height": {"type": "number"}}
}"#;
