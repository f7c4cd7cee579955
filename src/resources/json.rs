//! JSON document helpers and the `merge_json` resource.
use anyhow::{Context as _, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::OperationError;

use super::fs::ensure_parent_dir;
use super::{Applicable, ResourceChange};

/// Read and parse a JSON document.
///
/// # Errors
///
/// Returns an error naming `path` if the file cannot be read or is not
/// valid JSON.
pub fn load_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("File not found: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Write `value` as pretty-printed JSON with a trailing newline, creating
/// parent directories as needed.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the file
/// cannot be written.
pub fn save_json(path: &Path, value: &Value) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut text = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {}", path.display()))?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Merge `src` into `dst`.
///
/// Without a key, object keys of `src` are laid over `dst` at the root, and a
/// non-object on either side makes `src` replace `dst` wholesale.
///
/// With a dot-separated `merge_key`, intermediate objects along the path are
/// created (a non-object in the way is replaced) and the same one-level merge
/// is applied at the leaf.
///
/// # Examples
///
/// ```
/// use modinstall_cli::resources::json::merge_json_value;
/// use serde_json::json;
///
/// let merged = merge_json_value(json!({}), json!({"x": 1}), Some("a.b"));
/// assert_eq!(merged, json!({"a": {"b": {"x": 1}}}));
///
/// let merged = merge_json_value(json!({"a": {"b": {"y": 2}}}), json!({"x": 1}), Some("a.b"));
/// assert_eq!(merged, json!({"a": {"b": {"x": 1, "y": 2}}}));
/// ```
#[must_use]
pub fn merge_json_value(dst: Value, src: Value, merge_key: Option<&str>) -> Value {
    match merge_key.filter(|key| !key.is_empty()) {
        Some(key) => {
            let keys: Vec<&str> = key.split('.').collect();
            merge_at_path(dst, &keys, src)
        }
        None => overlay(dst, src),
    }
}

fn merge_at_path(dst: Value, keys: &[&str], src: Value) -> Value {
    let Some((key, rest)) = keys.split_first() else {
        return overlay(dst, src);
    };
    let mut map = match dst {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let child = map.get_mut(*key).map(Value::take).unwrap_or_default();
    map.insert((*key).to_string(), merge_at_path(child, rest, src));
    Value::Object(map)
}

/// One-level merge: object keys of `src` win, anything else replaces `dst`.
fn overlay(dst: Value, src: Value) -> Value {
    match (dst, src) {
        (Value::Object(mut dst), Value::Object(src)) => {
            dst.extend(src);
            Value::Object(dst)
        }
        (_, src) => src,
    }
}

/// A JSON document merged into a target document.
#[derive(Debug, Clone)]
pub struct MergeJsonResource {
    /// Source document.
    pub source: PathBuf,
    /// Target document, treated as `{}` when absent.
    pub target: PathBuf,
    /// Dot-separated key path (root when `None`).
    pub merge_key: Option<String>,
}

impl MergeJsonResource {
    /// Create a new JSON merge resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, merge_key: Option<String>) -> Self {
        Self {
            source,
            target,
            merge_key,
        }
    }
}

impl Applicable for MergeJsonResource {
    fn description(&self) -> String {
        format!(
            "{} -> {} (key: {})",
            self.source.display(),
            self.target.display(),
            self.merge_key.as_deref().unwrap_or("root")
        )
    }

    fn apply(&self) -> Result<ResourceChange> {
        if !self.source.is_file() {
            return Err(OperationError::SourceNotFound(self.source.clone()).into());
        }
        let src = load_json(&self.source)?;
        let dst = if self.target.exists() {
            load_json(&self.target)?
        } else {
            Value::Object(Map::new())
        };
        let merged = merge_json_value(dst, src, self.merge_key.as_deref());
        save_json(&self.target, &merged)?;
        Ok(ResourceChange::Applied)
    }
}
