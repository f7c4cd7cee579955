//! Module-attributed hook entries in the shared settings document.
//!
//! Every hook entry merged into `settings.json` carries a [`MODULE_MARKER`]
//! field naming its owning module. Merging skips entries the same module
//! already registered with identical fields, and unmerging only ever removes
//! the named module's entries.
use serde_json::{Map, Value};

use crate::error::HookMergeError;

/// Field recording which module owns a hook entry.
pub const MODULE_MARKER: &str = "__module__";

/// Compare two hook entries field by field, ignoring [`MODULE_MARKER`].
#[must_use]
pub fn hooks_equal(a: &Value, b: &Value) -> bool {
    match (a.as_object(), b.as_object()) {
        (Some(a), Some(b)) => {
            let fields = |m: &Map<String, Value>| m.keys().filter(|k| *k != MODULE_MARKER).count();
            fields(a) == fields(b)
                && a.iter()
                    .filter(|(k, _)| *k != MODULE_MARKER)
                    .all(|(k, v)| b.get(k) == Some(v))
        }
        _ => a == b,
    }
}

/// Fold `hooks_config` (a `{"hooks": {<type>: [entry, ...]}}` document) into
/// `settings` on behalf of `module`, returning how many entries were added.
///
/// Each entry is tagged with the module's marker. An entry is skipped when
/// the same module already has a field-for-field equal entry under that hook
/// type. `settings` is left untouched on error.
///
/// # Errors
///
/// Returns [`HookMergeError::MalformedSettings`] if `settings` (or its
/// `hooks` field, or a hook-type list in it) has the wrong shape, and
/// [`HookMergeError::MalformedHooks`] if the module's declarations do.
pub fn merge_module_hooks(
    settings: &mut Value,
    module: &str,
    hooks_config: &Value,
) -> Result<usize, HookMergeError> {
    let declared = tagged_declarations(module, hooks_config)?;

    let root = settings
        .as_object_mut()
        .ok_or(HookMergeError::MalformedSettings)?;
    if let Some(existing) = root.get("hooks")
        && (!existing.is_object()
            || declared
                .iter()
                .any(|(kind, _)| existing.get(kind).is_some_and(|list| !list.is_array())))
    {
        return Err(HookMergeError::MalformedSettings);
    }

    let hooks = root
        .entry("hooks")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or(HookMergeError::MalformedSettings)?;

    let mut added = 0;
    for (kind, entries) in declared {
        let list = hooks
            .entry(kind.as_str())
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or(HookMergeError::MalformedSettings)?;
        for entry in entries {
            let duplicate = list
                .iter()
                .any(|existing| owned_by(existing, module) && hooks_equal(existing, &entry));
            if !duplicate {
                list.push(entry);
                added += 1;
            }
        }
    }
    Ok(added)
}

/// Remove every hook entry owned by `module`, returning how many were removed.
///
/// Hook-type lists left empty are dropped. Entries of other modules and
/// entries without a marker are never touched.
///
/// # Errors
///
/// Returns [`HookMergeError::MalformedSettings`] if `settings` or its
/// `hooks` field is not an object.
pub fn unmerge_module_hooks(settings: &mut Value, module: &str) -> Result<usize, HookMergeError> {
    let root = settings
        .as_object_mut()
        .ok_or(HookMergeError::MalformedSettings)?;
    let Some(hooks) = root.get_mut("hooks") else {
        return Ok(0);
    };
    let hooks = hooks
        .as_object_mut()
        .ok_or(HookMergeError::MalformedSettings)?;

    let mut removed = 0;
    for list in hooks.values_mut() {
        if let Some(entries) = list.as_array_mut() {
            let before = entries.len();
            entries.retain(|entry| !owned_by(entry, module));
            removed += before - entries.len();
        }
    }
    hooks.retain(|_, list| list.as_array().is_none_or(|entries| !entries.is_empty()));
    Ok(removed)
}

fn owned_by(entry: &Value, module: &str) -> bool {
    entry.get(MODULE_MARKER).and_then(Value::as_str) == Some(module)
}

/// Validate the module's declarations and tag each entry with its marker.
fn tagged_declarations(
    module: &str,
    hooks_config: &Value,
) -> Result<Vec<(String, Vec<Value>)>, HookMergeError> {
    let Some(declared) = hooks_config.get("hooks") else {
        return Ok(Vec::new());
    };
    let declared = declared
        .as_object()
        .ok_or_else(|| HookMergeError::MalformedHooks("hooks".to_string()))?;

    declared
        .iter()
        .map(|(kind, entries)| -> Result<(String, Vec<Value>), HookMergeError> {
            let entries = entries
                .as_array()
                .ok_or_else(|| HookMergeError::MalformedHooks(kind.clone()))?
                .iter()
                .map(|entry| -> Result<Value, HookMergeError> {
                    let mut tagged = entry
                        .as_object()
                        .cloned()
                        .ok_or_else(|| HookMergeError::MalformedHooks(kind.clone()))?;
                    tagged.insert(MODULE_MARKER.to_string(), Value::String(module.to_string()));
                    Ok(Value::Object(tagged))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((kind.clone(), entries))
        })
        .collect()
}
