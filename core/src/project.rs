//! Projection engine: inclusion, then exclusion, then optional minimize.

use serde_json::{Map, Value};

use crate::{minimize_value, ArrayPolicy, ProjectionError, Selector};

/// Project a working document through a level selector and an optional
/// per-call selector string.
///
/// 1. The per-call selector is compiled and merged in front of the level's.
/// 2. With any include path, the output is a fresh object holding only the
///    values reachable at include paths. Without, the working document itself
///    is the output.
/// 3. Every exclude path is deleted from the output, regardless of which
///    selector it came from.
/// 4. With `minimize`, emptied objects are pruned. A fully collapsed output is
///    `Ok(None)`.
///
/// Arrays met mid-path fan out: the rest of the path applies to each element.
///
/// # Errors
///
/// Returns [`ProjectionError::UnresolvedLevel`] if `level` is `None`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use veil::{project, Selector};
///
/// let public = Selector::compile("username -password");
/// let doc = json!({ "username": "John", "password": "x", "email": "e" });
///
/// let out = project(doc, Some(&public), Some("password"), None).unwrap();
/// assert_eq!(out, Some(json!({ "username": "John" })));
/// ```
pub fn project(
    document: Value,
    level: Option<&Selector>,
    projection: Option<&str>,
    minimize: Option<ArrayPolicy>,
) -> Result<Option<Value>, ProjectionError> {
    let level = level.ok_or(ProjectionError::UnresolvedLevel)?;
    let call = projection.map(Selector::compile).unwrap_or_default();
    let merged = Selector::merge(&call, level);

    tracing::trace!(
        include = merged.include().len(),
        exclude = merged.exclude().len(),
        "projecting document"
    );

    let mut out = if merged.include().is_empty() {
        document
    } else {
        let mut target = Map::new();
        if let Value::Object(source) = &document {
            for path in merged.include() {
                transfer(source, &mut target, &segments(path));
            }
        }
        Value::Object(target)
    };

    for path in merged.exclude() {
        find_and_delete(&mut out, &segments(path));
    }

    Ok(match minimize {
        Some(policy) => minimize_value(out, policy),
        None => Some(out),
    })
}

fn segments(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// Copy the value at `parts` from `source` into the same location of `target`,
/// creating intermediate objects and arrays. Missing source keys produce no
/// target key.
fn transfer(source: &Map<String, Value>, target: &mut Map<String, Value>, parts: &[&str]) {
    match parts {
        [] => {}
        [leaf] => {
            if let Some(value) = source.get(*leaf) {
                target.insert((*leaf).to_owned(), value.clone());
            }
        }
        [head, rest @ ..] => match source.get(*head) {
            Some(Value::Array(items)) => {
                let slot = target
                    .entry(*head)
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !slot.is_array() {
                    *slot = Value::Array(Vec::new());
                }
                if let Value::Array(slots) = slot {
                    if slots.len() < items.len() {
                        slots.resize(items.len(), Value::Null);
                    }
                    for (item, slot) in items.iter().zip(slots.iter_mut()) {
                        transfer_element(item, slot, rest);
                    }
                }
            }
            Some(Value::Object(child)) => {
                let slot = target
                    .entry(*head)
                    .or_insert_with(|| Value::Object(Map::new()));
                if slot.is_null() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(child_target) = slot {
                    transfer(child, child_target, rest);
                }
            }
            _ => {}
        },
    }
}

/// Fan-out step for one array element. Object elements get an object slot and
/// the rest of the path; array elements get an equally long array of `null`;
/// anything else leaves a `null` placeholder.
fn transfer_element(item: &Value, slot: &mut Value, rest: &[&str]) {
    match item {
        Value::Object(source) => {
            if !slot.is_object() && !slot.is_array() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(target) = slot {
                transfer(source, target, rest);
            }
        }
        Value::Array(inner) => {
            if !slot.is_object() && !slot.is_array() {
                *slot = Value::Array(vec![Value::Null; inner.len()]);
            }
        }
        _ => {}
    }
}

/// Delete the key at `parts` from `target`. Arrays met mid-path fan out to
/// every element; a missing or scalar node aborts silently.
fn find_and_delete(target: &mut Value, parts: &[&str]) {
    let Value::Object(map) = target else {
        return;
    };
    match parts {
        [] => {}
        [leaf] => {
            map.shift_remove(*leaf);
        }
        [head, rest @ ..] => match map.get_mut(*head) {
            Some(Value::Array(items)) => {
                for item in items {
                    find_and_delete(item, rest);
                }
            }
            Some(child @ Value::Object(_)) => find_and_delete(child, rest),
            _ => {}
        },
    }
}
