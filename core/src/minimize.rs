//! Tree minimizer: prunes objects left empty by projection.

use serde_json::{Map, Value};

/// How [`minimize()`] treats arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ArrayPolicy {
    /// Arrays are leaves, kept as-is even when empty.
    #[default]
    Opaque,
    /// Object elements are minimized and dropped when they collapse. An array
    /// left empty is removed from its parent.
    Descend,
}

/// Minimize an object in place.
///
/// Child objects are minimized first and removed if nothing survived in them.
/// Scalars survive, `null` included. Returns `true` if any key survived.
pub fn minimize(map: &mut Map<String, Value>, policy: ArrayPolicy) -> bool {
    map.retain(|_, child| survives(child, policy));
    !map.is_empty()
}

/// Minimize any value, returning `None` when it collapses entirely.
///
/// ```
/// use serde_json::json;
/// use veil::{minimize_value, ArrayPolicy};
///
/// let value = json!({ "notes": { "title": {} }, "name": "J" });
/// assert_eq!(minimize_value(value, ArrayPolicy::Opaque), Some(json!({ "name": "J" })));
/// assert_eq!(minimize_value(json!({ "a": {} }), ArrayPolicy::Opaque), None);
/// ```
#[must_use]
pub fn minimize_value(mut value: Value, policy: ArrayPolicy) -> Option<Value> {
    survives(&mut value, policy).then_some(value)
}

fn survives(value: &mut Value, policy: ArrayPolicy) -> bool {
    match value {
        Value::Object(map) => minimize(map, policy),
        Value::Array(items) if policy == ArrayPolicy::Descend => {
            items.retain_mut(|item| match item {
                Value::Object(map) => minimize(map, policy),
                _ => true,
            });
            !items.is_empty()
        }
        _ => true,
    }
}
