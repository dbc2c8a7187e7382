//! Settings layer merge
//!
//! Layers are plain JSON values merged in precedence order:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)
//!
//! This is only used for project settings. Plans are merged by
//! [`crate::plan::merge`], which has its own, typed rules.

use serde_json::Value;

/// Deep merge two JSON values, `overlay` taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays are replaced wholesale
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,

        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
