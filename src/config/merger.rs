//! Layering of YAML configuration values.
//!
//! The global, project and local files are merged before typed parsing,
//! so a local file can change a single key without restating its section.
//!
//! # Merge Rules
//!
//! - Mappings merge recursively
//! - Sequences are replaced whole (a local `dependencies:` list wins outright)
//! - `null` in the overlay removes the key, restoring the built-in default
//! - Any other overlay value replaces the base value

use serde_yaml::Value;

/// Merge `overlay` onto `base`; the overlay wins at every conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                if value.is_null() {
                    merged.remove(key);
                    continue;
                }
                let next = match base_map.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Mapping(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Fold `layers` left to right into one mapping.
pub fn merge_configs(layers: &[Value]) -> Value {
    layers
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, layer| {
            deep_merge(&acc, layer)
        })
}
