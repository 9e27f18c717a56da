//! Right-biased recursive merge over generic configuration trees

use serde_yaml::{Mapping, Value};

/// Merge `overlay` onto `base`, with `overlay` winning on conflicts.
///
/// Nested mappings merge key-by-key recursively; scalars and sequences are
/// replaced wholesale (a later `exclude_loggers: []` clears an earlier list
/// rather than appending to it).
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.remove(&key) {
                    Some(existing) => {
                        base.insert(key, merge_values(existing, value));
                    }
                    None => {
                        base.insert(key, value);
                    }
                }
            }
            Value::Mapping(base)
        }
        (_, overlay) => overlay,
    }
}

/// Fold an ordered sequence of layers, lowest precedence first, into one
/// merged tree. Zero layers yield an empty mapping.
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers
        .into_iter()
        .fold(Value::Mapping(Mapping::new()), merge_values)
}
