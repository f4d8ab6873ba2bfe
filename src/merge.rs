//! Recursive deep merge of nested mappings.
//!
//! The overlay wins at every leaf. Mappings present on both sides are merged
//! key by key; anything else (including a mapping meeting a scalar) is
//! replaced by the overlay's value. Lists are leaves and are replaced whole.

use crate::value::{Map, Value};

/// Merges `overlay` on top of `base` and returns the result.
///
/// Neither input is modified. Keys keep `base`'s order, followed by keys new
/// in `overlay`, in `overlay`'s order.
///
/// ```
/// use dragon_store::{smart_merge, Key, Map, Value};
///
/// let mut common = Map::new();
/// common.insert("x".into(), Value::from(1));
/// let mut base = Map::new();
/// base.insert("common".into(), Value::Map(common));
///
/// let mut extra = Map::new();
/// extra.insert("y".into(), Value::from(2));
/// let mut overlay = Map::new();
/// overlay.insert("common".into(), Value::Map(extra));
///
/// let merged = smart_merge(&base, &overlay);
/// let common = merged[&Key::from("common")].as_map().unwrap();
/// assert_eq!(common.len(), 2);
/// ```
pub fn smart_merge(base: &Map, overlay: &Map) -> Map {
    let mut merged = base.clone();
    deep_merge(&mut merged, overlay.clone());
    merged
}

/// Merges `overlay` into `base` in place.
pub fn deep_merge(base: &mut Map, overlay: Map) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Map(base_map)), Value::Map(overlay_map)) => {
                deep_merge(base_map, overlay_map);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
