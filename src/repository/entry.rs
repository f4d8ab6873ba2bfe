use crate::value::{Map, Value};

use super::Repository;

/// A value as held by a [`Repository`].
///
/// Nested mappings are always held as [`Entry::Store`]; converting a
/// [`Value::Map`] into an entry wraps it (recursively) into a child store.
/// Lists stay opaque values even when they contain mappings.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Value(Value),
    Store(Repository),
}

impl Entry {
    /// Returns the plain value, unless this entry is a nested store.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Store(_) => None,
        }
    }

    pub fn as_store(&self) -> Option<&Repository> {
        match self {
            Entry::Store(store) => Some(store),
            Entry::Value(_) => None,
        }
    }

    pub fn into_store(self) -> Option<Repository> {
        match self {
            Entry::Store(store) => Some(store),
            Entry::Value(_) => None,
        }
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Entry::Store(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_integer(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_integer)
    }

    pub fn as_float(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_float)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Flattens the entry back into a plain value.
    pub fn to_value(&self) -> Value {
        match self {
            Entry::Value(value) => value.clone(),
            Entry::Store(store) => store.to_value(),
        }
    }
}

impl PartialEq<Value> for Entry {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Entry::Value(value), other) => value == other,
            (Entry::Store(store), Value::Map(map)) => store.to_map() == *map,
            (Entry::Store(_), _) => false,
        }
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        match value {
            Value::Map(map) => Entry::Store(Repository::from_map(map)),
            value => Entry::Value(value),
        }
    }
}

impl From<Map> for Entry {
    fn from(map: Map) -> Self {
        Entry::Store(Repository::from_map(map))
    }
}

impl From<Repository> for Entry {
    fn from(store: Repository) -> Self {
        Entry::Store(store)
    }
}

impl From<&Repository> for Entry {
    fn from(store: &Repository) -> Self {
        Entry::Store(store.clone())
    }
}

macro_rules! entry_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Entry {
                fn from(value: $ty) -> Self {
                    Entry::Value(Value::from(value))
                }
            }
        )*
    };
}

entry_from_scalar!(&str, String, i64, i32, f64, bool, Vec<Value>);
