//! Nested, dot-addressable key/value store.
//!
//! A [`Repository`] owns an insertion-ordered mapping of [`Key`]s to
//! [`Entry`]s. Keys may be addressed literally or through dot-paths
//! (`"database.host"`), which walk nested stores level by level.
//!
//! ## Wrapping and identity
//!
//! Nested mappings are wrapped into child stores eagerly, when they are
//! inserted, never at read time. Reading the same position twice therefore
//! returns handles to the same child store, and a mutation made through one
//! handle is visible through every other:
//!
//! ```
//! use dragon_store::Repository;
//!
//! let repo = Repository::new();
//! repo.set("db.host", "localhost");
//!
//! let db = repo.get("db").and_then(|e| e.into_store()).unwrap();
//! repo.set("db.port", 5432);
//!
//! assert_eq!(db.get("port").and_then(|e| e.as_integer()), Some(5432));
//! ```
//!
//! `Repository` is a handle: `clone` aliases, it does not copy. Use
//! [`Repository::to_map`] for an independent snapshot. Handles are not `Send`;
//! callers that need to share a tree across threads share the plain [`Map`].
//! Inserting a store into its own subtree creates a reference cycle, which
//! leaks and makes [`Repository::to_map`] recurse without end.

mod accessor;
mod entry;
mod error;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::value::{map_to_table, Key, Map, Value};

pub use accessor::{Accessor, Dispatch};
pub use entry::Entry;
pub use error::RepositoryError;

type Records = IndexMap<Key, Entry>;

/// A nested key/value store with dot-path addressing.
#[derive(Clone, Default)]
pub struct Repository {
    records: Rc<RefCell<Records>>,
}

impl Repository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository from a plain mapping, wrapping nested mappings
    /// into child repositories at every depth.
    pub fn from_map(map: Map) -> Self {
        let records = map
            .into_iter()
            .map(|(key, value)| (key, Entry::from(value)))
            .collect();
        Self {
            records: Rc::new(RefCell::new(records)),
        }
    }

    /// Returns `true` if both handles point at the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.records, &other.records)
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Top-level keys in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.records.borrow().keys().cloned().collect()
    }

    /// Checks whether `key` resolves to an entry.
    ///
    /// A string key containing `.` is resolved as a dot-path only; a literal
    /// key spelled the same way is not consulted. Other keys, including `""`,
    /// are looked up literally.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        match key.dot_segments() {
            Some(segments) => self.resolve(&segments).is_some(),
            None => self.records.borrow().contains_key(&key),
        }
    }

    /// Looks up `key`, resolving dot-paths first.
    ///
    /// Given both a literal `"r.v"` entry and a nested `r` store holding `v`,
    /// `get("r.v")` returns the nested value. Use [`get_literal`](Self::get_literal)
    /// to reach the literal entry.
    pub fn get(&self, key: impl Into<Key>) -> Option<Entry> {
        let key = key.into();
        match key.dot_segments() {
            Some(segments) => self.resolve(&segments),
            None => self.records.borrow().get(&key).cloned(),
        }
    }

    /// Like [`get`](Self::get), returning `default` when nothing resolves.
    pub fn get_or(&self, key: impl Into<Key>, default: impl Into<Entry>) -> Entry {
        self.get(key).unwrap_or_else(|| default.into())
    }

    /// Looks up `key` as a literal top-level key first, falling back to
    /// [`get`](Self::get) when no such literal key exists.
    pub fn get_literal(&self, key: impl Into<Key>) -> Option<Entry> {
        let key = key.into();
        let literal = self.records.borrow().get(&key).cloned();
        literal.or_else(|| self.get(key))
    }

    /// Stores `value` at `key`.
    ///
    /// Dot-paths descend through existing child stores and create missing
    /// ones. An intermediate segment holding a plain value is replaced by a
    /// fresh empty store. Overwriting a key keeps its position.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Entry>) {
        let key = key.into();
        let entry = value.into();

        let Some(mut segments) = key.dot_segments() else {
            self.records.borrow_mut().insert(key, entry);
            return;
        };
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = self.clone();
        for segment in segments {
            current = current.child_or_insert(segment);
        }
        current.records.borrow_mut().insert(last, entry);
    }

    /// Removes a literal top-level key, returning its entry.
    ///
    /// The empty string is rejected with [`RepositoryError::InvalidKey`].
    pub fn remove(&self, key: impl Into<Key>) -> Result<Option<Entry>, RepositoryError> {
        let key = key.into();
        if key.is_empty_str() {
            return Err(RepositoryError::InvalidKey);
        }
        Ok(self.records.borrow_mut().shift_remove(&key))
    }

    /// Property-style read; same resolution as [`get`](Self::get).
    pub fn property(&self, name: &str) -> Option<Entry> {
        self.get(name)
    }

    /// Property-style write. Property names must be non-empty.
    pub fn set_property(
        &self,
        name: &str,
        value: impl Into<Entry>,
    ) -> Result<(), RepositoryError> {
        if name.is_empty() {
            return Err(RepositoryError::InvalidKey);
        }
        self.set(name, value);
        Ok(())
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.has(name)
    }

    /// Iterates over a snapshot of the top-level entries in insertion order.
    pub fn iter(&self) -> std::vec::IntoIter<(Key, Entry)> {
        self.records
            .borrow()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Flattens the store and every nested store into a plain mapping.
    pub fn to_map(&self) -> Map {
        self.records
            .borrow()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.to_value()))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Map(self.to_map())
    }

    /// Deserializes the whole tree into `T`.
    ///
    /// Integer keys are presented to `T` as their decimal text.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, RepositoryError> {
        let value = toml::Value::Table(map_to_table(self.to_map()));
        value.try_into().map_err(RepositoryError::Deserialize)
    }

    fn resolve(&self, segments: &[Key]) -> Option<Entry> {
        let (first, rest) = segments.split_first()?;
        let records = self.records.borrow();
        let entry = records.get(first)?;
        if rest.is_empty() {
            return Some(entry.clone());
        }
        match entry {
            Entry::Store(child) => child.resolve(rest),
            Entry::Value(_) => None,
        }
    }

    fn child_or_insert(&self, key: Key) -> Repository {
        let mut records = self.records.borrow_mut();
        match records.get(&key) {
            Some(Entry::Store(child)) => return child.clone(),
            Some(Entry::Value(_)) => trace!(%key, "replacing plain value with nested store"),
            None => {}
        }
        let child = Repository::new();
        records.insert(key, Entry::Store(child.clone()));
        child
    }
}

impl From<Map> for Repository {
    fn from(map: Map) -> Self {
        Self::from_map(map)
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.to_map() == other.to_map()
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_map(), f)
    }
}

impl IntoIterator for &Repository {
    type Item = (Key, Entry);
    type IntoIter = std::vec::IntoIter<(Key, Entry)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::map_from_table;

    fn make_map(toml_str: &str) -> Map {
        map_from_table(toml::from_str(toml_str).unwrap())
    }

    fn make_repo(toml_str: &str) -> Repository {
        Repository::from_map(make_map(toml_str))
    }

    #[test]
    fn test_literal_access() {
        let repo = make_repo(
            r#"
            key1 = "value1"
            key2 = "value2"
            "#,
        );

        assert_eq!(repo.get("key1").unwrap().as_str(), Some("value1"));
        repo.set("key3", "value3");
        assert_eq!(repo.get("key3").unwrap().as_str(), Some("value3"));
        assert!(repo.has("key1"));
        assert!(!repo.has("nonexistent"));

        let removed = repo.remove("key1").unwrap();
        assert_eq!(removed, Some(Entry::from("value1")));
        assert!(!repo.has("key1"));
    }

    #[test]
    fn test_len_and_keys() {
        let repo = make_repo("a = 1\nb = 2\nc = 3");
        assert_eq!(repo.len(), 3);
        repo.set("d", 4);
        assert_eq!(repo.len(), 4);
        assert_eq!(
            repo.keys(),
            vec![Key::from("a"), Key::from("b"), Key::from("c"), Key::from("d")]
        );
        assert!(Repository::new().is_empty());
    }

    #[test]
    fn test_iteration_in_insertion_order() {
        let repo = make_repo("b = 1\na = 2");
        repo.set("c", 3);

        let seen: Vec<(Key, Entry)> = repo.iter().collect();
        assert_eq!(
            seen,
            vec![
                (Key::from("b"), Entry::from(1)),
                (Key::from("a"), Entry::from(2)),
                (Key::from("c"), Entry::from(3)),
            ]
        );

        let mut count = 0;
        for (_key, _entry) in &repo {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_dot_notation_get() {
        let repo = make_repo("[a.b]\nc = \"value\"");

        assert_eq!(repo.get("a.b.c"), Some(Entry::from("value")));
        assert_eq!(repo.get("a.b.nonexistent"), None);
        assert_eq!(
            repo.get_or("a.b.nonexistent", "default"),
            Entry::from("default")
        );
        assert_eq!(repo.get("nonexistent"), None);
        assert_eq!(repo.get("a.b.c.deeper"), None);
    }

    #[test]
    fn test_dot_notation_has() {
        let repo = make_repo("[a.b]\nc = \"value\"");

        assert!(repo.has("a.b.c"));
        assert!(repo.has("a.b"));
        assert!(!repo.has("a.b.nonexistent"));
        assert!(!repo.has("a.b.c.d"));
        assert!(!repo.has("nonexistent"));
    }

    #[test]
    fn test_dot_notation_set_round_trip() {
        let repo = Repository::new();
        repo.set("a.b.c", 5);

        assert_eq!(repo.get("a.b.c"), Some(Entry::from(5)));
        assert_eq!(repo.to_map(), make_map("[a.b]\nc = 5"));
    }

    #[test]
    fn test_intermediates_are_stores() {
        let repo = Repository::new();
        repo.set("a.b.c", 5);

        let a = repo.get("a").unwrap();
        assert!(a.is_store());
        let b = a.as_store().unwrap().get("b").unwrap();
        assert!(b.is_store());

        b.as_store().unwrap().set("d.e", 6);
        assert_eq!(repo.get("a.b.d.e"), Some(Entry::from(6)));
    }

    #[test]
    fn test_nested_stores_are_wrapped_eagerly() {
        let repo = make_repo("[a.b.c.d]\ne = \"value\"");

        assert_eq!(repo.get("a.b.c.d.e"), Some(Entry::from("value")));
        let a = repo.property("a").and_then(Entry::into_store).unwrap();
        let b = a.property("b").and_then(Entry::into_store).unwrap();
        let c = b.property("c").and_then(Entry::into_store).unwrap();
        let d = c.property("d").and_then(Entry::into_store).unwrap();
        assert_eq!(d.get("e"), Some(Entry::from("value")));
    }

    #[test]
    fn test_repeated_reads_share_identity() {
        let repo = make_repo("[db]\nhost = \"localhost\"");

        let first = repo.get("db").and_then(Entry::into_store).unwrap();
        let second = repo.get("db").and_then(Entry::into_store).unwrap();
        assert!(first.ptr_eq(&second));

        repo.set("db.port", 5432);
        assert_eq!(first.get("port"), Some(Entry::from(5432)));
    }

    #[test]
    fn test_embedded_store_is_shared() {
        let nested = Repository::new();
        nested.set("subkey", "subvalue");
        nested.set("sub.array", vec![Value::from(1), Value::from(2)]);

        let repo = Repository::new();
        repo.set("nested", &nested);

        assert!(repo.has("nested.subkey"));
        assert_eq!(repo.get("nested.subkey"), Some(Entry::from("subvalue")));
        assert_eq!(
            repo.get("nested.sub.array"),
            Some(Entry::from(vec![Value::from(1), Value::from(2)]))
        );
        assert!(!repo.has("nested.nonexistent"));
        assert_eq!(repo.get("nested.nonexistent"), None);

        repo.set("nested.newkey", "newvalue");
        assert_eq!(repo.get("nested.newkey"), Some(Entry::from("newvalue")));
        assert_eq!(
            nested.to_map(),
            make_map(
                r#"
                subkey = "subvalue"
                newkey = "newvalue"
                [sub]
                array = [1, 2]
                "#
            )
        );
    }

    #[test]
    fn test_to_map_flattens_nested_stores() {
        let repo = make_repo("a = 1\n[b]\nc = 2");
        assert_eq!(repo.to_map(), make_map("a = 1\n[b]\nc = 2"));

        let inner = Repository::new();
        inner.set("value", "test");
        let middle = Repository::new();
        middle.set("level2", inner);
        let outer = Repository::new();
        outer.set("level1", middle);
        assert_eq!(
            outer.to_map(),
            make_map("[level1.level2]\nvalue = \"test\"")
        );
    }

    #[test]
    fn test_debug_renders_plain_mapping() {
        let repo = Repository::new();
        repo.set("a.b", 1);
        let rendered = format!("{repo:?}");
        assert!(rendered.contains("\"a\""));
        assert!(rendered.contains("\"b\""));
        assert!(rendered.contains("Integer(1)"));
    }

    #[test]
    fn test_empty_key_is_literal() {
        let repo = Repository::new();
        repo.set("", "empty_key_value");

        assert_eq!(repo.get(""), Some(Entry::from("empty_key_value")));
        assert!(repo.has(""));
        assert_eq!(repo.keys(), vec![Key::from("")]);
        assert!(matches!(repo.remove(""), Err(RepositoryError::InvalidKey)));
        assert!(repo.has(""));
    }

    #[test]
    fn test_integer_keys() {
        let repo = Repository::new();
        repo.set(0, "zero");
        repo.set(1, "one");

        assert_eq!(repo.get(0), Some(Entry::from("zero")));
        assert_eq!(repo.get("1"), Some(Entry::from("one")));

        repo.set("list.0", "first");
        assert_eq!(repo.get("list.0"), Some(Entry::from("first")));
        let list = repo.get("list").and_then(Entry::into_store).unwrap();
        assert_eq!(list.keys(), vec![Key::Int(0)]);
    }

    #[test]
    fn test_dot_path_shadows_literal_dotted_key() {
        let mut map = make_map("[r]\nv = 2");
        map.insert(Key::from("r.v"), Value::from("foo"));
        let repo = Repository::from_map(map);

        assert_eq!(repo.get("r.v"), Some(Entry::from(2)));
        assert_eq!(repo.get_literal("r.v"), Some(Entry::from("foo")));
        assert_eq!(repo.get_literal("r"), repo.get("r"));

        repo.set("new.dot.key", "bar");
        assert_eq!(repo.get("new.dot.key"), Some(Entry::from("bar")));
    }

    #[test]
    fn test_literal_dotted_key_without_nested_path() {
        let mut map = Map::new();
        map.insert(Key::from("x.y"), Value::from("literal"));
        let repo = Repository::from_map(map);

        assert!(!repo.has("x.y"));
        assert_eq!(repo.get("x.y"), None);
        assert_eq!(repo.get_literal("x.y"), Some(Entry::from("literal")));
        assert_eq!(repo.get_literal("x.z"), None);
    }

    #[test]
    fn test_set_through_scalar_replaces_it() {
        let repo = make_repo("a = \"scalar\"");
        repo.set("a.b", "new");

        assert_eq!(repo.get("a").unwrap(), Value::Map(make_map("b = \"new\"")));
        assert_eq!(repo.to_map(), make_map("[a]\nb = \"new\""));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let repo = make_repo("a = 1\nb = 2");
        repo.set("a", 10);
        assert_eq!(repo.keys(), vec![Key::from("a"), Key::from("b")]);
        assert_eq!(repo.get("a"), Some(Entry::from(10)));
    }

    #[test]
    fn test_setting_a_mapping_wraps_it() {
        let repo = Repository::new();
        repo.set("settings", make_map("[deep]\nflag = true"));

        assert!(repo.get("settings").unwrap().is_store());
        assert!(repo.get("settings.deep").unwrap().is_store());
        assert_eq!(repo.get("settings.deep.flag"), Some(Entry::from(true)));
    }

    #[test]
    fn test_lists_stay_opaque() {
        let repo = make_repo("items = [{ name = \"a\" }]");
        let items = repo.get("items").unwrap();
        assert!(!items.is_store());
        assert_eq!(repo.get("items.0"), None);
    }

    #[test]
    fn test_property_access() {
        let repo = Repository::new();
        repo.set_property("testKey", "testValue").unwrap();

        assert_eq!(repo.property("testKey"), Some(Entry::from("testValue")));
        assert!(repo.has_property("testKey"));
        assert_eq!(repo.property("nonexistent"), None);
    }

    #[test]
    fn test_empty_property_name_is_rejected() {
        let repo = Repository::new();
        let result = repo.set_property("", "value");
        assert!(matches!(result, Err(RepositoryError::InvalidKey)));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_remove_is_literal_and_keeps_order() {
        let repo = make_repo("a = 1\nb = 2\nc = 3\n[d]\ne = 4");

        assert_eq!(repo.remove("d.e").unwrap(), None);
        assert!(repo.has("d.e"));

        assert_eq!(repo.remove("b").unwrap(), Some(Entry::from(2)));
        assert_eq!(
            repo.keys(),
            vec![Key::from("a"), Key::from("c"), Key::from("d")]
        );
        assert_eq!(repo.remove("missing").unwrap(), None);
    }

    #[test]
    fn test_content_equality() {
        let left = make_repo("[a]\nb = 1");
        let right = Repository::new();
        right.set("a.b", 1);
        assert_eq!(left, right);
        assert!(!left.ptr_eq(&right));

        right.set("a.c", 2);
        assert_ne!(left, right);
    }

    #[test]
    fn test_deserialize_into_typed_config() {
        #[derive(Debug, serde::Deserialize)]
        struct Database {
            host: String,
            port: u16,
        }

        #[derive(Debug, serde::Deserialize)]
        struct AppConfig {
            name: String,
            database: Database,
        }

        let repo = make_repo(
            r#"
            name = "demo"
            [database]
            host = "localhost"
            "#,
        );
        repo.set("database.port", 5432);

        let config: AppConfig = repo.deserialize().unwrap();
        assert_eq!(config.name, "demo");
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);

        let result = repo.deserialize::<Database>();
        assert!(matches!(result, Err(RepositoryError::Deserialize(_))));
    }
}
