//! Named accessors such as `getDatabaseHost` mapped onto store operations.

use std::str::FromStr;

use super::{Entry, Repository, RepositoryError};

/// A store operation addressed by an accessor name.
///
/// Parsed from `get<Name>`, `set<Name>`, `has<Name>` or `is<Name>`, where
/// `<Name>` is UpperCamelCase. The key is the snake_case form of `<Name>`:
///
/// ```
/// use dragon_store::Accessor;
///
/// let accessor: Accessor = "getDatabaseHost".parse().unwrap();
/// assert_eq!(accessor, Accessor::Get("database_host".into()));
/// assert!("fetchDatabaseHost".parse::<Accessor>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Get(String),
    Set(String),
    Has(String),
}

/// Outcome of running an [`Accessor`] against a store.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Value(Option<Entry>),
    Exists(bool),
    Stored,
}

const PREFIXES: [(&str, fn(String) -> Accessor); 4] = [
    ("get", Accessor::Get),
    ("set", Accessor::Set),
    ("has", Accessor::Has),
    ("is", Accessor::Has),
];

impl Accessor {
    /// The store key this accessor addresses.
    pub fn key(&self) -> &str {
        match self {
            Accessor::Get(key) | Accessor::Set(key) | Accessor::Has(key) => key,
        }
    }
}

impl FromStr for Accessor {
    type Err = RepositoryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        PREFIXES
            .iter()
            .find_map(|(prefix, make)| {
                let rest = name.strip_prefix(prefix)?;
                is_upper_camel_case(rest).then(|| make(to_snake_case(rest)))
            })
            .ok_or_else(|| RepositoryError::UnknownOperation(name.to_string()))
    }
}

fn is_upper_camel_case(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

impl Repository {
    /// Runs `accessor` against this store.
    ///
    /// `Set` requires `value`; reads ignore it.
    pub fn dispatch(
        &self,
        accessor: &Accessor,
        value: Option<Entry>,
    ) -> Result<Dispatch, RepositoryError> {
        match accessor {
            Accessor::Get(key) => Ok(Dispatch::Value(self.property(key))),
            Accessor::Has(key) => Ok(Dispatch::Exists(self.has_property(key))),
            Accessor::Set(key) => {
                let value = value.ok_or_else(|| RepositoryError::MissingValue(key.clone()))?;
                self.set_property(key, value)?;
                Ok(Dispatch::Stored)
            }
        }
    }

    /// Parses `name` as an [`Accessor`] and runs it.
    pub fn call(&self, name: &str, value: Option<Entry>) -> Result<Dispatch, RepositoryError> {
        let accessor: Accessor = name.parse()?;
        self.dispatch(&accessor, value)
    }
}
