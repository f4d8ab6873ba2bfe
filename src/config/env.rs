use tracing::trace;

use crate::value::{Key, Map, Value};

/// Environment-variable overrides applied on top of a resolved environment.
///
/// `PREFIX<sep>DATABASE<sep>HOST=db.local` sets `database.host`.
#[derive(Debug, Clone)]
pub(crate) struct EnvOverrides {
    prefix: String,
    separator: String,
}

impl EnvOverrides {
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub(crate) fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    /// Applies every matching variable from `vars` to `map`.
    ///
    /// Variables are applied in name order, so `APP__DB__HOST` lands inside
    /// a table set by `APP__DB` rather than being clobbered by it.
    pub(crate) fn apply<I>(&self, map: &mut Map, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);

        let mut matching: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(name, _)| {
                name.strip_prefix(&prefix_with_sep)
                    .is_some_and(|rest| !rest.is_empty())
            })
            .collect();
        matching.sort();

        for (name, raw) in matching {
            let Some(path_str) = name.strip_prefix(&prefix_with_sep) else {
                continue;
            };
            let path: Vec<Key> = path_str
                .split(&self.separator)
                .map(|s| Key::from(s.to_lowercase()))
                .collect();

            trace!(var = %name, "applying environment override");
            set_at_path(map, &path, coerce_value(&raw));
        }
    }
}

/// Sets `value` at `path`, replacing non-table intermediates with tables.
fn set_at_path(map: &mut Map, path: &[Key], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        map.insert(first.clone(), value);
        return;
    }

    if !matches!(map.get(first), Some(Value::Map(_))) {
        map.insert(first.clone(), Value::Map(Map::new()));
    }

    if let Some(Value::Map(nested)) = map.get_mut(first) {
        set_at_path(nested, rest, value);
    }
}

/// Reads the process environment, skipping variables whose name or value is
/// not valid UTF-8.
pub(crate) fn process_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
}

/// Coerces a raw variable value: boolean, then integer, then float (only
/// when it has a `.`), falling back to the string itself.
fn coerce_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
        return Value::Boolean(raw.eq_ignore_ascii_case("true"));
    }

    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let integral = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());

    let parsed = if integral {
        raw.parse().ok().map(Value::Integer)
    } else if raw.contains('.') {
        raw.parse().ok().map(Value::Float)
    } else {
        None
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}
