use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::env::{process_vars, EnvOverrides};
use super::ConfigError;
use crate::merge::deep_merge;
use crate::repository::Repository;
use crate::value::{map_from_table, Key, Map, Value};

/// Reserved top-level key naming the environment to inherit from.
pub const PARENT_KEY: &str = "parent_env";

/// File extension of environment definitions: `<env>.toml`.
pub const DEFINITION_EXTENSION: &str = "toml";

/// Loads environment `env` from `dir` and resolves its inheritance chain.
///
/// Shorthand for `ConfigLoader::new(dir).load_environment(env)`.
pub fn load_environment(dir: impl AsRef<Path>, env: &str) -> Result<Map, ConfigError> {
    ConfigLoader::new(dir).load_environment(env)
}

/// Loader for a directory of per-environment TOML definitions.
///
/// Each environment lives in `<dir>/<env>.toml`. A definition may name a
/// parent through the reserved `parent_env` key; the parent is resolved first
/// and the child is deep-merged on top of it, so the child wins at every
/// leaf. `parent_env` never appears in the result.
///
/// ```toml
/// # config/base.toml
/// [database]
/// host = "localhost"
/// port = 5432
///
/// # config/staging.toml
/// parent_env = "base"
/// [database]
/// host = "staging.db"
/// ```
///
/// ## Example
///
/// ```no_run
/// use dragon_store::ConfigLoader;
///
/// let config = ConfigLoader::new("config")
///     .with_env("MYAPP", "__")
///     .load("staging")?;
///
/// let host = config.get("database.host");
/// # Ok::<(), dragon_store::ConfigError>(())
/// ```
#[derive(Debug)]
#[must_use = "loaders do nothing until an environment is loaded"]
pub struct ConfigLoader {
    dir: PathBuf,
    overrides: Vec<EnvOverrides>,
}

impl ConfigLoader {
    /// Creates a loader reading definitions from `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            overrides: Vec::new(),
        }
    }

    /// Applies environment variables with the given prefix after inheritance
    /// is resolved.
    ///
    /// Variables are mapped to config paths by stripping the prefix and
    /// separator, splitting the rest on the separator and lowercasing each
    /// segment. Values are coerced to boolean, integer or float where they
    /// look like one, and kept as strings otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.overrides.push(EnvOverrides::new(prefix, separator));
        self
    }

    /// Loads `env` and returns the merged mapping.
    pub fn load_environment(&self, env: &str) -> Result<Map, ConfigError> {
        if !self.dir.is_dir() {
            return Err(ConfigError::NotADirectory(self.dir.clone()));
        }

        let mut chain = Vec::new();
        let mut merged = self.resolve(env, &mut chain)?;

        for overrides in &self.overrides {
            overrides.apply(&mut merged, process_vars());
        }

        Ok(merged)
    }

    /// Loads `env` into a [`Repository`].
    pub fn load(&self, env: &str) -> Result<Repository, ConfigError> {
        self.load_environment(env).map(Repository::from_map)
    }

    fn resolve(&self, env: &str, chain: &mut Vec<String>) -> Result<Map, ConfigError> {
        let seen = chain.iter().any(|name| name == env);
        chain.push(env.to_string());
        if seen {
            let chain = chain.join(" -> ");
            warn!(%chain, "cyclic environment inheritance");
            return Err(ConfigError::CyclicInheritance { chain });
        }

        let mut definition = self.read_definition(env)?;

        let Some(parent) = definition.shift_remove(&Key::from(PARENT_KEY)) else {
            return Ok(definition);
        };
        let Value::String(parent) = parent else {
            return Err(ConfigError::InvalidParent {
                env: env.to_string(),
            });
        };

        debug!(env, parent = %parent, "merging environment onto parent");
        let mut merged = self.resolve(&parent, chain)?;
        deep_merge(&mut merged, definition);
        Ok(merged)
    }

    fn read_definition(&self, env: &str) -> Result<Map, ConfigError> {
        let path = self.dir.join(format!("{env}.{DEFINITION_EXTENSION}"));
        if !path.is_file() {
            return Err(ConfigError::EnvironmentNotFound(env.to_string()));
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
                ) =>
            {
                return Err(ConfigError::EnvironmentNotFound(env.to_string()));
            }
            Err(e) => return Err(ConfigError::ReadError { path, source: e }),
        };

        debug!(env, path = %path.display(), "loaded environment definition");
        let table: toml::Table =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
        Ok(map_from_table(table))
    }
}
