use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{0} is not a real directory")]
    NotADirectory(PathBuf),

    #[error("no config found for {0}")]
    EnvironmentNotFound(String),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("parent_env of environment '{env}' must be a string")]
    InvalidParent { env: String },

    #[error("cyclic environment inheritance: {chain}")]
    CyclicInheritance { chain: String },
}
