use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("key must be a non-empty string")]
    InvalidKey,

    #[error("unknown accessor: {0}")]
    UnknownOperation(String),

    #[error("accessor for '{0}' requires a value")]
    MissingValue(String),

    #[error("failed to deserialize repository: {0}")]
    Deserialize(#[from] toml::de::Error),
}
