use crate::config::ConfigError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// Top-level error type for the dragon-store library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
