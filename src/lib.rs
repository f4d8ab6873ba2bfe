pub mod config;
pub mod merge;
pub mod repository;
pub mod value;
mod error;

pub use config::{load_environment, ConfigError, ConfigLoader};
pub use error::Error;
pub use merge::{deep_merge, smart_merge};
pub use repository::{Accessor, Dispatch, Entry, Repository, RepositoryError};
pub use value::{Key, Map, Value};
