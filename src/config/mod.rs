//! Per-environment configuration loading with single-parent inheritance.

mod env;
mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{load_environment, ConfigLoader, DEFINITION_EXTENSION, PARENT_KEY};
