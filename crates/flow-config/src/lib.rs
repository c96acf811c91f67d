//! Flow Translation Settings
//!
//! Every spelling the Flow language recognizes lives here:
//! - Keywords, including multi-word phrases such as `else if`
//! - Symbols (decimal separator, quotes, comment marker, datetime sigil)
//! - Special-method names used by the operator protocol
//! - Error-kind names and built-in attribute names
//! - Runtime limits
//!
//! A [`Settings`] value is immutable once built and is shared by reference
//! with every stage of the runtime.
//!
//! # Example
//!
//! ```
//! use flow_config::{KeywordRole, SettingsLoader};
//!
//! let settings = SettingsLoader::new()
//!     .load_from_str("[keywords]\nif = \"si\"\nelse_if = \"sinon si\"")
//!     .unwrap();
//! assert_eq!(settings.keyword(KeywordRole::If), "si");
//! ```

pub mod loader;
pub mod roles;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read settings file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("'{spelling}' is used by both '{first}' and '{second}'")]
    Conflict {
        spelling: String,
        first: String,
        second: String,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::SettingsLoader;
pub use roles::{ErrorClass, KeywordRole, MethodRole};
pub use settings::{Settings, SettingsFile, Symbols};
