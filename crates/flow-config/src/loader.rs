//! Settings loading
//!
//! Sources are applied in order:
//! 1. English defaults
//! 2. A TOML document (string, file, or `flow.toml` in a directory)
//! 3. Environment overrides (`FLOW_MAX_CALL_DEPTH`, `FLOW_DECIMAL_SEPARATOR`)
//!
//! The merged table is validated once, after the environment is applied.

use crate::settings::{Settings, SettingsFile};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up by [`SettingsLoader::load_from_directory`]
pub const SETTINGS_FILE_NAME: &str = "flow.toml";

/// Loads and validates [`Settings`]
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    use_env: bool,
}

impl SettingsLoader {
    /// Create a loader that honors environment overrides
    pub fn new() -> Self {
        Self { use_env: true }
    }

    /// Ignore `FLOW_*` environment variables
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// English defaults plus environment overrides
    pub fn load_defaults(&self) -> ConfigResult<Settings> {
        self.finish(SettingsFile::default())
    }

    /// Load from a TOML string
    pub fn load_from_str(&self, content: &str) -> ConfigResult<Settings> {
        let file = SettingsFile::parse(content).map_err(|error| ConfigError::TomlParseError {
            file: PathBuf::from("<string>"),
            error,
        })?;
        self.finish(file)
    }

    /// Load from a TOML file
    pub fn load_from_file(&self, path: &Path) -> ConfigResult<Settings> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let file = SettingsFile::parse(&content).map_err(|error| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error,
        })?;
        self.finish(file)
    }

    /// Load `flow.toml` from a directory, falling back to defaults when absent
    pub fn load_from_directory(&self, dir: &Path) -> ConfigResult<Settings> {
        let path = dir.join(SETTINGS_FILE_NAME);
        if path.exists() {
            self.load_from_file(&path)
        } else {
            self.load_defaults()
        }
    }

    fn finish(&self, mut file: SettingsFile) -> ConfigResult<Settings> {
        if self.use_env {
            apply_env_overrides(&mut file)?;
        }
        Settings::from_file(file)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_env_overrides(file: &mut SettingsFile) -> ConfigResult<()> {
    if let Ok(depth) = env::var("FLOW_MAX_CALL_DEPTH") {
        let depth = depth
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "FLOW_MAX_CALL_DEPTH".to_string(),
                reason: format!("'{}' is not a non-negative integer", depth),
            })?;
        file.limits.max_call_depth = Some(depth);
    }

    if let Ok(separator) = env::var("FLOW_DECIMAL_SEPARATOR") {
        let mut chars = separator.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => file.symbols.decimal_separator = Some(c),
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "FLOW_DECIMAL_SEPARATOR".to_string(),
                    reason: "must be a single character".to_string(),
                })
            }
        }
    }

    Ok(())
}
