//! Configuration schema (dbtscope.toml)
//!
//! Two values matter at process startup: where the manifest lives by
//! default, and where the SQLite store lives. Both can come from a
//! `dbtscope.toml` file; environment variables override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default location of the SQLite store, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "./dbt_manifest.db";

/// Environment variable naming the default manifest path.
pub const MANIFEST_PATH_ENV: &str = "DBT_MANIFEST_PATH";

/// Environment variable naming the store path.
pub const DB_PATH_ENV: &str = "DBT_DB_PATH";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default manifest path used when `refresh` is called without one
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,

    /// SQLite store path
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_path: None,
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Load config from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply environment variable overrides on top of this config.
    ///
    /// `DBT_MANIFEST_PATH` and `DBT_DB_PATH` win over file values when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(MANIFEST_PATH_ENV) {
            if !path.is_empty() {
                self.manifest_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.is_empty() {
                self.db_path = PathBuf::from(path);
            }
        }
        self
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert!(config.manifest_path.is_none());
    }

    #[test]
    fn parse_toml() {
        let config = Config::from_toml(
            r#"
            manifest_path = "target/manifest.json"
            db_path = "/tmp/scope.db"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.manifest_path,
            Some(PathBuf::from("target/manifest.json"))
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/scope.db"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn toml_roundtrip() {
        let config = Config {
            manifest_path: Some(PathBuf::from("target/manifest.json")),
            db_path: PathBuf::from("scope.db"),
        };
        let toml = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }
}
