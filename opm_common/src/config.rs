//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across all OPM applications. Application crates define their own config
//! structs and get loading + error handling for free via [`ConfigLoader`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use opm_common::config::{ConfigError, ConfigLoader};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct AppConfig {
//!     data_dir: String,
//! }
//!
//! impl ConfigLoader for AppConfig {}
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = AppConfig::load(Path::new("config.toml"))?;
//!     println!("data dir: {}", config.data_dir);
//!     Ok(())
//! }
//! ```

use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Trait for loading configuration from TOML files.
///
/// Provides a default implementation for any `DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Returns `ConfigError::ValidationError` if semantic validation fails
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load and parse the configuration file, then run [`validate`].
    ///
    /// [`validate`]: ConfigLoader::validate
    fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic validation hook. Default: no constraints.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct ToyConfig {
        name: String,
        #[serde(default)]
        retries: u32,
    }

    impl ConfigLoader for ToyConfig {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "name cannot be empty".to_string(),
                ));
            }
            Ok(())
        }
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let err = ToyConfig::load(Path::new("/nonexistent/opm.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn load_parses_and_applies_defaults() {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(f, "name = \"opm\"").expect("write");
        let cfg = ToyConfig::load(f.path()).expect("load");
        assert_eq!(cfg.name, "opm");
        assert_eq!(cfg.retries, 0);
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(f, "name = ").expect("write");
        let err = ToyConfig::load(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_runs_validation() {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(f, "name = \"\"").expect("write");
        let err = ToyConfig::load(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
