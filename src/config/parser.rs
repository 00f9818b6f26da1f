//! Configuration parser for loading configuration files.
//!
//! This module handles loading configuration from YAML files and environment
//! variables, with proper precedence and error handling.

use crate::error::{ConfigError, Result, TfImportError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::ImportConfig;

/// Configuration parser for loading importer configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ImportConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(TfImportError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            TfImportError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// An empty document yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ImportConfig> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(ImportConfig::default());
        }

        let config: ImportConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            TfImportError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<ImportConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// Recognized variables:
    /// `TFIMPORT_ACCOUNT_ID`, `TFIMPORT_REGION`, `TFIMPORT_TERRAFORM_BINARY`,
    /// `TFIMPORT_TERRAGRUNT_BINARY` and `TFIMPORT_PASSTHROUGH_TYPES`
    /// (comma separated, appended to the configured list).
    pub fn apply_env_overrides<F>(config: &mut ImportConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(account_id) = lookup("TFIMPORT_ACCOUNT_ID") {
            debug!("Overriding identity.account_id from environment");
            config.identity.account_id = Some(account_id);
        }

        if let Some(region) = lookup("TFIMPORT_REGION") {
            debug!("Overriding identity.region from environment");
            config.identity.region = Some(region);
        }

        if let Some(binary) = lookup("TFIMPORT_TERRAFORM_BINARY") {
            debug!("Overriding backend.terraform_binary from environment");
            config.backend.terraform_binary = binary;
        }

        if let Some(binary) = lookup("TFIMPORT_TERRAGRUNT_BINARY") {
            debug!("Overriding backend.terragrunt_binary from environment");
            config.backend.terragrunt_binary = binary;
        }

        if let Some(types) = lookup("TFIMPORT_PASSTHROUGH_TYPES") {
            debug!("Extending resources.passthrough_types from environment");
            config.resources.allow_types(
                types
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty()),
            );
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                TfImportError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["tfimport.yaml", "tfimport.yml", ".tfimport.yaml"];

/// Finds a configuration file in `start_dir` or its parents, then in the
/// user configuration directory (`<config dir>/tfimport/config.yaml`).
///
/// Returns `None` when no file exists; configuration is optional.
#[must_use]
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("tfimport").join("config.yaml"))
        .filter(|path| path.exists())
}
