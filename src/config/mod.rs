//! Configuration module for tfimport.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing the optional `tfimport.yaml`
//! - Environment variable overrides
//! - Validation of configuration values

mod spec;
mod parser;
mod validator;

pub use spec::{BackendConfig, IdentityConfig, ImportConfig, ResourceRulesConfig, ScanConfig};
pub use parser::{ConfigParser, DEFAULT_CONFIG_FILES, find_config_file};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
