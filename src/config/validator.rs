//! Configuration validation.
//!
//! This module checks a loaded [`ImportConfig`] before any directory is
//! scanned, so a typo in a binary name or account id fails fast instead of
//! halfway through a run.

use crate::error::{ConfigError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::spec::{BackendConfig, IdentityConfig, ImportConfig, ResourceRulesConfig, ScanConfig};

/// ARN partitions accepted by default.
const KNOWN_PARTITIONS: &[&str] = &["aws", "aws-cn", "aws-us-gov", "aws-iso", "aws-iso-b"];

/// Validator for importer configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Known ARN partitions.
    known_partitions: HashSet<String>,
    /// Types that already have a built-in import rule.
    builtin_types: HashSet<String>,
}

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator with the default partitions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            known_partitions: KNOWN_PARTITIONS.iter().map(|s| (*s).to_string()).collect(),
            builtin_types: HashSet::new(),
        }
    }

    /// Registers the types covered by built-in rules, so redundant
    /// configuration can be reported as a warning.
    #[must_use]
    pub fn with_builtin_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtin_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Validates an importer configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &ImportConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_backend(&config.backend, &mut result);
        self.validate_identity(&config.identity, &mut result);
        self.validate_resources(&config.resources, &mut result);
        Self::validate_scan(&config.scan, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(ConfigError::validation(first_error.message.clone(), first_error.field.clone()).into())
        }
    }

    fn validate_backend(backend: &BackendConfig, result: &mut ValidationResult) {
        let required = [
            ("backend.terraform_binary", &backend.terraform_binary),
            ("backend.terragrunt_binary", &backend.terragrunt_binary),
            ("backend.terraform_working_dir_flag", &backend.terraform_working_dir_flag),
            ("backend.terragrunt_working_dir_flag", &backend.terragrunt_working_dir_flag),
            ("backend.shell", &backend.shell),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        for (field, flag) in [
            ("backend.terraform_working_dir_flag", &backend.terraform_working_dir_flag),
            ("backend.terragrunt_working_dir_flag", &backend.terragrunt_working_dir_flag),
        ] {
            if !flag.is_empty() && !flag.starts_with('-') {
                result.errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!("Working directory flag '{flag}' must start with '-'"),
                });
            }
        }
    }

    fn validate_identity(&self, identity: &IdentityConfig, result: &mut ValidationResult) {
        if let Some(account_id) = &identity.account_id
            && !is_valid_account_id(account_id)
        {
            result.errors.push(ValidationError {
                field: String::from("identity.account_id"),
                message: format!("Account id '{account_id}' must be exactly 12 digits"),
            });
        }

        if !self.known_partitions.contains(&identity.partition) {
            result.errors.push(ValidationError {
                field: String::from("identity.partition"),
                message: format!(
                    "Unknown partition '{}'. Expected one of: {}",
                    identity.partition,
                    KNOWN_PARTITIONS.join(", ")
                ),
            });
        }
    }

    fn validate_resources(&self, resources: &ResourceRulesConfig, result: &mut ValidationResult) {
        for (i, resource_type) in resources.passthrough_types.iter().enumerate() {
            if !is_valid_type_name(resource_type) {
                result.errors.push(ValidationError {
                    field: format!("resources.passthrough_types[{i}]"),
                    message: format!(
                        "'{resource_type}' is not a resource type (expected e.g. aws_sns_topic)"
                    ),
                });
            } else if self.builtin_types.contains(resource_type) {
                result.warnings.push(format!(
                    "'{resource_type}' has a built-in import rule; the pass-through entry is ignored"
                ));
            }
        }

        for (resource_type, field) in &resources.field_rules {
            if !is_valid_type_name(resource_type) {
                result.errors.push(ValidationError {
                    field: format!("resources.field_rules.{resource_type}"),
                    message: format!("'{resource_type}' is not a resource type"),
                });
            }
            if field.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: format!("resources.field_rules.{resource_type}"),
                    message: String::from("Field name cannot be empty"),
                });
            }
            if resources.passthrough_types.contains(resource_type) {
                result.warnings.push(format!(
                    "'{resource_type}' is both a field rule and a pass-through type; the field rule wins"
                ));
            }
        }
    }

    fn validate_scan(scan: &ScanConfig, result: &mut ValidationResult) {
        for (i, dir) in scan.exclude_dirs.iter().enumerate() {
            if dir.is_empty() || dir.contains('/') || dir.contains('\\') {
                result.errors.push(ValidationError {
                    field: format!("scan.exclude_dirs[{i}]"),
                    message: format!("'{dir}' must be a single directory name"),
                });
            }
        }
    }
}

/// Checks that an account id is exactly 12 ASCII digits.
fn is_valid_account_id(account_id: &str) -> bool {
    account_id.len() == 12 && account_id.bytes().all(|b| b.is_ascii_digit())
}

/// Checks that a string looks like a provider resource type.
///
/// Rules:
/// - lowercase letters, digits and underscores only
/// - starts with a letter
/// - has a provider prefix (contains an underscore)
fn is_valid_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && name.contains('_')
        && !name.ends_with('_')
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
