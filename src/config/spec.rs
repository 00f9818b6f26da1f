//! Configuration schema types for tfimport.
//!
//! This module defines the structs that map to the optional `tfimport.yaml`
//! file. Every section has defaults, so an empty file (or no file at all)
//! describes a plain Terraform run against AWS.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImportConfig {
    /// Provisioning backend binaries and flags.
    pub backend: BackendConfig,
    /// Account identity settings.
    pub identity: IdentityConfig,
    /// Import rule extensions.
    pub resources: ResourceRulesConfig,
    /// Declaration tree scanning.
    pub scan: ScanConfig,
}

/// Provisioning backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    /// Binary used for plain Terraform directories (e.g. `terraform`, `tofu`).
    pub terraform_binary: String,
    /// Binary used when a Terragrunt wrapper directory is given.
    pub terragrunt_binary: String,
    /// Working-directory flag of the Terraform binary.
    pub terraform_working_dir_flag: String,
    /// Working-directory flag of the Terragrunt binary.
    pub terragrunt_working_dir_flag: String,
    /// Shell used to run import commands.
    pub shell: String,
}

/// Account identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Fixed account id; skips the caller identity lookup when set.
    pub account_id: Option<String>,
    /// Region used for the identity lookup (AWS default chain when unset).
    pub region: Option<String>,
    /// ARN partition (`aws`, `aws-cn`, `aws-us-gov`, ...).
    pub partition: String,
}

/// Import rule extensions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResourceRulesConfig {
    /// Types without a built-in rule that are imported by their `name` field.
    pub passthrough_types: Vec<String>,
    /// Extra types whose import id is the value of the given field.
    pub field_rules: BTreeMap<String, String>,
}

/// Declaration tree scanning configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names that are never descended into.
    pub exclude_dirs: Vec<String>,
    /// Whether to follow symbolic links while walking.
    pub follow_links: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            terraform_binary: String::from("terraform"),
            terragrunt_binary: String::from("terragrunt"),
            terraform_working_dir_flag: String::from("-chdir"),
            terragrunt_working_dir_flag: String::from("--terragrunt-working-dir"),
            shell: String::from("/bin/bash"),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            account_id: None,
            region: None,
            partition: String::from("aws"),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: vec![String::from(".terraform"), String::from(".terragrunt-cache")],
            follow_links: false,
        }
    }
}

impl ResourceRulesConfig {
    /// Adds pass-through types, skipping ones already listed.
    pub fn allow_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for resource_type in types {
            let resource_type = resource_type.into();
            if !self.passthrough_types.contains(&resource_type) {
                self.passthrough_types.push(resource_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.backend.terraform_binary, "terraform");
        assert_eq!(config.backend.terragrunt_working_dir_flag, "--terragrunt-working-dir");
        assert_eq!(config.identity.partition, "aws");
        assert!(config.scan.exclude_dirs.contains(&String::from(".terraform")));
    }

    #[test]
    fn test_allow_types_deduplicates() {
        let mut rules = ResourceRulesConfig::default();
        rules.allow_types(["aws_iam_user", "aws_sns_topic"]);
        rules.allow_types(["aws_iam_user"]);
        assert_eq!(rules.passthrough_types, vec!["aws_iam_user", "aws_sns_topic"]);
    }
}
