//! Per-type import identifier rules.

use std::collections::HashMap;
use std::fmt;

use crate::config::{IdentityConfig, ResourceRulesConfig};

/// Types whose import id is their `name` field.
const NAME_TYPES: &[&str] = &[
    "aws_iam_role",
    "aws_iam_instance_profile",
    "aws_ecr_repository",
    "aws_iam_user",
    "aws_iam_group",
];

/// Types whose import id is an IAM policy ARN.
const POLICY_ARN_TYPES: &[&str] = &["aws_iam_policy"];

/// Types imported by another field.
const FIELD_TYPES: &[(&str, &str)] = &[("aws_s3_bucket", "bucket")];

/// How the import identifier of a resource type is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRule {
    /// The resolved value of one field, verbatim.
    Field(String),
    /// `arn:<partition>:iam::<account>:policy<path><name>`.
    PolicyArn,
    /// Allow-listed type without a rule: the resolved `name`, verbatim.
    Passthrough,
}

impl ImportRule {
    /// Returns the field the identifier is read from.
    #[must_use]
    pub fn source_field(&self) -> &str {
        match self {
            Self::Field(field) => field,
            Self::PolicyArn | Self::Passthrough => "name",
        }
    }
}

impl fmt::Display for ImportRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "field '{field}'"),
            Self::PolicyArn => write!(f, "policy ARN"),
            Self::Passthrough => write!(f, "pass-through name"),
        }
    }
}

/// The import rules in effect for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: HashMap<String, ImportRule>,
    partition: String,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    /// Returns the types that have a built-in rule.
    pub fn builtin_types() -> impl Iterator<Item = &'static str> {
        NAME_TYPES
            .iter()
            .chain(POLICY_ARN_TYPES)
            .copied()
            .chain(FIELD_TYPES.iter().map(|(resource_type, _)| *resource_type))
    }

    /// Creates the built-in rule set for the `aws` partition.
    #[must_use]
    pub fn builtin() -> Self {
        let mut rules = HashMap::new();
        for resource_type in NAME_TYPES {
            rules.insert((*resource_type).to_string(), ImportRule::Field(String::from("name")));
        }
        for resource_type in POLICY_ARN_TYPES {
            rules.insert((*resource_type).to_string(), ImportRule::PolicyArn);
        }
        for (resource_type, field) in FIELD_TYPES {
            rules.insert((*resource_type).to_string(), ImportRule::Field((*field).to_string()));
        }

        Self {
            rules,
            partition: String::from("aws"),
        }
    }

    /// Builds the rule set from configuration.
    ///
    /// Configured field rules override built-ins. Pass-through types only
    /// apply to types that have no rule at all.
    #[must_use]
    pub fn from_config(resources: &ResourceRulesConfig, identity: &IdentityConfig) -> Self {
        let mut set = Self::builtin().with_partition(&identity.partition);
        for (resource_type, field) in &resources.field_rules {
            set.rules
                .insert(resource_type.clone(), ImportRule::Field(field.clone()));
        }
        set.allow(resources.passthrough_types.iter().cloned());
        set
    }

    /// Sets the ARN partition.
    #[must_use]
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Marks types without a rule as pass-through.
    pub fn allow<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for resource_type in types {
            self.rules
                .entry(resource_type.into())
                .or_insert(ImportRule::Passthrough);
        }
    }

    /// Returns the rule for a type, if any.
    #[must_use]
    pub fn rule_for(&self, resource_type: &str) -> Option<&ImportRule> {
        self.rules.get(resource_type)
    }

    /// Returns the ARN partition.
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }
}
