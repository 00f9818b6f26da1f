//! Import identifier resolution.
//!
//! Every entry of the [`NewResourceTable`] is turned into the identifier its
//! import command needs. Field values that reference another new resource
//! are followed through the table, recursively, with cycle detection.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::declaration::{DeclaredResource, FieldValue, ResourceAddress};
use crate::error::{ResolveError, Result};
use crate::reconciler::NewResourceTable;

use super::identity::{AccountCache, IdentityProvider};
use super::rules::{ImportRule, RuleSet};

/// Default IAM path when a policy declares none.
const DEFAULT_POLICY_PATH: &str = "/";

/// A new resource with its import identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedResource {
    /// Resource address.
    pub address: ResourceAddress,
    /// The identifier passed to `import`.
    pub identifier: String,
    /// Directory the resource is declared in.
    pub source_directory: PathBuf,
}

/// A `(resource, field)` pair being resolved.
type FieldKey = (ResourceAddress, String);

/// Resolves import identifiers for a table of new resources.
#[derive(Debug)]
pub struct IdentifierResolver<'a, P: IdentityProvider + ?Sized> {
    table: &'a NewResourceTable,
    rules: &'a RuleSet,
    account: AccountCache<'a, P>,
}

impl<'a, P: IdentityProvider + ?Sized> IdentifierResolver<'a, P> {
    /// Creates a new resolver.
    #[must_use]
    pub fn new(table: &'a NewResourceTable, rules: &'a RuleSet, identity: &'a P) -> Self {
        Self {
            table,
            rules,
            account: AccountCache::new(identity),
        }
    }

    /// Resolves every resource in table order.
    ///
    /// Nothing is returned unless every identifier resolves.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or identity lookup error.
    pub async fn resolve_all(&self) -> Result<Vec<ResolvedResource>> {
        let mut memo = HashMap::new();
        let mut resolved = Vec::with_capacity(self.table.len());

        for resource in self.table {
            let identifier = self.identifier_for(resource, &mut memo).await?;
            debug!("{} -> {identifier}", resource.address);
            resolved.push(ResolvedResource {
                address: resource.address.clone(),
                identifier,
                source_directory: resource.source_directory.clone(),
            });
        }

        info!("Resolved {} import identifiers", resolved.len());
        Ok(resolved)
    }

    async fn identifier_for(
        &self,
        resource: &DeclaredResource,
        memo: &mut HashMap<FieldKey, String>,
    ) -> Result<String> {
        let rule = self
            .rules
            .rule_for(&resource.address.resource_type)
            .ok_or_else(|| ResolveError::UnsupportedResourceType {
                resource_type: resource.address.resource_type.clone(),
                address: resource.address.to_string(),
            })?;

        let value = self.resolve_field(resource, rule.source_field(), memo)?;

        match rule {
            ImportRule::Field(_) | ImportRule::Passthrough => Ok(value),
            ImportRule::PolicyArn => {
                let path = if resource.field("path").is_some() {
                    self.resolve_field(resource, "path", memo)?
                } else {
                    String::from(DEFAULT_POLICY_PATH)
                };
                let account_id = self.account.get().await?;
                Ok(policy_arn(self.rules.partition(), account_id, &path, &value))
            }
        }
    }

    /// Resolves one field of a resource to a plain string.
    fn resolve_field(
        &self,
        resource: &DeclaredResource,
        field: &str,
        memo: &mut HashMap<FieldKey, String>,
    ) -> std::result::Result<String, ResolveError> {
        let mut stack = Vec::new();
        self.resolve_field_inner(resource, field, memo, &mut stack)
    }

    fn resolve_field_inner(
        &self,
        resource: &DeclaredResource,
        field: &str,
        memo: &mut HashMap<FieldKey, String>,
        stack: &mut Vec<FieldKey>,
    ) -> std::result::Result<String, ResolveError> {
        let key = (resource.address.clone(), field.to_string());
        if let Some(value) = memo.get(&key) {
            return Ok(value.clone());
        }

        if let Some(start) = stack.iter().position(|k| *k == key) {
            let cycle = stack[start..]
                .iter()
                .chain(std::iter::once(&key))
                .map(|(address, field)| format!("{address}.{field}"))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ResolveError::CircularReference { cycle });
        }

        let value = resource
            .field(field)
            .ok_or_else(|| ResolveError::MissingField {
                address: resource.address.to_string(),
                field: field.to_string(),
            })?;

        stack.push(key.clone());
        let result = match value {
            FieldValue::Literal(literal) => Ok(literal.clone()),
            FieldValue::Reference(reference) => {
                let target = self.table.get(&reference.target).ok_or_else(|| {
                    ResolveError::UnknownReference {
                        address: resource.address.to_string(),
                        field: field.to_string(),
                        target: reference.target.to_string(),
                    }
                })?;
                if target.source_directory != resource.source_directory {
                    return Err(ResolveError::CrossDirectoryReference {
                        address: resource.address.to_string(),
                        field: field.to_string(),
                        target: reference.target.to_string(),
                    });
                }
                self.resolve_field_inner(target, &reference.field, memo, stack)
            }
            FieldValue::Expression(expression) => Err(ResolveError::UnresolvableExpression {
                address: resource.address.to_string(),
                field: field.to_string(),
                expression: expression.clone(),
            }),
        };
        stack.pop();

        let resolved = result?;
        memo.insert(key, resolved.clone());
        Ok(resolved)
    }
}

/// Formats an IAM policy ARN.
fn policy_arn(partition: &str, account_id: &str, path: &str, name: &str) -> String {
    format!("arn:{partition}:iam::{account_id}:policy{path}{name}")
}
