//! Import plan types and construction.
//!
//! A plan is the ordered list of import commands for one run, built only
//! after every identifier has resolved.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::{Backend, BackendKind};
use crate::resolver::ResolvedResource;

use super::command::{CommandBuilder, ImportCommand};

/// A complete import plan.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Binary family the commands use.
    pub backend: BackendKind,
    /// Commands in execution order.
    pub commands: Vec<ImportCommand>,
}

impl ImportPlan {
    /// Creates a plan for the resolved resources, keeping their order.
    #[must_use]
    pub fn from_resolved(backend: &Backend, resolved: &[ResolvedResource]) -> Self {
        Self {
            created_at: Utc::now(),
            backend: backend.kind(),
            commands: CommandBuilder::new(backend).build_all(resolved),
        }
    }

    /// Returns true if there is nothing to import.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Gets a human-readable summary of the plan.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return String::from("Nothing to import");
        }
        format!("{} resources to import with {}", self.len(), self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ResourceAddress;
    use std::path::PathBuf;

    #[test]
    fn test_plan_summary() {
        let backend = Backend::terraform("terraform", "-chdir", "/infra");
        assert_eq!(ImportPlan::from_resolved(&backend, &[]).summary(), "Nothing to import");

        let plan = ImportPlan::from_resolved(
            &backend,
            &[ResolvedResource {
                address: ResourceAddress::new("aws_iam_role", "app"),
                identifier: String::from("app-role"),
                source_directory: PathBuf::from("/infra"),
            }],
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.summary(), "1 resources to import with terraform");
    }
}
