//! Import command construction.

use serde::Serialize;
use std::path::PathBuf;

use crate::backend::Backend;
use crate::declaration::ResourceAddress;
use crate::resolver::ResolvedResource;

/// A ready-to-run import command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportCommand {
    /// Resource address being imported.
    pub address: ResourceAddress,
    /// Import identifier.
    pub identifier: String,
    /// Directory the resource is declared in; the command runs there.
    pub source_directory: PathBuf,
    /// The full shell command line.
    pub command_line: String,
}

/// Builds import command lines for one backend.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    backend: &'a Backend,
}

impl<'a> CommandBuilder<'a> {
    /// Creates a new command builder.
    #[must_use]
    pub const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Builds `<binary> <flag>=<location> import <type>.<name> <identifier>`.
    #[must_use]
    pub fn build(&self, resource: &ResolvedResource) -> ImportCommand {
        let command_line = [
            shell_quote(self.backend.binary()),
            shell_quote(&self.backend.working_dir_arg(&resource.source_directory)),
            String::from("import"),
            shell_quote(&resource.address.to_string()),
            shell_quote(&resource.identifier),
        ]
        .join(" ");

        ImportCommand {
            address: resource.address.clone(),
            identifier: resource.identifier.clone(),
            source_directory: resource.source_directory.clone(),
            command_line,
        }
    }

    /// Builds commands for every resource, keeping their order.
    #[must_use]
    pub fn build_all(&self, resources: &[ResolvedResource]) -> Vec<ImportCommand> {
        resources.iter().map(|resource| self.build(resource)).collect()
    }
}

/// Quotes a token for a POSIX shell when it contains anything beyond a
/// conservative safe set.
#[must_use]
pub fn shell_quote(token: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c);
    if !token.is_empty() && token.chars().all(is_safe) {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
