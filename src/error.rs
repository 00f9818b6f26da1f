//! Error types for the tfimport reconciliation engine.
//!
//! This module provides the error hierarchy for every stage of a run:
//! configuration, declaration scanning, state inventory, identity lookup,
//! identifier resolution, and import execution.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tfimport.
#[derive(Debug, Error)]
pub enum TfImportError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Declaration scanning errors.
    #[error("Declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    /// State inventory errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Account identity lookup errors.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Identifier resolution errors.
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Import execution errors.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A directory given on the command line does not exist.
    #[error("Directory not found: {path}")]
    DirectoryNotFound {
        /// Path to the missing directory.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Declaration scanning errors.
///
/// Malformed blocks never surface here; they are skipped during extraction.
#[derive(Debug, Error)]
pub enum DeclarationError {
    /// A declaration file could not be read.
    #[error("Failed to read {path}: {message}")]
    ReadFailed {
        /// Path to the unreadable file.
        path: PathBuf,
        /// Description of the IO failure.
        message: String,
    },

    /// A declaration file is not valid HCL or JSON.
    #[error("Failed to parse {path}: {message}")]
    Syntax {
        /// Path to the invalid file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// State inventory errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// The backend binary could not be started.
    #[error("Failed to run state pull for {directory}: {message}")]
    FetchFailed {
        /// Directory whose state was requested.
        directory: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The backend exited with a non-zero status.
    #[error("State pull for {directory} exited with {}: {stderr}", exit_code.map_or_else(|| String::from("signal"), |c| c.to_string()))]
    CommandFailed {
        /// Directory whose state was requested.
        directory: PathBuf,
        /// Exit code, if the process exited normally.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The snapshot is not a usable state document.
    #[error("Malformed state snapshot for {directory}: {message}")]
    MalformedSnapshot {
        /// Directory whose state was requested.
        directory: PathBuf,
        /// Description of the problem.
        message: String,
    },
}

/// Account identity lookup errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The identity service call failed.
    #[error("Failed to look up caller identity: {message}")]
    LookupFailed {
        /// Description of the failure.
        message: String,
    },

    /// The identity service answered without an account id.
    #[error("Caller identity response did not include an account id")]
    MissingAccount,
}

/// Identifier resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No import rule exists for the resource type and it is not allow-listed.
    #[error("Resource type '{resource_type}' is not supported (resource {address}); add it to the pass-through list to import it by name")]
    UnsupportedResourceType {
        /// The unsupported type.
        resource_type: String,
        /// Address of the resource that needed it.
        address: String,
    },

    /// A field required by the import rule is absent.
    #[error("{address} has no '{field}' field")]
    MissingField {
        /// Address of the resource.
        address: String,
        /// The missing field.
        field: String,
    },

    /// A reference points at a resource that is not new in this run.
    #[error("{address}.{field} references {target}, which is not a new resource in this run")]
    UnknownReference {
        /// Address of the referring resource.
        address: String,
        /// Field holding the reference.
        field: String,
        /// Referenced address.
        target: String,
    },

    /// A reference points at a resource declared in another directory.
    #[error("{address}.{field} references {target}, which is declared in another directory")]
    CrossDirectoryReference {
        /// Address of the referring resource.
        address: String,
        /// Field holding the reference.
        field: String,
        /// Referenced address.
        target: String,
    },

    /// References form a cycle.
    #[error("Circular reference: {cycle}")]
    CircularReference {
        /// The chain of fields forming the cycle.
        cycle: String,
    },

    /// A field holds an expression that cannot be evaluated statically.
    #[error("{address}.{field} is the expression `{expression}`, which cannot be resolved to an identifier")]
    UnresolvableExpression {
        /// Address of the resource.
        address: String,
        /// Field holding the expression.
        field: String,
        /// The raw expression text.
        expression: String,
    },
}

/// Import execution errors.
///
/// These are recorded per command in the execution report and never
/// abort the remaining imports.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// The shell could not be started.
    #[error("Failed to start import for {address}: {message}")]
    SpawnFailed {
        /// Address being imported.
        address: String,
        /// Description of the failure.
        message: String,
    },

    /// The import command exited with a non-zero status.
    #[error("Import of {address} exited with {}", exit_code.map_or_else(|| String::from("signal"), |c| c.to_string()))]
    NonZeroExit {
        /// Address being imported.
        address: String,
        /// Exit code, if the process exited normally.
        exit_code: Option<i32>,
    },
}

/// Result type alias for tfimport operations.
pub type Result<T> = std::result::Result<T, TfImportError>;

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl StateError {
    /// Creates a malformed snapshot error.
    #[must_use]
    pub fn malformed(directory: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            directory: directory.into(),
            message: message.into(),
        }
    }
}

impl IdentityError {
    /// Creates a lookup failure.
    #[must_use]
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::LookupFailed {
            message: message.into(),
        }
    }
}
