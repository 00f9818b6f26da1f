// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # tfimport
//!
//! Finds Terraform resources that are declared but not yet tracked in state,
//! works out the identifier each one is imported by, and runs (or prints) the
//! matching `import` commands.
//!
//! ## Overview
//!
//! A run goes through these stages:
//!
//! 1. **Extract**: walk the declaration tree and parse `.tf` / `.tf.json`
//!    resource blocks
//! 2. **Reconcile**: pull each directory's state once and keep the resources
//!    it does not track
//! 3. **Resolve**: apply per-type rules, following references between new
//!    resources of the same directory
//! 4. **Import**: build one command per resource and run it, or only print it
//!    in dry-run mode
//!
//! ## Modules
//!
//! - [`declaration`]: Declaration tree walking and parsing
//! - [`state`]: Tracked-resource inventories
//! - [`reconciler`]: New-resource detection
//! - [`resolver`]: Import identifier rules and resolution
//! - [`planner`]: Command construction and execution
//! - [`backend`]: Terraform/Terragrunt selection and process execution
//! - [`config`]: Configuration parsing and validation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! # tfimport.yaml
//! identity:
//!   partition: aws
//! resources:
//!   passthrough_types:
//!     - aws_sns_topic
//!   field_rules:
//!     aws_dynamodb_table: name
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod backend;
pub mod cli;
pub mod config;
pub mod declaration;
pub mod error;
pub mod planner;
pub mod reconciler;
pub mod resolver;
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use backend::{Backend, CommandRunner, ProcessRunner};
pub use cli::{Cli, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, ImportConfig};
pub use declaration::{DeclarationExtractor, DeclaredResource, FieldValue, ResourceAddress};
pub use error::{Result, TfImportError};
pub use planner::{CommandBuilder, ExecutionReport, ImportExecutor, ImportPlan};
pub use reconciler::{NewResourceTable, ReconciliationResult, Reconciler};
pub use resolver::{IdentifierResolver, IdentityProvider, RuleSet, StsIdentityProvider};
pub use state::{BackendInventoryFetcher, Inventory, InventoryFetcher};
