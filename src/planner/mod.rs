//! Planning module for import operations.
//!
//! This module turns resolved identifiers into import commands and runs
//! them in order.

mod command;
mod executor;
mod plan;

pub use command::{CommandBuilder, ImportCommand, shell_quote};
pub use executor::{ExecutionReport, ImportExecutor, ImportOutcome, ImportStatus};
pub use plan::ImportPlan;
