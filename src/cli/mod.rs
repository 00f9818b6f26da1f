//! CLI module for tfimport.
//!
//! This module provides the command-line interface: argument parsing and
//! output formatting.

mod commands;
mod output;

pub use commands::{Cli, OutputFormat};
pub use output::OutputFormatter;
