//! CLI argument definitions.
//!
//! This module defines the command-line surface using clap.

use clap::Parser;
use std::path::PathBuf;

/// tfimport - Import declared but untracked resources into Terraform state.
#[derive(Parser, Debug)]
#[command(name = "tfimport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory tree holding the Terraform declarations.
    #[arg(short = 't', long, alias = "terraform_dir")]
    pub terraform_dir: PathBuf,

    /// Terragrunt directory mirroring the declaration tree; switches to terragrunt.
    #[arg(short = 'g', long, alias = "terragrunt_dir")]
    pub terragrunt_dir: Option<PathBuf>,

    /// Print the import commands without running them.
    #[arg(short, long, alias = "dry_run")]
    pub dry_run: bool,

    /// Path to the configuration file.
    #[arg(short, long, env = "TFIMPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,

    /// Resource type without a built-in rule to import by its `name` field.
    #[arg(long = "allow-type", value_name = "TYPE")]
    pub allow_types: Vec<String>,

    /// Account id to use for policy ARNs instead of looking it up.
    #[arg(long)]
    pub account_id: Option<String>,

    /// List the new resources and stop before resolving identifiers.
    #[arg(long)]
    pub list: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
