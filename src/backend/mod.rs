//! Provisioning backend plumbing.
//!
//! This module knows which binary to call and how to run it:
//! - [`Backend`] selects Terraform or Terragrunt and builds the
//!   working-directory argument
//! - [`CommandRunner`] is the process seam used by state pulls and imports

mod binary;
mod runner;

pub use binary::{Backend, BackendKind};
pub use runner::{CommandOutput, CommandRunner, CommandStatus, ProcessRunner};

#[cfg(test)]
pub(crate) use runner::testing;
