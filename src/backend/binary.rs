//! Provisioning backend selection.
//!
//! A run talks to exactly one backend binary. Plain Terraform directories use
//! the Terraform binary with its `-chdir` flag; when a Terragrunt wrapper
//! directory is given, commands go through Terragrunt and the working
//! directory is rewritten relative to the wrapper.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::BackendConfig;

/// Which binary family drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Direct Terraform (or `OpenTofu`) invocation.
    Terraform,
    /// Invocation through a Terragrunt wrapper tree.
    Terragrunt,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terraform => write!(f, "terraform"),
            Self::Terragrunt => write!(f, "terragrunt"),
        }
    }
}

/// The backend binary and how it selects a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    kind: BackendKind,
    binary: String,
    working_dir_flag: String,
    root: PathBuf,
    wrapper_root: Option<PathBuf>,
}

impl Backend {
    /// Creates a plain Terraform backend rooted at `root`.
    #[must_use]
    pub fn terraform(
        binary: impl Into<String>,
        working_dir_flag: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind: BackendKind::Terraform,
            binary: binary.into(),
            working_dir_flag: working_dir_flag.into(),
            root: root.into(),
            wrapper_root: None,
        }
    }

    /// Creates a Terragrunt backend: declarations live under `root`, and
    /// every working directory is addressed under `wrapper_root`.
    #[must_use]
    pub fn terragrunt(
        binary: impl Into<String>,
        working_dir_flag: impl Into<String>,
        root: impl Into<PathBuf>,
        wrapper_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind: BackendKind::Terragrunt,
            binary: binary.into(),
            working_dir_flag: working_dir_flag.into(),
            root: root.into(),
            wrapper_root: Some(wrapper_root.into()),
        }
    }

    /// Picks the backend from configuration: Terragrunt when a wrapper
    /// directory is given, Terraform otherwise.
    #[must_use]
    pub fn from_config(config: &BackendConfig, root: &Path, wrapper_root: Option<&Path>) -> Self {
        match wrapper_root {
            Some(wrapper) => Self::terragrunt(
                &config.terragrunt_binary,
                &config.terragrunt_working_dir_flag,
                root,
                wrapper,
            ),
            None => Self::terraform(
                &config.terraform_binary,
                &config.terraform_working_dir_flag,
                root,
            ),
        }
    }

    /// Returns the binary family.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Returns the binary name or path.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Returns the working-directory flag.
    #[must_use]
    pub fn working_dir_flag(&self) -> &str {
        &self.working_dir_flag
    }

    /// Returns the declaration root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns where the backend should run for a declaration directory.
    ///
    /// Without a wrapper this is the directory itself. With a wrapper it is
    /// `<wrapper>/<directory relative to root>`; a directory outside the root
    /// is passed through unchanged.
    #[must_use]
    pub fn location_for(&self, directory: &Path) -> PathBuf {
        let Some(wrapper) = &self.wrapper_root else {
            return directory.to_path_buf();
        };

        match directory.strip_prefix(&self.root) {
            Ok(relative) if relative.as_os_str().is_empty() => wrapper.clone(),
            Ok(relative) => wrapper.join(relative),
            Err(_) => directory.to_path_buf(),
        }
    }

    /// Returns the `<flag>=<location>` argument for a declaration directory.
    #[must_use]
    pub fn working_dir_arg(&self, directory: &Path) -> String {
        format!(
            "{}={}",
            self.working_dir_flag,
            self.location_for(directory).display()
        )
    }
}
