//! Inventory fetcher trait and its backend implementation.

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use crate::backend::{Backend, CommandRunner};
use crate::error::{Result, StateError, TfImportError};

use super::inventory::Inventory;

/// Retrieves the tracked-resource inventory of a working directory.
#[async_trait]
pub trait InventoryFetcher: Send + Sync {
    /// Fetches the inventory for `directory`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be pulled or parsed.
    async fn fetch(&self, directory: &Path) -> Result<Inventory>;
}

/// Fetches inventories with `<binary> <flag>=<location> state pull`.
#[derive(Debug)]
pub struct BackendInventoryFetcher<'a, R: CommandRunner + ?Sized> {
    backend: &'a Backend,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> BackendInventoryFetcher<'a, R> {
    /// Creates a new fetcher.
    #[must_use]
    pub const fn new(backend: &'a Backend, runner: &'a R) -> Self {
        Self { backend, runner }
    }

    fn state_pull_args(&self, directory: &Path) -> Vec<String> {
        vec![
            self.backend.working_dir_arg(directory),
            String::from("state"),
            String::from("pull"),
        ]
    }
}

#[async_trait]
impl<R: CommandRunner + ?Sized> InventoryFetcher for BackendInventoryFetcher<'_, R> {
    async fn fetch(&self, directory: &Path) -> Result<Inventory> {
        info!("Pulling state for {}", directory.display());

        let args = self.state_pull_args(directory);
        let output = self
            .runner
            .run(self.backend.binary(), &args, None)
            .await
            .map_err(|e| {
                TfImportError::State(StateError::FetchFailed {
                    directory: directory.to_path_buf(),
                    message: e.to_string(),
                })
            })?;

        if !output.success {
            return Err(TfImportError::State(StateError::CommandFailed {
                directory: directory.to_path_buf(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }));
        }

        let inventory = Inventory::parse(&output.stdout, directory)?;
        debug!(
            "{} tracked resources in {}",
            inventory.len(),
            directory.display()
        );
        Ok(inventory)
    }
}
