//! Tracked state module for tfimport.
//!
//! This module reads the backend's state for one working directory and
//! exposes it as an [`Inventory`] of already managed addresses.

mod fetcher;
mod inventory;

pub use fetcher::{BackendInventoryFetcher, InventoryFetcher};
pub use inventory::{Inventory, StateResource, StateSnapshot};
