//! Tracked-resource inventory.
//!
//! This module turns a `state pull` snapshot into the set of addresses the
//! backend already manages for one working directory.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::declaration::ResourceAddress;
use crate::error::StateError;

/// Resources already tracked in one directory's state, grouped by type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    by_type: HashMap<String, BTreeSet<String>>,
}

/// The parts of a state snapshot the inventory needs.
#[derive(Debug, Clone, Deserialize)]
pub struct StateSnapshot {
    /// Tracked resources.
    pub resources: Vec<StateResource>,
}

/// One resource entry of a state snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct StateResource {
    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Local name.
    pub name: String,
    /// `managed` or `data`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Module address, absent for root-module resources.
    #[serde(default)]
    pub module: Option<String>,
}

impl StateResource {
    /// Returns true for managed resources of the root module.
    #[must_use]
    pub fn is_root_managed(&self) -> bool {
        self.module.is_none() && self.mode.as_deref() != Some("data")
    }
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a tracked resource.
    pub fn insert(&mut self, resource_type: impl Into<String>, name: impl Into<String>) {
        self.by_type
            .entry(resource_type.into())
            .or_default()
            .insert(name.into());
    }

    /// Returns true if the address is tracked.
    ///
    /// A type missing from the inventory tracks nothing.
    #[must_use]
    pub fn contains(&self, address: &ResourceAddress) -> bool {
        self.by_type
            .get(&address.resource_type)
            .is_some_and(|names| names.contains(&address.name))
    }

    /// Returns the tracked names of one type.
    #[must_use]
    pub fn names(&self, resource_type: &str) -> Option<&BTreeSet<String>> {
        self.by_type.get(resource_type)
    }

    /// Returns the number of tracked resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_type.values().map(BTreeSet::len).sum()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(BTreeSet::is_empty)
    }

    /// Builds an inventory from a parsed snapshot, keeping root-module
    /// managed resources only.
    #[must_use]
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Self {
        let mut inventory = Self::new();
        for resource in snapshot.resources.iter().filter(|r| r.is_root_managed()) {
            inventory.insert(&resource.resource_type, &resource.name);
        }
        inventory
    }

    /// Parses raw `state pull` output.
    ///
    /// Empty output means the directory has no state yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the output is not JSON or has no `resources` list.
    pub fn parse(output: &str, directory: &Path) -> std::result::Result<Self, StateError> {
        if output.trim().is_empty() {
            return Ok(Self::new());
        }

        let snapshot: StateSnapshot = serde_json::from_str(output)
            .map_err(|e| StateError::malformed(directory, e.to_string()))?;
        Ok(Self::from_snapshot(&snapshot))
    }
}

impl<S: Into<String>> FromIterator<(S, S)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        let mut inventory = Self::new();
        for (resource_type, name) in iter {
            inventory.insert(resource_type, name);
        }
        inventory
    }
}
