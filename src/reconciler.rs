//! Reconciler for finding untracked resources.
//!
//! This module walks the declaration tree one directory at a time, pulls
//! that directory's inventory once, and keeps every declared resource the
//! backend does not track yet. The survivors are collected into a
//! [`NewResourceTable`] that later stages read but never modify.

use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::declaration::{DeclarationExtractor, DeclaredResource, ResourceAddress};
use crate::error::Result;
use crate::state::InventoryFetcher;

/// Resources of one type, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TypeGroup {
    resource_type: String,
    resources: Vec<DeclaredResource>,
    positions: HashMap<String, usize>,
}

/// New resources keyed by type then name.
///
/// Iteration follows first-seen type order, then first-seen name order
/// within a type. Inserting an address that is already present replaces the
/// record in place, keeping its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewResourceTable {
    groups: Vec<TypeGroup>,
    group_positions: HashMap<String, usize>,
}

impl NewResourceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resource, returning the record it replaced.
    ///
    /// A duplicate address replaces the whole record at its original
    /// position; fields of the earlier declaration are not merged in.
    pub fn insert(&mut self, resource: DeclaredResource) -> Option<DeclaredResource> {
        let group_index = match self.group_positions.get(&resource.address.resource_type) {
            Some(&index) => index,
            None => {
                let index = self.groups.len();
                self.group_positions
                    .insert(resource.address.resource_type.clone(), index);
                self.groups.push(TypeGroup {
                    resource_type: resource.address.resource_type.clone(),
                    resources: Vec::new(),
                    positions: HashMap::new(),
                });
                index
            }
        };

        let group = &mut self.groups[group_index];
        if let Some(&position) = group.positions.get(&resource.address.name) {
            return Some(std::mem::replace(&mut group.resources[position], resource));
        }

        group
            .positions
            .insert(resource.address.name.clone(), group.resources.len());
        group.resources.push(resource);
        None
    }

    /// Looks up a resource by address.
    #[must_use]
    pub fn get(&self, address: &ResourceAddress) -> Option<&DeclaredResource> {
        let group = &self.groups[*self.group_positions.get(&address.resource_type)?];
        group
            .positions
            .get(&address.name)
            .map(|&position| &group.resources[position])
    }

    /// Returns true if the address is in the table.
    #[must_use]
    pub fn contains(&self, address: &ResourceAddress) -> bool {
        self.get(address).is_some()
    }

    /// Iterates over all resources in table order.
    pub fn iter(&self) -> impl Iterator<Item = &DeclaredResource> {
        self.groups.iter().flat_map(|group| group.resources.iter())
    }

    /// Iterates over the resource types in first-seen order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.resource_type.as_str())
    }

    /// Returns the number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.resources.len()).sum()
    }

    /// Returns true if the table holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|group| group.resources.is_empty())
    }
}

impl<'a> IntoIterator for &'a NewResourceTable {
    type Item = &'a DeclaredResource;
    type IntoIter = Box<dyn Iterator<Item = &'a DeclaredResource> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl FromIterator<DeclaredResource> for NewResourceTable {
    fn from_iter<I: IntoIterator<Item = DeclaredResource>>(iter: I) -> Self {
        let mut table = Self::new();
        for resource in iter {
            table.insert(resource);
        }
        table
    }
}

impl Serialize for NewResourceTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Reconciler that pairs each declaration directory with its inventory.
#[derive(Debug)]
pub struct Reconciler<'a, F: InventoryFetcher + ?Sized> {
    /// Declaration extractor.
    extractor: &'a DeclarationExtractor,
    /// Inventory fetcher.
    fetcher: &'a F,
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReconciliationResult {
    /// Resources that are declared but not tracked.
    pub table: NewResourceTable,
    /// Number of directories whose inventory was pulled.
    pub directories: usize,
    /// Number of resource blocks declared.
    pub declared: usize,
    /// Number of declared resources already tracked.
    pub tracked: usize,
    /// Addresses declared more than once; the last declaration won.
    pub overwritten: Vec<ResourceAddress>,
}

impl<'a, F: InventoryFetcher + ?Sized> Reconciler<'a, F> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(extractor: &'a DeclarationExtractor, fetcher: &'a F) -> Self {
        Self { extractor, fetcher }
    }

    /// Reconciles every declaration directory under `root`.
    ///
    /// Directories are processed sequentially. Each one that declares at
    /// least one resource gets exactly one inventory fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if any inventory fetch fails.
    pub async fn reconcile(&self, root: &Path) -> Result<ReconciliationResult> {
        info!("Starting reconciliation under {}", root.display());

        let mut result = ReconciliationResult {
            table: NewResourceTable::new(),
            directories: 0,
            declared: 0,
            tracked: 0,
            overwritten: Vec::new(),
        };

        for scan in self.extractor.scan(root) {
            let declared = self.extractor.parse_directory(&scan);
            if declared.is_empty() {
                debug!("No resource blocks in {}", scan.directory.display());
                continue;
            }

            let inventory = self.fetcher.fetch(&scan.directory).await?;
            result.directories += 1;
            result.declared += declared.len();

            for resource in declared {
                if inventory.contains(&resource.address) {
                    debug!("{} is already tracked", resource.address);
                    result.tracked += 1;
                    continue;
                }

                let address = resource.address.clone();
                if let Some(previous) = result.table.insert(resource) {
                    warn!(
                        "{address} is declared in both {} and {}; keeping the later declaration",
                        previous.source_file.display(),
                        result
                            .table
                            .get(&address)
                            .map_or_else(String::new, |r| r.source_file.display().to_string())
                    );
                    result.overwritten.push(address);
                }
            }
        }

        info!(
            "Reconciliation found {} new resources ({} declared, {} tracked, {} directories)",
            result.table.len(),
            result.declared,
            result.tracked,
            result.directories
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::FieldValue;
    use crate::state::Inventory;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves fixed inventories and records which directories were asked.
    #[derive(Default)]
    struct FakeFetcher {
        inventories: HashMap<PathBuf, Inventory>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl FakeFetcher {
        fn with(mut self, directory: PathBuf, inventory: Inventory) -> Self {
            self.inventories.insert(directory, inventory);
            self
        }

        fn calls(&self) -> Vec<PathBuf> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl InventoryFetcher for FakeFetcher {
        async fn fetch(&self, directory: &Path) -> Result<Inventory> {
            self.calls.lock().expect("calls lock").push(directory.to_path_buf());
            Ok(self.inventories.get(directory).cloned().unwrap_or_default())
        }
    }

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::create_dir_all(dir).expect("Failed to create dir");
        std::fs::write(dir.join(file), content).expect("Failed to write file");
    }

    fn role(name: &str, role_name: &str) -> String {
        format!("resource \"aws_iam_role\" \"{name}\" {{\n  name = \"{role_name}\"\n}}\n")
    }

    fn resource(resource_type: &str, name: &str, dir: &str) -> DeclaredResource {
        DeclaredResource {
            address: ResourceAddress::new(resource_type, name),
            fields: BTreeMap::from([(
                String::from("name"),
                FieldValue::Literal(format!("{name}-{dir}")),
            )]),
            source_directory: PathBuf::from(dir),
            source_file: PathBuf::from(dir).join("main.tf"),
        }
    }

    #[test]
    fn test_table_orders_by_first_seen_type_then_name() {
        let table: NewResourceTable = [
            resource("aws_iam_role", "b", "x"),
            resource("aws_iam_policy", "p", "x"),
            resource("aws_iam_role", "a", "x"),
        ]
        .into_iter()
        .collect();

        let order: Vec<String> = table.iter().map(|r| r.address.to_string()).collect();
        assert_eq!(
            order,
            vec!["aws_iam_role.b", "aws_iam_role.a", "aws_iam_policy.p"]
        );
        assert_eq!(table.types().collect::<Vec<_>>(), vec!["aws_iam_role", "aws_iam_policy"]);
    }

    #[test]
    fn test_table_replaces_in_place() {
        let mut table = NewResourceTable::new();
        table.insert(resource("aws_iam_role", "a", "first"));
        table.insert(resource("aws_iam_role", "b", "first"));
        let previous = table.insert(resource("aws_iam_role", "a", "second"));

        assert_eq!(
            previous.map(|r| r.source_directory),
            Some(PathBuf::from("first"))
        );
        assert_eq!(table.len(), 2);
        let first = table.iter().next().expect("table has entries");
        assert_eq!(first.source_directory, PathBuf::from("second"));
    }

    #[test]
    fn test_table_replace_does_not_merge_fields() {
        let mut table = NewResourceTable::new();
        let mut with_path = resource("aws_iam_policy", "deploy", "first");
        with_path.fields.insert(
            String::from("path"),
            FieldValue::Literal(String::from("/service/")),
        );
        table.insert(with_path);
        table.insert(resource("aws_iam_policy", "deploy", "second"));

        let stored = table
            .get(&ResourceAddress::new("aws_iam_policy", "deploy"))
            .expect("resource is stored");
        assert_eq!(stored.field("path"), None);
        assert_eq!(
            stored.field("name"),
            Some(&FieldValue::Literal(String::from("deploy-second")))
        );
    }

    #[tokio::test]
    async fn test_tracked_resources_are_filtered() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let iam = temp.path().join("iam");
        write(&iam, "main.tf", &(role("app", "app-role") + &role("worker", "worker-role")));

        let fetcher = FakeFetcher::default()
            .with(iam.clone(), [("aws_iam_role", "app")].into_iter().collect());
        let extractor = DeclarationExtractor::new();
        let result = Reconciler::new(&extractor, &fetcher)
            .reconcile(temp.path())
            .await
            .expect("reconcile should succeed");

        assert_eq!(result.declared, 2);
        assert_eq!(result.tracked, 1);
        assert!(!result.table.contains(&ResourceAddress::new("aws_iam_role", "app")));
        assert!(result.table.contains(&ResourceAddress::new("aws_iam_role", "worker")));
    }

    #[tokio::test]
    async fn test_missing_type_means_all_new() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "main.tf", &(role("app", "app-role") + &role("worker", "worker-role")));

        let fetcher = FakeFetcher::default().with(
            temp.path().to_path_buf(),
            [("aws_s3_bucket", "app")].into_iter().collect(),
        );
        let extractor = DeclarationExtractor::new();
        let result = Reconciler::new(&extractor, &fetcher)
            .reconcile(temp.path())
            .await
            .expect("reconcile should succeed");

        assert_eq!(result.table.len(), 2);
    }

    #[tokio::test]
    async fn test_inventory_is_directory_scoped() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let x = temp.path().join("x");
        let y = temp.path().join("y");
        write(&x, "main.tf", &role("app", "x-role"));
        write(&x, "variables.tf", "variable \"prefix\" {}\n");
        write(&y, "main.tf", &role("app", "y-role"));

        let fetcher = FakeFetcher::default()
            .with(x.clone(), [("aws_iam_role", "app")].into_iter().collect());
        let extractor = DeclarationExtractor::new();
        let result = Reconciler::new(&extractor, &fetcher)
            .reconcile(temp.path())
            .await
            .expect("reconcile should succeed");

        assert_eq!(fetcher.calls(), vec![x, y.clone()]);
        assert_eq!(result.directories, 2);

        let app = result
            .table
            .get(&ResourceAddress::new("aws_iam_role", "app"))
            .expect("app is new in y");
        assert_eq!(app.source_directory, y);
        assert!(result.overwritten.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_address_last_write_wins() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        write(&a, "main.tf", &(role("app", "from-a") + &role("other", "other-role")));
        write(&b, "main.tf", &role("app", "from-b"));

        let fetcher = FakeFetcher::default();
        let extractor = DeclarationExtractor::new();
        let result = Reconciler::new(&extractor, &fetcher)
            .reconcile(temp.path())
            .await
            .expect("reconcile should succeed");

        let app = result
            .table
            .get(&ResourceAddress::new("aws_iam_role", "app"))
            .expect("app is new");
        assert_eq!(app.field("name").and_then(FieldValue::as_literal), Some("from-b"));
        assert_eq!(app.source_directory, b);
        assert_eq!(result.overwritten, vec![ResourceAddress::new("aws_iam_role", "app")]);

        let order: Vec<String> = result.table.iter().map(|r| r.address.name.clone()).collect();
        assert_eq!(order, vec!["app", "other"]);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent_and_sound() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let iam = temp.path().join("iam");
        let ecr = temp.path().join("ecr");
        write(&iam, "main.tf", &(role("app", "app-role") + &role("ci", "ci-role")));
        write(
            &ecr,
            "main.tf.json",
            r#"{"resource": {"aws_ecr_repository": {"api": {"name": "api"}}}}"#,
        );

        let inventory: Inventory = [("aws_iam_role", "ci")].into_iter().collect();
        let fetcher = FakeFetcher::default().with(iam.clone(), inventory.clone());
        let extractor = DeclarationExtractor::new();
        let reconciler = Reconciler::new(&extractor, &fetcher);

        let first = reconciler.reconcile(temp.path()).await.expect("first run");
        let second = reconciler.reconcile(temp.path()).await.expect("second run");

        assert_eq!(first, second);
        assert_eq!(first.table.len(), 2);
        for resource in &first.table {
            if resource.source_directory == iam {
                assert!(!inventory.contains(&resource.address));
            }
        }
        assert!(first.table.contains(&ResourceAddress::new("aws_ecr_repository", "api")));
    }

    #[tokio::test]
    async fn test_directory_without_resources_is_not_fetched() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "versions.tf", "terraform {\n  required_version = \">= 1.5\"\n}\n");

        let fetcher = FakeFetcher::default();
        let extractor = DeclarationExtractor::new();
        let result = Reconciler::new(&extractor, &fetcher)
            .reconcile(temp.path())
            .await
            .expect("reconcile should succeed");

        assert!(fetcher.calls().is_empty());
        assert!(result.table.is_empty());
    }
}
