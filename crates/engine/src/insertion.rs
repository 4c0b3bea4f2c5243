//! Insertion strategies
//!
//! The write path talks to one `InsertionStrategy`, chosen once at startup.
//! Datetime mode delegates every decision to the partition manager and
//! provisions partitions lazily on the first item; simple mode keeps one
//! index per collection, provisioned eagerly when the collection is created.

use std::sync::Arc;

use tessera_core::{BulkAction, CatalogItem, NameScheme, Result};
use tessera_storage::IndexOps;
use tracing::info;

use crate::partitions::DatetimePartitionManager;

/// Write-path policy: where does an item (or a batch) go.
pub trait InsertionStrategy: Send + Sync {
    /// Target alias for a single item.
    ///
    /// # Errors
    /// `Error::Validation` for bad temporal fields; backend failures
    /// unmodified.
    fn target_index(&self, collection_id: &str, item: &CatalogItem) -> Result<String>;

    /// Resolve targets for a batch, one action per item.
    ///
    /// # Errors
    /// Same taxonomy as `target_index`; any invalid item rejects the whole
    /// batch before any backend mutation.
    fn bulk_actions(&self, collection_id: &str, items: Vec<CatalogItem>)
        -> Result<Vec<BulkAction>>;

    /// Whether the collection-creation path should provision an index for a
    /// new collection up front, independent of any item.
    fn creates_collection_index(&self) -> bool;

    /// Provision whatever `creates_collection_index` promises. A no-op for
    /// strategies that create partitions lazily.
    ///
    /// # Errors
    /// Backend failures unmodified.
    fn provision_collection(&self, collection_id: &str) -> Result<()>;
}

/// Time-partitioned insertion: every decision goes through the partition
/// state machine.
pub struct DatetimeInsertion {
    manager: Arc<DatetimePartitionManager>,
}

impl DatetimeInsertion {
    /// Create the strategy around a partition manager.
    pub fn new(manager: Arc<DatetimePartitionManager>) -> Self {
        DatetimeInsertion { manager }
    }
}

impl InsertionStrategy for DatetimeInsertion {
    fn target_index(&self, collection_id: &str, item: &CatalogItem) -> Result<String> {
        self.manager.route_item(collection_id, item)
    }

    fn bulk_actions(
        &self,
        collection_id: &str,
        items: Vec<CatalogItem>,
    ) -> Result<Vec<BulkAction>> {
        self.manager.prepare_bulk(collection_id, items)
    }

    fn creates_collection_index(&self) -> bool {
        // Partitions are created lazily by the first item.
        false
    }

    fn provision_collection(&self, _collection_id: &str) -> Result<()> {
        Ok(())
    }
}

/// One index per collection, no partitioning. The degenerate case the
/// engine supports interchangeably with datetime mode.
pub struct SimpleInsertion {
    ops: IndexOps,
    scheme: NameScheme,
}

impl SimpleInsertion {
    /// Create the strategy.
    pub fn new(ops: IndexOps, scheme: NameScheme) -> Self {
        SimpleInsertion { ops, scheme }
    }
}

impl InsertionStrategy for SimpleInsertion {
    fn target_index(&self, collection_id: &str, _item: &CatalogItem) -> Result<String> {
        Ok(self.scheme.collection_alias(collection_id))
    }

    fn bulk_actions(
        &self,
        collection_id: &str,
        items: Vec<CatalogItem>,
    ) -> Result<Vec<BulkAction>> {
        let target = self.scheme.collection_alias(collection_id);
        Ok(items
            .into_iter()
            .map(|item| BulkAction {
                target: target.clone(),
                doc_id: item.id,
                document: item.document,
            })
            .collect())
    }

    fn creates_collection_index(&self) -> bool {
        true
    }

    fn provision_collection(&self, collection_id: &str) -> Result<()> {
        let alias = self.scheme.collection_alias(collection_id);
        let index = self.scheme.physical_index(collection_id);
        self.ops.create_index(&index, &[alias])?;
        info!(
            target: "tessera::partition",
            collection = %collection_id,
            index = %index,
            "Provisioned collection index"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_core::ItemTimes;
    use tessera_storage::MemoryStore;

    fn simple() -> (Arc<MemoryStore>, SimpleInsertion) {
        let store = Arc::new(MemoryStore::new());
        let ops = IndexOps::new(store.clone());
        (store, SimpleInsertion::new(ops, NameScheme::new("items_")))
    }

    #[test]
    fn test_simple_targets_collection_alias() {
        let (_, strategy) = simple();
        let item = CatalogItem::new("a", ItemTimes::default(), json!({}));
        assert_eq!(
            strategy.target_index("Sentinel-2", &item).unwrap(),
            "items_sentinel-2"
        );
        assert!(strategy.creates_collection_index());
    }

    #[test]
    fn test_simple_provision_creates_one_index() {
        let (store, strategy) = simple();
        strategy.provision_collection("col").unwrap();
        assert_eq!(store.index_names().len(), 1);
        let index = store.index_names().pop().unwrap();
        assert_eq!(store.aliases_of(&index), vec!["items_col"]);
    }

    #[test]
    fn test_simple_bulk_maps_every_item() {
        let (_, strategy) = simple();
        let items = vec![
            CatalogItem::new("a", ItemTimes::default(), json!({"id": "a"})),
            CatalogItem::new("b", ItemTimes::default(), json!({"id": "b"})),
        ];
        let actions = strategy.bulk_actions("col", items).unwrap();
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.target == "items_col"));
        assert_eq!(actions[0].doc_id, "a");
    }
}
