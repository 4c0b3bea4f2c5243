//! Backend index operations
//!
//! Thin mechanism over a `DocumentStore`: create an index with the default
//! item mapping, rename aliases as one atomic batch, fetch sizes and the
//! latest stored document date. "Already exists" on creation is ignored;
//! every other backend failure surfaces unmodified to the caller. No caching
//! and no policy live here.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tessera_core::{AliasAction, DocumentStore, Error, Result};
use tracing::debug;

/// Default mapping for item indices: keyword id, date-typed temporal triple.
pub fn default_item_mapping() -> serde_json::Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "collection": { "type": "keyword" },
            "datetime": { "type": "date" },
            "start_datetime": { "type": "date" },
            "end_datetime": { "type": "date" }
        }
    })
}

/// Default settings for item indices.
pub fn default_item_settings() -> serde_json::Value {
    json!({
        "index": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        }
    })
}

/// Thin index/alias operations over a document store.
#[derive(Clone)]
pub struct IndexOps {
    store: Arc<dyn DocumentStore>,
}

impl IndexOps {
    /// Wrap a document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        IndexOps { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create `index` with the given aliases and the default item
    /// mapping/settings. An index that already exists is success.
    ///
    /// # Errors
    /// Any backend failure other than "already exists".
    pub fn create_index(&self, index: &str, aliases: &[String]) -> Result<()> {
        match self
            .store
            .create_index(index, aliases, &default_item_mapping(), &default_item_settings())
        {
            Ok(()) => Ok(()),
            Err(Error::IndexAlreadyExists(name)) => {
                debug!(target: "tessera::store", index = %name, "Index already exists, ignoring");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Swap alias names on one index as a single atomic batch: every name in
    /// `old` is removed and every name in `new` is added in the same update.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the batch.
    pub fn rename_aliases(&self, old: &[String], new: &[String], index: &str) -> Result<()> {
        let mut actions = Vec::with_capacity(old.len() + new.len());
        for alias in old {
            actions.push(AliasAction::Remove {
                index: index.to_string(),
                alias: alias.clone(),
            });
        }
        for alias in new {
            actions.push(AliasAction::Add {
                index: index.to_string(),
                alias: alias.clone(),
            });
        }
        if actions.is_empty() {
            return Ok(());
        }
        debug!(
            target: "tessera::store",
            index = %index,
            removed = old.len(),
            added = new.len(),
            "Renaming aliases"
        );
        self.store.update_aliases(&actions)
    }

    /// Resolve an alias to its physical index.
    ///
    /// # Errors
    /// `Error::UnresolvedAlias` if the alias points at nothing.
    pub fn index_for_alias(&self, alias: &str) -> Result<String> {
        self.store
            .resolve_alias(alias)?
            .ok_or_else(|| Error::UnresolvedAlias(alias.to_string()))
    }

    /// Every physical index carrying an alias under `prefix`, with its
    /// full alias set.
    ///
    /// # Errors
    /// Returns an error if the listing fails.
    pub fn aliases_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Vec<String>>> {
        self.store.aliases_by_prefix(prefix)
    }

    /// Storage size in bytes of an index or alias target.
    ///
    /// # Errors
    /// Returns an error if the stats call fails.
    pub fn index_size_bytes(&self, target: &str) -> Result<u64> {
        self.store.index_size_bytes(target)
    }

    /// Date of the most recent document in `target` by `field`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn latest_document_datetime(
        &self,
        target: &str,
        field: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        self.store.latest_document_datetime(target, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn ops() -> (Arc<MemoryStore>, IndexOps) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), IndexOps::new(store))
    }

    #[test]
    fn test_create_index_is_idempotent() {
        let (_, ops) = ops();
        let aliases = vec!["items_col".to_string()];
        ops.create_index("items_col_abc", &aliases).unwrap();
        // Second create of the same name is swallowed, not an error.
        ops.create_index("items_col_abc", &aliases).unwrap();
    }

    #[test]
    fn test_rename_aliases_batch() {
        let (store, ops) = ops();
        ops.create_index(
            "items_col_abc",
            &[
                "items_col".to_string(),
                "items_col_datetime_2020-02-12".to_string(),
            ],
        )
        .unwrap();
        ops.rename_aliases(
            &["items_col_datetime_2020-02-12".to_string()],
            &["items_col_datetime_2012-02-12".to_string()],
            "items_col_abc",
        )
        .unwrap();
        assert_eq!(
            store.aliases_of("items_col_abc"),
            vec!["items_col", "items_col_datetime_2012-02-12"]
        );
    }

    #[test]
    fn test_index_for_alias_unresolved() {
        let (_, ops) = ops();
        let err = ops.index_for_alias("items_ghost").unwrap_err();
        assert!(matches!(err, Error::UnresolvedAlias(_)));
    }

    #[test]
    fn test_default_mapping_has_temporal_triple() {
        let mapping = default_item_mapping();
        for field in ["start_datetime", "datetime", "end_datetime"] {
            assert_eq!(mapping["properties"][field]["type"], "date");
        }
    }
}
