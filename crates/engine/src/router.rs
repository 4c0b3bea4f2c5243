//! Router: strategy construction and shared wiring
//!
//! One `IndexRouter` is built at service start from the routing config and
//! the backend handle. It owns the single alias cache and size manager and
//! hands out the insertion and selection strategies, both derived from the
//! same partitioning flag, so the read and write paths cannot disagree
//! about the active mode. Nothing here is a hidden static: drop the router
//! and the cache goes with it.

use std::sync::Arc;

use tessera_core::{BoundaryKind, DocumentStore, NameScheme, RoutingConfig};
use tessera_storage::IndexOps;
use tracing::info;

use crate::cache::AliasCache;
use crate::insertion::{DatetimeInsertion, InsertionStrategy, SimpleInsertion};
use crate::partitions::DatetimePartitionManager;
use crate::selection::{DatetimeSelection, SelectionStrategy, UnfilteredSelection};
use crate::size::SizeManager;

/// Strategy factory plus the shared cache/size components.
pub struct IndexRouter {
    config: RoutingConfig,
    scheme: NameScheme,
    ops: IndexOps,
    cache: Arc<AliasCache>,
    size: Arc<SizeManager>,
}

impl IndexRouter {
    /// Wire up the router from configuration and a backend handle.
    pub fn new(config: RoutingConfig, store: Arc<dyn DocumentStore>) -> Self {
        let scheme = NameScheme::new(config.index_prefix.clone());
        let ops = IndexOps::new(store);
        let primary = if config.triple_fields {
            BoundaryKind::StartDatetime
        } else {
            BoundaryKind::Datetime
        };
        let cache = Arc::new(AliasCache::new(
            ops.clone(),
            scheme.clone(),
            primary,
            config.cache_ttl(),
        ));
        let size = Arc::new(SizeManager::new(ops.clone(), config.max_partition_size_gb));
        info!(
            target: "tessera::partition",
            datetime_partitioning = config.datetime_partitioning,
            triple_fields = config.triple_fields,
            max_partition_size_gb = config.max_partition_size_gb,
            "Index router configured"
        );
        IndexRouter {
            config,
            scheme,
            ops,
            cache,
            size,
        }
    }

    /// The write-path strategy for the configured mode.
    pub fn insertion_strategy(&self) -> Arc<dyn InsertionStrategy> {
        if self.config.datetime_partitioning {
            let manager = Arc::new(DatetimePartitionManager::new(
                self.ops.clone(),
                self.cache.clone(),
                self.size.clone(),
                self.scheme.clone(),
                self.config.triple_fields,
            ));
            Arc::new(DatetimeInsertion::new(manager))
        } else {
            Arc::new(SimpleInsertion::new(self.ops.clone(), self.scheme.clone()))
        }
    }

    /// The read-path strategy for the configured mode.
    pub fn selection_strategy(&self) -> Arc<dyn SelectionStrategy> {
        if self.config.datetime_partitioning {
            Arc::new(DatetimeSelection::new(
                self.cache.clone(),
                self.scheme.clone(),
                self.config.triple_fields,
                self.config.use_datetime,
            ))
        } else {
            Arc::new(UnfilteredSelection::new(self.scheme.clone()))
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// The shared alias cache (one per process, owned here).
    pub fn cache(&self) -> &Arc<AliasCache> {
        &self.cache
    }

    /// The index operations handle.
    pub fn ops(&self) -> &IndexOps {
        &self.ops
    }

    /// The alias-name grammar in use.
    pub fn scheme(&self) -> &NameScheme {
        &self.scheme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_storage::MemoryStore;

    #[test]
    fn test_simple_mode_strategies() {
        let config = RoutingConfig::default();
        let router = IndexRouter::new(config, Arc::new(MemoryStore::new()));
        let insertion = router.insertion_strategy();
        assert!(insertion.creates_collection_index());
        let selection = router.selection_strategy();
        assert_eq!(selection.select_indexes(&[], None, false).unwrap(), "items_*");
    }

    #[test]
    fn test_datetime_mode_strategies() {
        let config = RoutingConfig {
            datetime_partitioning: true,
            ..Default::default()
        };
        let router = IndexRouter::new(config, Arc::new(MemoryStore::new()));
        let insertion = router.insertion_strategy();
        // Partitions are created lazily, not on collection creation.
        assert!(!insertion.creates_collection_index());
    }

    #[test]
    fn test_custom_prefix_flows_through() {
        let config = RoutingConfig {
            index_prefix: "stac_".to_string(),
            ..Default::default()
        };
        let router = IndexRouter::new(config, Arc::new(MemoryStore::new()));
        let selection = router.selection_strategy();
        assert_eq!(selection.select_indexes(&[], None, false).unwrap(), "stac_*");
    }
}
