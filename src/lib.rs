//! Tessera: time-partitioned index routing for STAC catalogs
//!
//! Items of one logical collection are spread across many physical
//! search-backend indices over time; Tessera decides which index every
//! insert lands in and which indices every query hits.
//!
//! The facade re-exports the workspace crates:
//! - `core`: types, errors, config, the alias grammar, the backend seam
//! - `storage`: index operations and the in-memory reference store
//! - `engine`: the cache, the partition state machine, the strategies,
//!   and the `IndexRouter` factory
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//! use tessera::{
//!     CatalogItem, IndexRouter, InsertionStrategy, ItemTimes, MemoryStore, RoutingConfig,
//!     SelectionStrategy,
//! };
//!
//! let config = RoutingConfig {
//!     datetime_partitioning: true,
//!     ..Default::default()
//! };
//! let router = IndexRouter::new(config, Arc::new(MemoryStore::new()));
//! let insertion = router.insertion_strategy();
//! let selection = router.selection_strategy();
//!
//! let datetime = "2020-02-12T00:00:00Z".parse().unwrap();
//! let item = CatalogItem::new(
//!     "item-1",
//!     ItemTimes::nominal(datetime),
//!     serde_json::json!({"id": "item-1"}),
//! );
//! let target = insertion.target_index("sentinel-2", &item).unwrap();
//! assert_eq!(target, "items_sentinel-2_datetime_2020-02-12");
//!
//! let all = selection.select_indexes(&[], None, false).unwrap();
//! assert_eq!(all, "items_*");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use tessera_core::{
    AliasAction, BoundaryKind, BulkAction, CatalogItem, DatetimeRange, DocumentStore, Error,
    ItemTimes, NameScheme, Result, RoutingConfig,
};
pub use tessera_engine::{
    AliasCache, DatetimeInsertion, DatetimePartitionManager, DatetimeSelection, IndexRouter,
    InsertionStrategy, PartitionBoundary, PartitionRecord, SelectionStrategy, SimpleInsertion,
    SizeManager, UnfilteredSelection,
};
pub use tessera_storage::{IndexOps, MemoryStore};
