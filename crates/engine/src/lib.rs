//! Routing engine for Tessera
//!
//! This crate decides which physical index every item lands in and which
//! physical indices every query hits:
//! - SizeManager: "is this partition oversized"
//! - AliasCache: TTL snapshot of each collection's partition topology
//! - DatetimePartitionManager: the partition state machine (create, widen,
//!   split)
//! - Insertion strategies: Datetime (partitioned) and Simple (one index per
//!   collection), behind one trait
//! - Selection strategies: Datetime-based (overlap filter) and Unfiltered,
//!   behind one trait
//! - IndexRouter: builds both strategies from one configuration flag so the
//!   read and write paths never disagree about the partitioning mode

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod insertion;
pub mod partitions;
pub mod router;
pub mod selection;
pub mod size;

pub use cache::{AliasCache, PartitionBoundary, PartitionRecord};
pub use insertion::{DatetimeInsertion, InsertionStrategy, SimpleInsertion};
pub use partitions::DatetimePartitionManager;
pub use router::IndexRouter;
pub use selection::{DatetimeSelection, SelectionStrategy, UnfilteredSelection};
pub use size::SizeManager;
