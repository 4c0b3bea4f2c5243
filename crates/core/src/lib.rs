//! Core types and traits for Tessera
//!
//! This crate defines the foundational pieces used throughout the system:
//! - ItemTimes: the (start_datetime, datetime, end_datetime) temporal triple
//! - DatetimeRange: normalized query bounds with the interval overlap test
//! - BoundaryKind: which temporal field a boundary alias tracks
//! - NameScheme: the alias-name grammar (collection/boundary/physical names)
//! - RoutingConfig: process-wide routing configuration
//! - Error: error type hierarchy
//! - Traits: the DocumentStore backend seam

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alias;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use alias::{NameScheme, ParsedBoundary};
pub use config::{
    RoutingConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_INDEX_PREFIX, DEFAULT_MAX_PARTITION_SIZE_GB,
};
pub use error::{Error, Result};
pub use traits::{AliasAction, DocumentStore};
pub use types::{BoundaryKind, BulkAction, CatalogItem, DatetimeRange, ItemTimes};
