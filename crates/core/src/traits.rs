//! The document-store seam
//!
//! This module defines the `DocumentStore` trait: the opaque boundary to the
//! Elasticsearch/OpenSearch-class backend. The routing engine only needs the
//! index+alias primitives listed here; everything else about the backend
//! (query DSL, bulk API, mappings beyond creation) is someone else's problem.
//!
//! The trait enables swapping the real HTTP client for the in-memory
//! reference store without breaking upper layers.
//!
//! Thread safety: all methods must be safe to call concurrently from
//! multiple threads (requires Send + Sync).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::Result;

/// One entry of an atomic alias-update batch.
///
/// The backend applies the whole batch atomically; mixing adds and removes
/// is how boundary aliases are renamed without a window where neither name
/// resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasAction {
    /// Point `alias` at `index`.
    Add {
        /// Physical index name
        index: String,
        /// Alias name
        alias: String,
    },
    /// Stop pointing `alias` at `index`.
    Remove {
        /// Physical index name
        index: String,
        /// Alias name
        alias: String,
    },
}

/// Index+alias primitives of the document store.
///
/// Implementations surface backend failures as `Error::Backend` unmodified;
/// the routing engine performs no retries of its own. Alias adds are
/// last-write-wins at the backend, which is where the cross-process
/// partition-creation race lives (see the partition manager docs).
pub trait DocumentStore: Send + Sync {
    /// Create a physical index with the given aliases, mapping and settings.
    ///
    /// # Errors
    /// `Error::IndexAlreadyExists` if the name is taken (callers above the
    /// raw store treat that as success); `Error::Backend` otherwise.
    fn create_index(
        &self,
        index: &str,
        aliases: &[String],
        mapping: &serde_json::Value,
        settings: &serde_json::Value,
    ) -> Result<()>;

    /// Apply an alias-update batch atomically.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the batch; no partial
    /// application is observable.
    fn update_aliases(&self, actions: &[AliasAction]) -> Result<()>;

    /// Every physical index whose alias set contains at least one alias
    /// starting with `prefix`, mapped to its full alias set.
    ///
    /// # Errors
    /// Returns an error if the listing fails.
    fn aliases_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Vec<String>>>;

    /// Resolve an alias to the physical index it points at, if any.
    ///
    /// # Errors
    /// Returns an error if the lookup fails.
    fn resolve_alias(&self, alias: &str) -> Result<Option<String>>;

    /// Storage size in bytes of an index (or of the index behind an alias).
    ///
    /// # Errors
    /// Returns an error if the target does not exist or the stats call fails.
    fn index_size_bytes(&self, target: &str) -> Result<u64>;

    /// The most recent value of `field` across documents in `target`
    /// (sorted descending by that field, projecting only that field).
    ///
    /// Returns `None` for an empty index.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    fn latest_document_datetime(
        &self,
        target: &str,
        field: &str,
    ) -> Result<Option<DateTime<Utc>>>;
}
