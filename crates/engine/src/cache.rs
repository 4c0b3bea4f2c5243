//! Alias topology cache
//!
//! A process-wide, TTL-expiring snapshot mapping each collection alias to
//! its ordered partition list. Rebuilding one collection's view requires
//! scanning every alias under the items prefix, so refreshes are deliberately
//! infrequent: the TTL (default 3600 s) expires them, and topology-changing
//! writes force one.
//!
//! The snapshot sits behind a plain mutex. A read that finds a valid
//! snapshot clones the collection's partition list and never touches the
//! backend; a miss or expiry reloads synchronously before serving. `refresh`
//! replaces the snapshot wholesale.
//!
//! The cache is an explicit component owned by the router and injected into
//! the strategies; there is no module-level singleton to tear down.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use parking_lot::Mutex;
use tessera_core::{BoundaryKind, NameScheme, Result};
use tessera_storage::IndexOps;
use tracing::{debug, warn};

/// One boundary alias of a partition, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionBoundary {
    /// Full alias name as it exists in the backend
    pub alias: String,
    /// Which temporal field this boundary tracks
    pub kind: BoundaryKind,
    /// Encoded start date
    pub start: NaiveDate,
    /// Encoded end date; `None` while the partition is open
    pub end: Option<NaiveDate>,
}

/// One partition of a collection: a physical index plus its alias group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRecord {
    /// Physical index name (opaque, never addressed semantically)
    pub index: String,
    /// Alias shared by every partition of the collection
    pub collection_alias: String,
    /// Decoded boundary aliases, one per tracked kind
    pub boundaries: Vec<PartitionBoundary>,
}

impl PartitionRecord {
    /// The boundary of the given kind, if this partition tracks it.
    pub fn boundary(&self, kind: BoundaryKind) -> Option<&PartitionBoundary> {
        self.boundaries.iter().find(|b| b.kind == kind)
    }

    /// Start date of the given kind's boundary.
    pub fn start_of(&self, kind: BoundaryKind) -> Option<NaiveDate> {
        self.boundary(kind).map(|b| b.start)
    }

    /// End date of the given kind's boundary (`None` while open).
    pub fn end_of(&self, kind: BoundaryKind) -> Option<NaiveDate> {
        self.boundary(kind).and_then(|b| b.end)
    }
}

struct Snapshot {
    loaded_at: Instant,
    collections: HashMap<String, Vec<PartitionRecord>>,
}

/// TTL-expiring snapshot of the alias topology.
pub struct AliasCache {
    ops: IndexOps,
    scheme: NameScheme,
    primary: BoundaryKind,
    ttl: Duration,
    snapshot: Mutex<Option<Snapshot>>,
}

impl AliasCache {
    /// Create a cache. `primary` is the boundary kind partitions are
    /// ordered by (the same kind the write path routes on).
    pub fn new(ops: IndexOps, scheme: NameScheme, primary: BoundaryKind, ttl: Duration) -> Self {
        AliasCache {
            ops,
            scheme,
            primary,
            ttl,
            snapshot: Mutex::new(None),
        }
    }

    /// The kind partitions are ordered by.
    pub fn primary_kind(&self) -> BoundaryKind {
        self.primary
    }

    /// Partitions of one collection, ordered by boundary start date.
    /// Empty if the collection has no partitions yet.
    ///
    /// Serves from the snapshot when it is younger than the TTL; otherwise
    /// reloads synchronously first.
    ///
    /// # Errors
    /// Returns an error if a reload was needed and the backend scan failed.
    pub fn collection_partitions(&self, collection_id: &str) -> Result<Vec<PartitionRecord>> {
        let alias = self.scheme.collection_alias(collection_id);
        let mut guard = self.snapshot.lock();
        match guard.as_ref() {
            Some(snapshot) if snapshot.loaded_at.elapsed() < self.ttl => {
                Ok(snapshot.collections.get(&alias).cloned().unwrap_or_default())
            }
            _ => {
                let snapshot = self.load()?;
                let partitions = snapshot.collections.get(&alias).cloned().unwrap_or_default();
                *guard = Some(snapshot);
                Ok(partitions)
            }
        }
    }

    /// Unconditionally reload from the backend and replace the snapshot.
    ///
    /// Every topology-changing write calls this before returning, or later
    /// readers would route against stale topology.
    ///
    /// # Errors
    /// Returns an error if the backend scan failed; the previous snapshot
    /// is kept in that case.
    pub fn refresh(&self) -> Result<()> {
        let snapshot = self.load()?;
        *self.snapshot.lock() = Some(snapshot);
        Ok(())
    }

    /// Scan all aliases under the prefix and rebuild the full topology.
    fn load(&self) -> Result<Snapshot> {
        let grouped = self.ops.aliases_by_prefix(self.scheme.prefix())?;
        let mut collections: HashMap<String, Vec<PartitionRecord>> = HashMap::new();

        for (index, mut aliases) in grouped {
            aliases.sort();
            // First alias lexicographically is the canonical collection
            // alias; the grammar guarantees it sorts before its boundaries.
            let Some(collection_alias) = aliases.first().cloned() else {
                continue;
            };
            let mut boundaries = Vec::new();
            for alias in aliases.iter().skip(1) {
                match self.scheme.parse_boundary(alias) {
                    Some(parsed) => boundaries.push(PartitionBoundary {
                        alias: alias.clone(),
                        kind: parsed.kind,
                        start: parsed.start,
                        end: parsed.end,
                    }),
                    None => {
                        // Foreign or malformed alias on an items index:
                        // skip it, never fail the whole load.
                        warn!(
                            target: "tessera::cache",
                            index = %index,
                            alias = %alias,
                            "Alias does not parse as a boundary, skipping"
                        );
                    }
                }
            }
            collections
                .entry(collection_alias.clone())
                .or_default()
                .push(PartitionRecord {
                    index,
                    collection_alias,
                    boundaries,
                });
        }

        let primary = self.primary;
        for partitions in collections.values_mut() {
            partitions.sort_by_key(|p| p.start_of(primary).unwrap_or(NaiveDate::MAX));
        }

        debug!(
            target: "tessera::cache",
            collections = collections.len(),
            "Alias topology loaded"
        );
        Ok(Snapshot {
            loaded_at: Instant::now(),
            collections,
        })
    }
}
