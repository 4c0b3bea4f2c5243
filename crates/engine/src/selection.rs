//! Selection strategies
//!
//! The read path asks one `SelectionStrategy` which indices a search should
//! hit, as a comma-joined string usable as the backend's `index` parameter.
//!
//! The datetime-based strategy filters cached partitions by date overlap.
//! A filter that excludes every partition of a requested collection degrades
//! to that collection's alias (a wildcard over all its partitions): a filter
//! miscalculation costs a full scan, never a false negative.

use std::sync::Arc;

use tessera_core::{BoundaryKind, DatetimeRange, NameScheme, Result};
use tracing::debug;

use crate::cache::AliasCache;

/// Read-path policy: which indices does a query hit.
pub trait SelectionStrategy: Send + Sync {
    /// Resolve a collection list plus datetime bounds to a comma-joined
    /// index/alias list. An empty collection list means every collection.
    /// `for_insertion` selects the write-decision boundary semantics.
    ///
    /// # Errors
    /// Backend failures during a cache reload, unmodified.
    fn select_indexes(
        &self,
        collection_ids: &[String],
        range: Option<&DatetimeRange>,
        for_insertion: bool,
    ) -> Result<String>;
}

/// No filtering: every partition of the requested collections.
pub struct UnfilteredSelection {
    scheme: NameScheme,
}

impl UnfilteredSelection {
    /// Create the strategy.
    pub fn new(scheme: NameScheme) -> Self {
        UnfilteredSelection { scheme }
    }
}

impl SelectionStrategy for UnfilteredSelection {
    fn select_indexes(
        &self,
        collection_ids: &[String],
        _range: Option<&DatetimeRange>,
        _for_insertion: bool,
    ) -> Result<String> {
        if collection_ids.is_empty() {
            return Ok(self.scheme.wildcard());
        }
        Ok(collection_ids
            .iter()
            .map(|id| self.scheme.collection_alias(id))
            .collect::<Vec<_>>()
            .join(","))
    }
}

/// Overlap-filtered selection against the cached partition topology.
pub struct DatetimeSelection {
    cache: Arc<AliasCache>,
    scheme: NameScheme,
    triple_fields: bool,
    use_datetime: bool,
}

impl DatetimeSelection {
    /// Create the strategy.
    pub fn new(
        cache: Arc<AliasCache>,
        scheme: NameScheme,
        triple_fields: bool,
        use_datetime: bool,
    ) -> Self {
        DatetimeSelection {
            cache,
            scheme,
            triple_fields,
            use_datetime,
        }
    }

    /// The boundary kinds consulted for this decision.
    ///
    /// Write decisions consult only the routing kind. Read decisions in
    /// single-field mode consult `datetime`; in triple-field mode they
    /// consult the start/end pair, plus `datetime` when `use_datetime` is
    /// configured.
    fn active_kinds(&self, for_insertion: bool) -> &'static [BoundaryKind] {
        if for_insertion {
            if self.triple_fields {
                &[BoundaryKind::StartDatetime]
            } else {
                &[BoundaryKind::Datetime]
            }
        } else if !self.triple_fields {
            &[BoundaryKind::Datetime]
        } else if self.use_datetime {
            &[
                BoundaryKind::StartDatetime,
                BoundaryKind::Datetime,
                BoundaryKind::EndDatetime,
            ]
        } else {
            &[BoundaryKind::StartDatetime, BoundaryKind::EndDatetime]
        }
    }
}

impl SelectionStrategy for DatetimeSelection {
    fn select_indexes(
        &self,
        collection_ids: &[String],
        range: Option<&DatetimeRange>,
        for_insertion: bool,
    ) -> Result<String> {
        if collection_ids.is_empty() {
            return Ok(self.scheme.wildcard());
        }
        let Some(range) = range else {
            // No bounds, nothing to filter by.
            return Ok(collection_ids
                .iter()
                .map(|id| self.scheme.collection_alias(id))
                .collect::<Vec<_>>()
                .join(","));
        };

        let kinds = self.active_kinds(for_insertion);
        let primary = self.cache.primary_kind();
        let mut out = Vec::new();
        for id in collection_ids {
            let partitions = self.cache.collection_partitions(id)?;
            let mut selected = Vec::new();
            for partition in &partitions {
                // Every active kind must pass its own overlap test; a
                // missing boundary excludes the candidate rather than
                // failing the call.
                let overlapping = kinds.iter().all(|&kind| {
                    partition
                        .boundary(kind)
                        .map(|b| range.overlaps(b.start, b.end))
                        .unwrap_or(false)
                });
                if overlapping {
                    if let Some(boundary) = partition.boundary(primary) {
                        selected.push(boundary.alias.clone());
                    }
                }
            }
            if selected.is_empty() {
                // Degrade to everything the collection has rather than
                // return an empty target set.
                debug!(
                    target: "tessera::cache",
                    collection = %id,
                    "Date filter excluded every partition, falling back to the collection alias"
                );
                out.push(self.scheme.collection_alias(id));
            } else {
                out.append(&mut selected);
            }
        }
        Ok(out.join(","))
    }
}
