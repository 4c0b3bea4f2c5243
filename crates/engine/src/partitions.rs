//! Datetime partition manager
//!
//! Policy engine for time-partitioned collections. State is implicit in the
//! backend's current alias topology; the manager reads it through the alias
//! cache and applies one of five transitions per item, in priority order:
//!
//! 1. no partitions yet: create the first one from the item's dates
//! 2. early date: widen the earliest partition's boundary aliases backward
//!    (pure rename, no new index)
//! 3. interior partition target: route there unchanged, no size check
//! 4. latest partition, undersized: route there unchanged
//! 5. latest partition, oversized: close it at its most recent document's
//!    date and open a new partition the day after
//!
//! Only the latest partition ever receives non-backdated items, so it is the
//! only one size-checked.
//!
//! # Known race
//!
//! There is no cross-process lock around "create partition" or "rename
//! boundary alias". Two writers deciding on the same stale cached view can
//! each create a physical index and claim the same boundary alias; the
//! backend's alias-add is last-write-wins, so the loser's index silently
//! stops being the write target while already holding documents. Resolving
//! this needs a product decision (e.g. a per-collection advisory lock) and
//! is intentionally out of scope here.

use std::sync::Arc;

use chrono::NaiveDate;
use tessera_core::{
    BoundaryKind, BulkAction, CatalogItem, Error, ItemTimes, NameScheme, Result,
};
use tessera_storage::IndexOps;
use tracing::info;

use crate::cache::{AliasCache, PartitionRecord};
use crate::size::SizeManager;

/// The partition state machine for datetime-mode collections.
pub struct DatetimePartitionManager {
    ops: IndexOps,
    cache: Arc<AliasCache>,
    size: Arc<SizeManager>,
    scheme: NameScheme,
    triple_fields: bool,
}

impl DatetimePartitionManager {
    /// Create a manager.
    pub fn new(
        ops: IndexOps,
        cache: Arc<AliasCache>,
        size: Arc<SizeManager>,
        scheme: NameScheme,
        triple_fields: bool,
    ) -> Self {
        DatetimePartitionManager {
            ops,
            cache,
            size,
            scheme,
            triple_fields,
        }
    }

    /// The boundary kinds a partition tracks under the current mode.
    fn active_kinds(&self) -> &'static [BoundaryKind] {
        if self.triple_fields {
            &[
                BoundaryKind::StartDatetime,
                BoundaryKind::Datetime,
                BoundaryKind::EndDatetime,
            ]
        } else {
            &[BoundaryKind::Datetime]
        }
    }

    /// The kind items route on and partitions are ordered by.
    fn primary_kind(&self) -> BoundaryKind {
        if self.triple_fields {
            BoundaryKind::StartDatetime
        } else {
            BoundaryKind::Datetime
        }
    }

    /// Decide the target alias for one item, applying whatever topology
    /// transition its date requires.
    ///
    /// # Errors
    /// `Error::Validation` for missing/out-of-order temporal fields (checked
    /// before any backend mutation); backend failures unmodified.
    pub fn route_item(&self, collection_id: &str, item: &CatalogItem) -> Result<String> {
        item.times.validate(self.triple_fields)?;
        let partitions = self.cache.collection_partitions(collection_id)?;
        if partitions.is_empty() {
            return self.create_first_partition(collection_id, &item.times);
        }

        let primary = self.primary_kind();
        let routing_date = item.times.routing_date(self.triple_fields)?;
        let earliest_start = partitions[0].start_of(primary).ok_or_else(|| {
            Error::MalformedAlias(format!(
                "collection {collection_id} has no parsable partition boundary"
            ))
        })?;

        if routing_date < earliest_start {
            return self.extend_backward(collection_id, &partitions[0], &item.times);
        }

        let target = Self::partition_for(&partitions, primary, routing_date).ok_or_else(|| {
            Error::MalformedAlias(format!(
                "no partition of {collection_id} covers {routing_date}"
            ))
        })?;
        let is_latest = partitions
            .last()
            .map(|p| p.index == target.index)
            .unwrap_or(false);

        if is_latest && self.size.is_oversized(&target.index)? {
            return self.split_latest(collection_id, target);
        }
        Self::primary_alias(target, primary)
    }

    /// Resolve targets for a whole batch.
    ///
    /// Items are sorted by routing date ascending; the no-collection and
    /// oversize transitions are each evaluated once against the first item,
    /// after which every item resolves with no further size checks. A batch
    /// can therefore grow a partition past the ceiling before the next batch
    /// splits it; that approximation is accepted.
    ///
    /// # Errors
    /// `Error::Validation` if any item fails temporal validation (the whole
    /// batch is rejected before any backend mutation).
    pub fn prepare_bulk(
        &self,
        collection_id: &str,
        items: Vec<CatalogItem>,
    ) -> Result<Vec<BulkAction>> {
        let primary = self.primary_kind();
        let mut dated = Vec::with_capacity(items.len());
        for item in items {
            item.times.validate(self.triple_fields)?;
            dated.push((item.times.routing_date(self.triple_fields)?, item));
        }
        dated.sort_by_key(|(date, _)| *date);

        let Some((first_date, first_item)) = dated.first() else {
            return Ok(Vec::new());
        };

        let mut partitions = self.cache.collection_partitions(collection_id)?;
        if partitions.is_empty() {
            self.create_first_partition(collection_id, &first_item.times)?;
            partitions = self.cache.collection_partitions(collection_id)?;
        } else if let Some(target) = Self::partition_for(&partitions, primary, *first_date) {
            let is_latest = partitions
                .last()
                .map(|p| p.index == target.index)
                .unwrap_or(false);
            if is_latest && self.size.is_oversized(&target.index)? {
                self.split_latest(collection_id, target)?;
                partitions = self.cache.collection_partitions(collection_id)?;
            }
        }

        let mut actions = Vec::with_capacity(dated.len());
        for (date, item) in dated {
            let earliest_start = partitions
                .first()
                .and_then(|p| p.start_of(primary))
                .ok_or_else(|| {
                    Error::MalformedAlias(format!(
                        "collection {collection_id} has no parsable partition boundary"
                    ))
                })?;
            let target = if date < earliest_start {
                let alias = self.extend_backward(collection_id, &partitions[0], &item.times)?;
                partitions = self.cache.collection_partitions(collection_id)?;
                alias
            } else {
                let partition =
                    Self::partition_for(&partitions, primary, date).ok_or_else(|| {
                        Error::MalformedAlias(format!(
                            "no partition of {collection_id} covers {date}"
                        ))
                    })?;
                Self::primary_alias(partition, primary)?
            };
            actions.push(BulkAction {
                target,
                doc_id: item.id,
                document: item.document,
            });
        }
        Ok(actions)
    }

    /// State 1: first item of a brand-new collection.
    fn create_first_partition(&self, collection_id: &str, times: &ItemTimes) -> Result<String> {
        let mut aliases = vec![self.scheme.collection_alias(collection_id)];
        for &kind in self.active_kinds() {
            let start = times.date_for(kind).ok_or_else(|| {
                Error::Validation(format!("{} is required", kind.field_name()))
            })?;
            aliases.push(self.scheme.boundary_alias(collection_id, kind, start, None));
        }
        let index = self.scheme.physical_index(collection_id);
        self.ops.create_index(&index, &aliases)?;
        info!(
            target: "tessera::partition",
            collection = %collection_id,
            index = %index,
            "Created first partition"
        );
        self.cache.refresh()?;

        let primary = self.primary_kind();
        let start = times.routing_date(self.triple_fields)?;
        Ok(self.scheme.boundary_alias(collection_id, primary, start, None))
    }

    /// State 2: an item dated before the earliest partition's start.
    ///
    /// Widens only the boundary aliases whose encoded start is strictly
    /// later than the item's corresponding date, as one atomic rename.
    /// A repeat of the same date finds nothing to widen and changes nothing.
    fn extend_backward(
        &self,
        collection_id: &str,
        earliest: &PartitionRecord,
        times: &ItemTimes,
    ) -> Result<String> {
        let primary = self.primary_kind();
        let mut target = earliest
            .boundary(primary)
            .ok_or_else(|| {
                Error::MalformedAlias(format!(
                    "partition {} has no {} boundary",
                    earliest.index,
                    primary.field_name()
                ))
            })?
            .alias
            .clone();

        let mut old = Vec::new();
        let mut new = Vec::new();
        for &kind in self.active_kinds() {
            let Some(boundary) = earliest.boundary(kind) else {
                continue;
            };
            let Some(item_date) = times.date_for(kind) else {
                continue;
            };
            if item_date < boundary.start {
                let widened =
                    self.scheme
                        .boundary_alias(collection_id, kind, item_date, boundary.end);
                if kind == primary {
                    target = widened.clone();
                }
                old.push(boundary.alias.clone());
                new.push(widened);
            }
        }
        if old.is_empty() {
            // Every boundary already covers the item's dates.
            return Ok(target);
        }

        self.ops.rename_aliases(&old, &new, &earliest.index)?;
        info!(
            target: "tessera::partition",
            collection = %collection_id,
            index = %earliest.index,
            widened = old.len(),
            "Extended earliest partition backward"
        );
        self.cache.refresh()?;
        Ok(target)
    }

    /// State 5: the latest partition is over the size ceiling.
    ///
    /// Closes each tracked boundary at the most recent stored value of its
    /// field, then opens a new partition starting the day after the primary
    /// close date. The triggering item routes into the new partition.
    fn split_latest(&self, collection_id: &str, latest: &PartitionRecord) -> Result<String> {
        let primary = self.primary_kind();
        let mut old = Vec::new();
        let mut new = Vec::new();
        let mut primary_close = None;

        for &kind in self.active_kinds() {
            let Some(boundary) = latest.boundary(kind) else {
                continue;
            };
            let close = self
                .ops
                .latest_document_datetime(&latest.index, kind.field_name())?
                .map(|dt| dt.date_naive())
                .unwrap_or(boundary.start)
                .max(boundary.start);
            if kind == primary {
                primary_close = Some(close);
            }
            old.push(boundary.alias.clone());
            new.push(
                self.scheme
                    .boundary_alias(collection_id, kind, boundary.start, Some(close)),
            );
        }
        let primary_close = primary_close.ok_or_else(|| {
            Error::MalformedAlias(format!(
                "partition {} has no {} boundary",
                latest.index,
                primary.field_name()
            ))
        })?;

        self.ops.rename_aliases(&old, &new, &latest.index)?;

        let new_start = primary_close.succ_opt().unwrap_or(primary_close);
        let mut aliases = vec![self.scheme.collection_alias(collection_id)];
        for &kind in self.active_kinds() {
            aliases.push(self.scheme.boundary_alias(collection_id, kind, new_start, None));
        }
        let index = self.scheme.physical_index(collection_id);
        self.ops.create_index(&index, &aliases)?;
        info!(
            target: "tessera::partition",
            collection = %collection_id,
            closed = %latest.index,
            opened = %index,
            cutoff = %primary_close,
            "Split oversized partition"
        );
        self.cache.refresh()?;
        Ok(self
            .scheme
            .boundary_alias(collection_id, primary, new_start, None))
    }

    /// The partition whose range covers `date`: the last one (in start-date
    /// order) starting at or before it.
    fn partition_for(
        partitions: &[PartitionRecord],
        primary: BoundaryKind,
        date: NaiveDate,
    ) -> Option<&PartitionRecord> {
        partitions
            .iter()
            .rev()
            .find(|p| p.start_of(primary).map_or(false, |start| start <= date))
    }

    /// Current full name of a partition's primary boundary alias.
    fn primary_alias(partition: &PartitionRecord, primary: BoundaryKind) -> Result<String> {
        partition
            .boundary(primary)
            .map(|b| b.alias.clone())
            .ok_or_else(|| {
                Error::MalformedAlias(format!(
                    "partition {} has no {} boundary",
                    partition.index,
                    primary.field_name()
                ))
            })
    }
}
