//! Core types for the Tessera routing engine
//!
//! This module defines the foundational types:
//! - BoundaryKind: which temporal field a boundary alias tracks
//! - ItemTimes: the optional (start_datetime, datetime, end_datetime) triple
//! - DatetimeRange: normalized query bounds ({gte, lte}, either absent)
//! - CatalogItem: an item as seen by the write path
//! - BulkAction: one routed document of a bulk insert

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Which temporal field of an item a boundary alias tracks
///
/// In single-field mode only `Datetime` is active. In triple-field mode a
/// partition carries one boundary alias per kind, each independently
/// widened and independently consulted by the selection overlap test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoundaryKind {
    /// Tracks the item's `start_datetime` field
    StartDatetime,
    /// Tracks the item's `datetime` field
    Datetime,
    /// Tracks the item's `end_datetime` field
    EndDatetime,
}

impl BoundaryKind {
    /// The document field name this kind tracks
    pub fn field_name(&self) -> &'static str {
        match self {
            BoundaryKind::StartDatetime => "start_datetime",
            BoundaryKind::Datetime => "datetime",
            BoundaryKind::EndDatetime => "end_datetime",
        }
    }

    /// Parse a kind from its field name
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "start_datetime" => Some(BoundaryKind::StartDatetime),
            "datetime" => Some(BoundaryKind::Datetime),
            "end_datetime" => Some(BoundaryKind::EndDatetime),
            _ => None,
        }
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

/// The temporal triple carried by an item, each field optional on the wire
///
/// Which fields are required depends on the process-wide tracking mode:
/// triple-field mode requires all three and `start <= datetime <= end`;
/// single-field mode requires only `datetime`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemTimes {
    /// Start of the item's observation window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<DateTime<Utc>>,
    /// Nominal item datetime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Utc>>,
    /// End of the item's observation window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<DateTime<Utc>>,
}

impl ItemTimes {
    /// Build a triple from a single nominal datetime
    pub fn nominal(datetime: DateTime<Utc>) -> Self {
        ItemTimes {
            start_datetime: None,
            datetime: Some(datetime),
            end_datetime: None,
        }
    }

    /// Build a full triple
    pub fn triple(start: DateTime<Utc>, datetime: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        ItemTimes {
            start_datetime: Some(start),
            datetime: Some(datetime),
            end_datetime: Some(end),
        }
    }

    /// Validate the triple against the active tracking mode
    ///
    /// Must be called before any backend mutation: a validation failure
    /// rejects the insert outright.
    ///
    /// # Errors
    /// `Error::Validation` naming the missing field or violated ordering rule.
    pub fn validate(&self, triple_fields: bool) -> Result<()> {
        if triple_fields {
            let start = self
                .start_datetime
                .ok_or_else(|| Error::Validation("start_datetime is required".to_string()))?;
            let datetime = self
                .datetime
                .ok_or_else(|| Error::Validation("datetime is required".to_string()))?;
            let end = self
                .end_datetime
                .ok_or_else(|| Error::Validation("end_datetime is required".to_string()))?;
            if start > datetime {
                return Err(Error::Validation(
                    "start_datetime must not be after datetime".to_string(),
                ));
            }
            if datetime > end {
                return Err(Error::Validation(
                    "datetime must not be after end_datetime".to_string(),
                ));
            }
        } else if self.datetime.is_none() {
            return Err(Error::Validation("datetime is required".to_string()));
        }
        Ok(())
    }

    /// The value of the given boundary field, if present
    pub fn value_for(&self, kind: BoundaryKind) -> Option<DateTime<Utc>> {
        match kind {
            BoundaryKind::StartDatetime => self.start_datetime,
            BoundaryKind::Datetime => self.datetime,
            BoundaryKind::EndDatetime => self.end_datetime,
        }
    }

    /// The date of the given boundary field, if present
    pub fn date_for(&self, kind: BoundaryKind) -> Option<NaiveDate> {
        self.value_for(kind).map(|dt| dt.date_naive())
    }

    /// The date used to route this item to a partition
    ///
    /// Triple-field mode routes on `start_datetime`, single-field mode on
    /// `datetime`. Callers validate first; a missing routing field here is
    /// still reported as a validation error rather than a panic.
    pub fn routing_date(&self, triple_fields: bool) -> Result<NaiveDate> {
        let kind = if triple_fields {
            BoundaryKind::StartDatetime
        } else {
            BoundaryKind::Datetime
        };
        self.date_for(kind)
            .ok_or_else(|| Error::Validation(format!("{} is required", kind.field_name())))
    }
}

/// Normalized datetime bounds of a query, `{gte, lte}`, either side absent
///
/// Produced by the query layer from a single instant, a closed interval, or
/// a half-open interval (`".."` on one side).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DatetimeRange {
    /// Inclusive lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<DateTime<Utc>>,
}

impl DatetimeRange {
    /// A closed interval
    pub fn between(gte: DateTime<Utc>, lte: DateTime<Utc>) -> Self {
        DatetimeRange {
            gte: Some(gte),
            lte: Some(lte),
        }
    }

    /// A single instant
    pub fn instant(at: DateTime<Utc>) -> Self {
        DatetimeRange {
            gte: Some(at),
            lte: Some(at),
        }
    }

    /// The interval overlap test against a candidate date range
    ///
    /// `candidate.start <= query.end AND candidate.end >= query.start`,
    /// with absent bounds treated as unbounded. A candidate with no end
    /// date is still open (covers everything after its start).
    pub fn overlaps(&self, candidate_start: NaiveDate, candidate_end: Option<NaiveDate>) -> bool {
        let query_start = self.gte.map(|dt| dt.date_naive()).unwrap_or(NaiveDate::MIN);
        let query_end = self.lte.map(|dt| dt.date_naive()).unwrap_or(NaiveDate::MAX);
        let candidate_end = candidate_end.unwrap_or(NaiveDate::MAX);
        candidate_start <= query_end && candidate_end >= query_start
    }
}

/// An item as seen by the write path: id, temporal triple, stored document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// User-supplied item id
    pub id: String,
    /// Temporal triple (validation mode decides which fields are required)
    pub times: ItemTimes,
    /// The document body to store
    pub document: serde_json::Value,
}

impl CatalogItem {
    /// Create an item
    pub fn new(id: impl Into<String>, times: ItemTimes, document: serde_json::Value) -> Self {
        CatalogItem {
            id: id.into(),
            times,
            document,
        }
    }
}

/// One routed document of a bulk insert: where it goes, under what id
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAction {
    /// Target alias (resolves to exactly one physical index)
    pub target: String,
    /// Document id
    pub doc_id: String,
    /// Document body
    pub document: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_single_mode_requires_datetime() {
        let times = ItemTimes::default();
        let err = times.validate(false).unwrap_err();
        assert!(err.to_string().contains("datetime is required"));
        assert!(err.is_client_error());

        let times = ItemTimes::nominal(ts("2020-02-12"));
        assert!(times.validate(false).is_ok());
    }

    #[test]
    fn test_triple_mode_requires_all_three() {
        let times = ItemTimes::nominal(ts("2020-02-12"));
        let err = times.validate(true).unwrap_err();
        assert!(err.to_string().contains("start_datetime is required"));

        let times = ItemTimes {
            start_datetime: Some(ts("2020-02-10")),
            datetime: Some(ts("2020-02-12")),
            end_datetime: None,
        };
        let err = times.validate(true).unwrap_err();
        assert!(err.to_string().contains("end_datetime is required"));
    }

    #[test]
    fn test_triple_mode_rejects_out_of_order() {
        let times = ItemTimes::triple(ts("2020-02-14"), ts("2020-02-12"), ts("2020-02-16"));
        let err = times.validate(true).unwrap_err();
        assert!(err.to_string().contains("start_datetime"));

        let times = ItemTimes::triple(ts("2020-02-10"), ts("2020-02-12"), ts("2020-02-11"));
        let err = times.validate(true).unwrap_err();
        assert!(err.to_string().contains("end_datetime"));

        let times = ItemTimes::triple(ts("2020-02-10"), ts("2020-02-12"), ts("2020-02-16"));
        assert!(times.validate(true).is_ok());
    }

    #[test]
    fn test_routing_date_per_mode() {
        let times = ItemTimes::triple(ts("2020-02-10"), ts("2020-02-12"), ts("2020-02-16"));
        assert_eq!(times.routing_date(true).unwrap(), date("2020-02-10"));
        assert_eq!(times.routing_date(false).unwrap(), date("2020-02-12"));
    }

    #[test]
    fn test_overlap_closed_ranges() {
        let range = DatetimeRange::between(ts("2020-02-10"), ts("2020-02-20"));
        assert!(range.overlaps(date("2020-02-08"), Some(date("2020-02-12"))));
        assert!(range.overlaps(date("2020-02-15"), Some(date("2020-02-25"))));
        assert!(range.overlaps(date("2020-02-01"), Some(date("2020-03-01"))));
        assert!(!range.overlaps(date("2020-02-01"), Some(date("2020-02-09"))));
        assert!(!range.overlaps(date("2020-02-21"), Some(date("2020-02-28"))));
    }

    #[test]
    fn test_overlap_open_candidate_end() {
        let range = DatetimeRange::between(ts("2021-01-01"), ts("2021-12-31"));
        // A partition with no closed end covers everything after its start.
        assert!(range.overlaps(date("2020-02-08"), None));
        assert!(!range.overlaps(date("2022-01-01"), None));
    }

    #[test]
    fn test_overlap_unbounded_query_sides() {
        let range = DatetimeRange {
            gte: None,
            lte: Some(ts("2020-02-10")),
        };
        assert!(range.overlaps(date("2020-02-10"), None));
        assert!(!range.overlaps(date("2020-02-11"), None));

        let range = DatetimeRange {
            gte: Some(ts("2020-02-10")),
            lte: None,
        };
        assert!(range.overlaps(date("2020-01-01"), Some(date("2020-02-10"))));
        assert!(!range.overlaps(date("2020-01-01"), Some(date("2020-02-09"))));
    }

    #[test]
    fn test_boundary_kind_round_trip() {
        for kind in [
            BoundaryKind::StartDatetime,
            BoundaryKind::Datetime,
            BoundaryKind::EndDatetime,
        ] {
            assert_eq!(BoundaryKind::from_field_name(kind.field_name()), Some(kind));
        }
        assert_eq!(BoundaryKind::from_field_name("created"), None);
    }
}
