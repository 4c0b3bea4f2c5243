//! Alias-name grammar
//!
//! Partition boundaries live entirely in alias names; there is no side table.
//! The grammar, for a configured prefix (default `items_`):
//!
//! - collection alias:  `<prefix><collection>`
//! - boundary alias:    `<prefix><collection>_<kind>_<start>` while open,
//!   `<prefix><collection>_<kind>_<start>-<end>` once the end is closed
//!   (dates are `YYYY-MM-DD`)
//! - physical index:    `<prefix><collection>_<uuid>` — opaque, never
//!   addressed semantically
//!
//! The collection alias is a strict prefix of every boundary alias of the
//! same collection, so sorting an index's alias set lexicographically always
//! puts the collection alias first. The loader relies on this when grouping.
//!
//! Collection ids are sanitized to satisfy the backend's index-naming rules
//! (lowercase, no `\/*?"<>| ,#:`, no leading `-_+`).

use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::BoundaryKind;

/// Date format embedded in boundary alias names.
const DATE_FORMAT: &str = "%Y-%m-%d";
/// Length of one formatted date.
const DATE_LEN: usize = 10;

/// A boundary alias decomposed into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBoundary {
    /// Sanitized collection id the alias belongs to
    pub collection: String,
    /// Which temporal field this boundary tracks
    pub kind: BoundaryKind,
    /// Encoded start date
    pub start: NaiveDate,
    /// Encoded end date, present once the partition is closed
    pub end: Option<NaiveDate>,
}

/// Name constructor/parser for a configured index prefix.
#[derive(Debug, Clone)]
pub struct NameScheme {
    prefix: String,
}

impl NameScheme {
    /// Create a scheme for the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        NameScheme {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Strip characters the backend's index-naming rules disallow.
    pub fn sanitize(collection_id: &str) -> String {
        let cleaned: String = collection_id
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' | ',' | '#' | ':'))
            .collect();
        cleaned.trim_start_matches(['-', '_', '+']).to_string()
    }

    /// Alias addressing every partition of a collection as one name.
    pub fn collection_alias(&self, collection_id: &str) -> String {
        format!("{}{}", self.prefix, Self::sanitize(collection_id))
    }

    /// Boundary alias for one kind of one partition.
    pub fn boundary_alias(
        &self,
        collection_id: &str,
        kind: BoundaryKind,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> String {
        let base = format!(
            "{}_{}_{}",
            self.collection_alias(collection_id),
            kind.field_name(),
            start.format(DATE_FORMAT)
        );
        match end {
            Some(end) => format!("{}-{}", base, end.format(DATE_FORMAT)),
            None => base,
        }
    }

    /// Fresh physical index name: collision-resistant, no semantic meaning.
    pub fn physical_index(&self, collection_id: &str) -> String {
        format!(
            "{}_{}",
            self.collection_alias(collection_id),
            Uuid::new_v4().simple()
        )
    }

    /// Wildcard covering every partition of every collection.
    pub fn wildcard(&self) -> String {
        format!("{}*", self.prefix)
    }

    /// Decompose a boundary alias; `None` if the name does not follow the
    /// boundary grammar (collection aliases, foreign aliases).
    pub fn parse_boundary(&self, alias: &str) -> Option<ParsedBoundary> {
        let rest = alias.strip_prefix(&self.prefix)?;

        // Date tail: one date, or start-end joined by '-'.
        let (stem, start, end) = Self::split_date_tail(rest)?;

        // Stem is `<collection>_<kind>`. Kind names overlap ("_datetime" is
        // a suffix of the other two) and a collection id may itself end in
        // "_start" or "_end", so the longest kind suffix wins.
        let stem = stem.strip_suffix('_')?;
        for kind in [
            BoundaryKind::StartDatetime,
            BoundaryKind::EndDatetime,
            BoundaryKind::Datetime,
        ] {
            let suffix = format!("_{}", kind.field_name());
            if let Some(collection) = stem.strip_suffix(suffix.as_str()) {
                if collection.is_empty() {
                    return None;
                }
                return Some(ParsedBoundary {
                    collection: collection.to_string(),
                    kind,
                    start,
                    end,
                });
            }
        }
        None
    }

    /// Split `<stem>_<date>` or `<stem>_<date>-<date>` off the end.
    fn split_date_tail(rest: &str) -> Option<(&str, NaiveDate, Option<NaiveDate>)> {
        if rest.len() < DATE_LEN + 1 || !rest.is_char_boundary(rest.len() - DATE_LEN) {
            return None;
        }
        let last = NaiveDate::parse_from_str(&rest[rest.len() - DATE_LEN..], DATE_FORMAT).ok()?;

        // Try the two-date form first: `<start>-<end>` is 2*DATE_LEN+1 long.
        // range_start may land inside a multibyte character of a foreign
        // alias; slicing there would panic, so it disqualifies the form.
        let range_len = 2 * DATE_LEN + 1;
        if rest.len() > range_len {
            let range_start = rest.len() - range_len;
            if rest.is_char_boundary(range_start)
                && rest.as_bytes()[range_start + DATE_LEN] == b'-'
            {
                if let Ok(start) =
                    NaiveDate::parse_from_str(&rest[range_start..range_start + DATE_LEN], DATE_FORMAT)
                {
                    return Some((&rest[..range_start], start, Some(last)));
                }
            }
        }
        Some((&rest[..rest.len() - DATE_LEN], last, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn scheme() -> NameScheme {
        NameScheme::new("items_")
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(NameScheme::sanitize("Sentinel-2"), "sentinel-2");
        assert_eq!(NameScheme::sanitize("my collection#1"), "mycollection1");
        assert_eq!(NameScheme::sanitize("__hidden"), "hidden");
        assert_eq!(NameScheme::sanitize("a/b\\c*d"), "abcd");
    }

    #[test]
    fn test_collection_alias() {
        assert_eq!(scheme().collection_alias("Sentinel-2"), "items_sentinel-2");
    }

    #[test]
    fn test_boundary_alias_open_and_closed() {
        let s = scheme();
        assert_eq!(
            s.boundary_alias("col", BoundaryKind::Datetime, date("2020-02-12"), None),
            "items_col_datetime_2020-02-12"
        );
        assert_eq!(
            s.boundary_alias(
                "col",
                BoundaryKind::StartDatetime,
                date("2012-02-12"),
                Some(date("2020-02-16"))
            ),
            "items_col_start_datetime_2012-02-12-2020-02-16"
        );
    }

    #[test]
    fn test_collection_alias_sorts_first() {
        let s = scheme();
        let collection = s.collection_alias("col");
        let boundary = s.boundary_alias("col", BoundaryKind::Datetime, date("2020-02-12"), None);
        let mut aliases = vec![boundary.clone(), collection.clone()];
        aliases.sort();
        assert_eq!(aliases[0], collection);
    }

    #[test]
    fn test_physical_index_unique_and_prefixed() {
        let s = scheme();
        let a = s.physical_index("col");
        let b = s.physical_index("col");
        assert_ne!(a, b);
        assert!(a.starts_with("items_col_"));
    }

    #[test]
    fn test_parse_boundary_single_date() {
        let parsed = scheme()
            .parse_boundary("items_col_datetime_2020-02-12")
            .unwrap();
        assert_eq!(parsed.collection, "col");
        assert_eq!(parsed.kind, BoundaryKind::Datetime);
        assert_eq!(parsed.start, date("2020-02-12"));
        assert_eq!(parsed.end, None);
    }

    #[test]
    fn test_parse_boundary_date_range() {
        let parsed = scheme()
            .parse_boundary("items_col_end_datetime_2012-02-12-2020-02-16")
            .unwrap();
        assert_eq!(parsed.kind, BoundaryKind::EndDatetime);
        assert_eq!(parsed.start, date("2012-02-12"));
        assert_eq!(parsed.end, Some(date("2020-02-16")));
    }

    #[test]
    fn test_parse_boundary_collection_with_underscores() {
        let parsed = scheme()
            .parse_boundary("items_my_col_start_datetime_2020-01-01")
            .unwrap();
        assert_eq!(parsed.collection, "my_col");
        assert_eq!(parsed.kind, BoundaryKind::StartDatetime);
    }

    #[test]
    fn test_parse_boundary_collection_named_like_a_kind() {
        let parsed = scheme()
            .parse_boundary("items_datetime_datetime_2020-01-01")
            .unwrap();
        assert_eq!(parsed.collection, "datetime");
        assert_eq!(parsed.kind, BoundaryKind::Datetime);
    }

    #[test]
    fn test_parse_boundary_rejects_non_boundary_names() {
        let s = scheme();
        assert_eq!(s.parse_boundary("items_col"), None);
        assert_eq!(s.parse_boundary("items_col_datetime_notadate"), None);
        assert_eq!(s.parse_boundary("other_col_datetime_2020-01-01"), None);
        assert_eq!(s.parse_boundary("items_col_created_2020-01-01"), None);
        assert_eq!(s.parse_boundary("items__datetime_2020-01-01"), None);
    }

    #[test]
    fn test_parse_boundary_multibyte_alias_does_not_panic() {
        let s = scheme();
        // Multibyte characters landing exactly where the date tails are
        // probed: 21 bytes before the end (two-date form) ...
        assert_eq!(s.parse_boundary("items_\u{e9}aaaaaaaaa-2020-01-01"), None);
        assert_eq!(s.parse_boundary("items_a\u{e9}bcdefghij-2020-01-01"), None);
        // ... and 10 bytes before the end (single-date form).
        assert_eq!(s.parse_boundary("items_\u{e9}020-01-01"), None);
        assert_eq!(s.parse_boundary("items_s\u{e9}ntinel"), None);
    }

    #[test]
    fn test_parse_boundary_multibyte_collection_id() {
        let parsed = scheme()
            .parse_boundary("items_caf\u{e9}_datetime_2020-01-01")
            .unwrap();
        assert_eq!(parsed.collection, "caf\u{e9}");
        assert_eq!(parsed.kind, BoundaryKind::Datetime);
        assert_eq!(parsed.start, date("2020-01-01"));
    }

    #[test]
    fn test_round_trip() {
        let s = scheme();
        for (kind, end) in [
            (BoundaryKind::StartDatetime, None),
            (BoundaryKind::Datetime, Some(date("2021-06-30"))),
            (BoundaryKind::EndDatetime, None),
        ] {
            let alias = s.boundary_alias("landsat_c2", kind, date("2020-02-08"), end);
            let parsed = s.parse_boundary(&alias).unwrap();
            assert_eq!(parsed.collection, "landsat_c2");
            assert_eq!(parsed.kind, kind);
            assert_eq!(parsed.start, date("2020-02-08"));
            assert_eq!(parsed.end, end);
        }
    }
}
