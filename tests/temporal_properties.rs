//! Property tests for temporal validation, the overlap test, and the
//! boundary-alias grammar.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use proptest::prelude::*;
use tessera::{BoundaryKind, DatetimeRange, ItemTimes, NameScheme};

fn epoch_ts(days: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(days)
}

fn epoch_date(days: i64) -> NaiveDate {
    epoch_ts(days).date_naive()
}

proptest! {
    /// Out-of-order triples are always rejected; ordered ones always pass.
    #[test]
    fn triple_validation_matches_ordering(a in 0i64..20_000, b in 0i64..20_000, c in 0i64..20_000) {
        let times = ItemTimes::triple(epoch_ts(a), epoch_ts(b), epoch_ts(c));
        let valid = a <= b && b <= c;
        prop_assert_eq!(times.validate(true).is_ok(), valid);
    }

    /// The overlap test agrees with a brute-force interval intersection.
    #[test]
    fn overlap_matches_interval_intersection(
        q_lo in 0i64..5_000,
        q_len in 0i64..5_000,
        c_lo in 0i64..5_000,
        c_len in proptest::option::of(0i64..5_000),
    ) {
        let range = DatetimeRange::between(epoch_ts(q_lo), epoch_ts(q_lo + q_len));
        let candidate_end = c_len.map(|len| epoch_date(c_lo + len));
        let expected = {
            let c_hi = c_lo + c_len.unwrap_or(i64::MAX / 2);
            c_lo <= q_lo + q_len && c_hi >= q_lo
        };
        prop_assert_eq!(range.overlaps(epoch_date(c_lo), candidate_end), expected);
    }

    /// Any constructed boundary alias parses back to its parts.
    ///
    /// Collection ids ending in `_start`/`_end` are skipped: the grammar
    /// resolves that ambiguity by longest-kind-suffix precedence, which is
    /// deterministic but not a round trip.
    #[test]
    fn boundary_alias_round_trips(
        collection in "[a-z][a-z0-9_-]{0,20}"
            .prop_filter("ambiguous tail", |c| !c.ends_with("_start") && !c.ends_with("_end")),
        kind_ix in 0usize..3,
        start in 0i64..20_000,
        end_offset in proptest::option::of(0i64..20_000),
    ) {
        let kind = [
            BoundaryKind::StartDatetime,
            BoundaryKind::Datetime,
            BoundaryKind::EndDatetime,
        ][kind_ix];
        let scheme = NameScheme::new("items_");
        let start = epoch_date(start);
        let end = end_offset.map(epoch_date);
        let alias = scheme.boundary_alias(&collection, kind, start, end);
        let parsed = scheme.parse_boundary(&alias).expect("constructed alias must parse");
        prop_assert_eq!(parsed.collection, NameScheme::sanitize(&collection));
        prop_assert_eq!(parsed.kind, kind);
        prop_assert_eq!(parsed.start, start);
        prop_assert_eq!(parsed.end, end);
    }

    /// Sanitization output never contains a character the backend rejects.
    #[test]
    fn sanitize_strips_forbidden_characters(raw in "\\PC{0,40}") {
        let cleaned = NameScheme::sanitize(&raw);
        for forbidden in ['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'] {
            prop_assert!(!cleaned.contains(forbidden));
        }
        prop_assert!(!cleaned.starts_with(['-', '_', '+']));
    }
}
