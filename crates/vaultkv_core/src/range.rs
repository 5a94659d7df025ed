//! Range construction for scans.

use vaultkv_engine::{Key, KeyRange};

/// Builds an engine key range from optional scan endpoints.
///
/// # Bound naming
///
/// **The parameter names are inverted relative to intuition and this is
/// deliberate**: a `start` given alone produces an *upper* bound (keys
/// less than or equal to `start`), and an `end` given alone produces a
/// *lower* bound (keys greater than or equal to `end`). Downstream
/// callers depend on these historical semantics; do not "fix" them.
///
/// Rules:
/// - both absent: every key matches
/// - only `start`: keys <= `start`
/// - only `end`: keys >= `end`
/// - both equal: exactly that key
/// - both given, unequal: inclusive two-sided bound from `start` to
///   `end`, with no ordering validation here - an inverted bound is
///   rejected by the engine when the scan is opened
#[must_use]
pub fn build_range(start: Option<Key>, end: Option<Key>) -> KeyRange {
    match (start, end) {
        (None, None) => KeyRange::Unbounded,
        (Some(s), None) => KeyRange::UpperBound(s),
        (None, Some(e)) => KeyRange::LowerBound(e),
        (Some(s), Some(e)) => {
            if s == e {
                KeyRange::Only(s)
            } else {
                KeyRange::Bound(s, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn both_absent_is_unbounded() {
        assert_eq!(build_range(None, None), KeyRange::Unbounded);
    }

    #[test]
    fn start_alone_is_an_upper_bound() {
        let range = build_range(Some(Key::from(5)), None);
        assert_eq!(range, KeyRange::UpperBound(Key::from(5)));
        assert!(range.contains(&Key::from(5)));
        assert!(range.contains(&Key::from(-100)));
        assert!(!range.contains(&Key::from(6)));
    }

    #[test]
    fn end_alone_is_a_lower_bound() {
        let range = build_range(None, Some(Key::from(5)));
        assert_eq!(range, KeyRange::LowerBound(Key::from(5)));
        assert!(range.contains(&Key::from(5)));
        assert!(range.contains(&Key::from(100)));
        assert!(!range.contains(&Key::from(4)));
    }

    #[test]
    fn equal_endpoints_degenerate_to_only() {
        let range = build_range(Some(Key::from("x")), Some(Key::from("x")));
        assert_eq!(range, KeyRange::Only(Key::from("x")));
    }

    #[test]
    fn unequal_endpoints_are_a_two_sided_bound() {
        let range = build_range(Some(Key::from(1)), Some(Key::from(9)));
        assert_eq!(range, KeyRange::Bound(Key::from(1), Key::from(9)));
    }

    #[test]
    fn inverted_bounds_are_not_validated_here() {
        let range = build_range(Some(Key::from(9)), Some(Key::from(1)));
        assert_eq!(range, KeyRange::Bound(Key::from(9), Key::from(1)));
        assert!(range.is_inverted());
    }

    proptest! {
        #[test]
        fn single_endpoint_ranges_match_key_order(bound in any::<i32>(), probe in any::<i32>()) {
            let upper = build_range(Some(Key::from(bound)), None);
            prop_assert_eq!(upper.contains(&Key::from(probe)), probe <= bound);

            let lower = build_range(None, Some(Key::from(bound)));
            prop_assert_eq!(lower.contains(&Key::from(probe)), probe >= bound);
        }

        #[test]
        fn only_range_matches_exactly_one_key(bound in any::<i32>(), probe in any::<i32>()) {
            let range = build_range(Some(Key::from(bound)), Some(Key::from(bound)));
            prop_assert_eq!(range.contains(&Key::from(probe)), probe == bound);
        }
    }
}
