//! Core type definitions shared between the engine and its callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// An ordered primary or index key.
///
/// Keys are scalar: numbers or text. The total order places every number
/// before every text; numbers compare via [`f64::total_cmp`] and text
/// lexicographically. Auto-increment keys are integer-valued numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Key {
    /// A numeric key.
    Number(f64),
    /// A text key.
    Text(String),
}

impl Key {
    /// Extracts a key from a record field value.
    ///
    /// Numbers and strings convert; null, booleans, arrays and objects
    /// are not valid keys and yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Key::Number),
            Value::String(s) => Some(Key::Text(s.clone())),
            _ => None,
        }
    }

    /// Returns the numeric value if this is a number key.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Key::Number(n) => Some(*n),
            Key::Text(_) => None,
        }
    }

    /// Returns the text value if this is a text key.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Key::Number(_) => None,
            Key::Text(s) => Some(s),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Number(a), Key::Number(b)) => a.total_cmp(b),
            (Key::Number(_), Key::Text(_)) => Ordering::Less,
            (Key::Text(_), Key::Number(_)) => Ordering::Greater,
            (Key::Text(a), Key::Text(b)) => a.cmp(b),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Number(n as f64)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Number(f64::from(n))
    }
}

impl From<f64> for Key {
    fn from(n: f64) -> Self {
        Key::Number(n)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Number(n) => write!(f, "{n}"),
            Key::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// A closed description of which keys a scan should include.
///
/// All bounds are inclusive. A [`KeyRange::Bound`] whose lower key exceeds
/// its upper key is *inverted*; the engine rejects inverted ranges when a
/// cursor or count is opened over them, the caller performs no validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRange {
    /// Every key matches.
    Unbounded,
    /// Keys less than or equal to the bound.
    UpperBound(Key),
    /// Keys greater than or equal to the bound.
    LowerBound(Key),
    /// Exactly one key.
    Only(Key),
    /// Keys between the two bounds, inclusive.
    Bound(Key, Key),
}

impl KeyRange {
    /// Returns `true` if `key` falls inside the range.
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        match self {
            KeyRange::Unbounded => true,
            KeyRange::UpperBound(hi) => key <= hi,
            KeyRange::LowerBound(lo) => key >= lo,
            KeyRange::Only(k) => key == k,
            KeyRange::Bound(lo, hi) => key >= lo && key <= hi,
        }
    }

    /// Returns `true` if this is a two-sided range with inverted bounds.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        match self {
            KeyRange::Bound(lo, hi) => lo > hi,
            _ => false,
        }
    }

    /// Returns `true` if every key matches.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        matches!(self, KeyRange::Unbounded)
    }
}

/// Traversal direction for cursors.
///
/// The `Unique` variants visit only the first record per distinct
/// traversal key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending key order.
    #[default]
    Next,
    /// Ascending, skipping duplicate keys.
    NextUnique,
    /// Descending key order.
    Prev,
    /// Descending, skipping duplicate keys.
    PrevUnique,
}

impl Direction {
    /// Parses a direction name.
    ///
    /// Any unrecognized spelling maps to [`Direction::Next`], matching the
    /// client contract that unknown directions fall back to forward
    /// traversal.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "nextunique" => Direction::NextUnique,
            "prev" => Direction::Prev,
            "prevunique" => Direction::PrevUnique,
            _ => Direction::Next,
        }
    }

    /// Returns `true` for descending traversal.
    #[must_use]
    pub fn is_reverse(self) -> bool {
        matches!(self, Direction::Prev | Direction::PrevUnique)
    }

    /// Returns `true` when duplicate traversal keys are skipped.
    #[must_use]
    pub fn is_unique(self) -> bool {
        matches!(self, Direction::NextUnique | Direction::PrevUnique)
    }
}

/// Transaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Reads only.
    ReadOnly,
    /// Reads and writes.
    ReadWrite,
}

/// Opaque completion marker for operations that yield no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// The operation completed.
    Done,
}

/// Store configuration as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreMeta {
    /// In-line key path, if the store extracts keys from records.
    pub key_path: Option<String>,
    /// Whether the engine assigns auto-increment keys.
    pub auto_increment: bool,
}

/// One record under a cursor.
///
/// `key` is the traversal key (the index key for index cursors, the
/// primary key otherwise); `primary_key` always identifies the record.
#[derive(Debug, Clone)]
pub struct CursorEntry {
    /// The traversal key the cursor is positioned on.
    pub key: Key,
    /// The record's primary key.
    pub primary_key: Key,
    /// The record value.
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn numbers_order_before_text() {
        assert!(Key::from(99) < Key::from("a"));
        assert!(Key::from("") > Key::from(f64::MAX));
    }

    #[test]
    fn numeric_keys_compare_numerically() {
        assert!(Key::from(2) < Key::from(10));
        assert_eq!(Key::from(3), Key::Number(3.0));
    }

    #[test]
    fn key_from_value() {
        assert_eq!(
            Key::from_value(&serde_json::json!(5)),
            Some(Key::Number(5.0))
        );
        assert_eq!(
            Key::from_value(&serde_json::json!("id")),
            Some(Key::Text("id".into()))
        );
        assert_eq!(Key::from_value(&serde_json::json!(null)), None);
        assert_eq!(Key::from_value(&serde_json::json!([1, 2])), None);
        assert_eq!(Key::from_value(&serde_json::json!({"a": 1})), None);
    }

    #[test]
    fn range_contains() {
        let k = |n: i64| Key::from(n);
        assert!(KeyRange::Unbounded.contains(&k(0)));
        assert!(KeyRange::UpperBound(k(5)).contains(&k(5)));
        assert!(!KeyRange::UpperBound(k(5)).contains(&k(6)));
        assert!(KeyRange::LowerBound(k(5)).contains(&k(5)));
        assert!(!KeyRange::LowerBound(k(5)).contains(&k(4)));
        assert!(KeyRange::Only(k(5)).contains(&k(5)));
        assert!(!KeyRange::Only(k(5)).contains(&k(4)));
        assert!(KeyRange::Bound(k(2), k(4)).contains(&k(3)));
        assert!(!KeyRange::Bound(k(2), k(4)).contains(&k(5)));
    }

    #[test]
    fn inverted_detection() {
        assert!(KeyRange::Bound(Key::from(9), Key::from(1)).is_inverted());
        assert!(!KeyRange::Bound(Key::from(1), Key::from(9)).is_inverted());
        assert!(!KeyRange::UpperBound(Key::from(1)).is_inverted());
    }

    #[test]
    fn direction_parse_defaults_to_next() {
        assert_eq!(Direction::parse("next"), Direction::Next);
        assert_eq!(Direction::parse("nextunique"), Direction::NextUnique);
        assert_eq!(Direction::parse("prev"), Direction::Prev);
        assert_eq!(Direction::parse("prevunique"), Direction::PrevUnique);
        assert_eq!(Direction::parse("backwards"), Direction::Next);
        assert_eq!(Direction::parse(""), Direction::Next);
    }

    fn arb_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            any::<i32>().prop_map(Key::from),
            "[a-z]{0,8}".prop_map(Key::from),
        ]
    }

    proptest! {
        #[test]
        fn key_order_is_total(a in arb_key(), b in arb_key(), c in arb_key()) {
            // Antisymmetry
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            // Transitivity
            if a <= b && b <= c {
                prop_assert!(a <= c);
            }
        }

        #[test]
        fn bound_range_agrees_with_key_order(lo in arb_key(), hi in arb_key(), k in arb_key()) {
            let range = KeyRange::Bound(lo.clone(), hi.clone());
            prop_assert_eq!(range.contains(&k), k >= lo && k <= hi);
        }
    }
}
