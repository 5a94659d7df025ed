//! Key normalization for store and database identifiers.

use serde_json::Value;

/// Canonical name for an omitted store or database identifier.
///
/// Callers of the original API could omit the store name entirely, and the
/// absent value was coerced to the literal string `"undefined"`. Preserved
/// for compatibility: data written without a store name stays reachable.
pub const UNDEFINED_KEY: &str = "undefined";

/// Converts an arbitrary identifier into a canonical engine-safe string.
///
/// Strings pass through unchanged; any other value is serialized to its
/// canonical JSON form; an absent identifier becomes [`UNDEFINED_KEY`].
#[must_use]
pub fn normalize_key(key: Option<&Value>) -> String {
    match key {
        None => UNDEFINED_KEY.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
