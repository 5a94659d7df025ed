//! Per-record write path.

use serde_json::Value;
use tracing::{debug, warn};
use vaultkv_engine::{EngineTx, Key};

/// Whether a write may overwrite an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// `add` semantics: the key must not already exist.
    Insert,
    /// `put` semantics: insert or overwrite.
    Upsert,
}

/// Writes one record, resolving its effective key first.
///
/// Key resolution:
/// - store without a key path: when the record is a structured value and
///   `explicit_key` is text naming one of its fields, that field's value
///   becomes the key; otherwise `explicit_key` itself is the literal key
///   (or the engine assigns one when absent)
/// - store with a key path: the record must be a structured value
///   containing that field, else the write is rejected here without
///   touching the engine
/// - `Insert` into an auto-increment store drops the resolved key so the
///   engine assigns the next one
///
/// Never errors: failures resolve to `false` so one bad record cannot
/// abort its batch siblings.
pub fn write_record(
    tx: &mut dyn EngineTx,
    store: &str,
    record: &Value,
    explicit_key: Option<&Key>,
    mode: WriteMode,
) -> bool {
    let meta = match tx.meta(store) {
        Ok(meta) => meta,
        Err(error) => {
            warn!(store, %error, "write rejected: store metadata unavailable");
            return false;
        }
    };

    let mut key = match &meta.key_path {
        Some(path) => {
            if record.as_object().map_or(true, |obj| !obj.contains_key(path)) {
                warn!(
                    store,
                    key_path = %path,
                    "the store uses in-line keys and the record lacks that field"
                );
                return false;
            }
            // The engine extracts the in-line key itself.
            None
        }
        None => match explicit_key {
            Some(Key::Text(name)) if record.get(name.as_str()).is_some() => {
                match record.get(name.as_str()).and_then(Key::from_value) {
                    Some(k) => Some(k),
                    None => {
                        warn!(store, field = %name, "record field is not a usable key");
                        return false;
                    }
                }
            }
            other => other.cloned(),
        },
    };

    if mode == WriteMode::Insert && meta.auto_increment {
        key = None;
    }

    let result = match mode {
        WriteMode::Insert => tx.add(store, record.clone(), key),
        WriteMode::Upsert => tx.put(store, record.clone(), key),
    };
    match result {
        Ok(_) => true,
        Err(error) => {
            debug!(store, %error, "engine rejected record write");
            false
        }
    }
}
