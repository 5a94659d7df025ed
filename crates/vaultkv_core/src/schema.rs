//! Store and index schema changes.
//!
//! Every schema change rides on a version upgrade: the connection manager
//! closes the live handle, bumps the version and reopens, and the engine's
//! versioning rule fires the upgrade callback below exactly once for the
//! transition. Upgrades may only add a store or index, or delete a store;
//! they never silently change an index's uniqueness on re-creation
//! without an explicit replace.

use crate::connection::ConnectionManager;
use crate::error::ClientResult;
use std::collections::BTreeMap;
use tracing::debug;
use vaultkv_engine::ReadyState;

/// Index definitions for a store: index name mapped to its uniqueness
/// flag. Each index projects the same-named field of every record.
pub type IndexSpec = BTreeMap<String, bool>;

/// Creates a store, with optional indexes and key path.
///
/// If the store already exists and `replace` is `false`, this is an
/// idempotent no-op that still reports success; with `replace` the
/// existing store (and all of its records) is dropped and recreated.
/// Without a key path the store uses engine-assigned auto-increment keys.
///
/// # Errors
///
/// Returns [`crate::ClientError::OpenFailed`] when the upgrade cannot run.
pub fn create_store(
    manager: &ConnectionManager,
    store: &str,
    indexes: &IndexSpec,
    key_path: Option<&str>,
    replace: bool,
) -> ClientResult<ReadyState> {
    manager.upgrade(|schema| {
        if schema.has_store(store) {
            if !replace {
                debug!(store, "store already exists, create is a no-op");
                return Ok(());
            }
            schema.delete_store(store)?;
        }
        schema.create_store(store, key_path)?;
        for (index, unique) in indexes {
            schema.create_index(store, index, *unique)?;
        }
        Ok(())
    })
}

/// Deletes a store and all of its records; a no-op success if absent.
///
/// # Errors
///
/// Returns [`crate::ClientError::OpenFailed`] when the upgrade cannot run.
pub fn delete_store(manager: &ConnectionManager, store: &str) -> ClientResult<ReadyState> {
    manager.upgrade(|schema| schema.delete_store(store))
}
