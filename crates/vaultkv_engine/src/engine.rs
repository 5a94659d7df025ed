//! Storage engine trait definitions.

use crate::error::EngineResult;
use crate::types::{CursorEntry, Direction, Key, KeyRange, ReadyState, StoreMeta, TxMode};
use serde_json::Value;

/// Upgrade callback invoked when an open raises the stored version.
///
/// The callback runs exactly once per version transition, inside a schema
/// transaction, before the new connection is returned.
pub type UpgradeFn<'a> = &'a mut dyn FnMut(&mut dyn SchemaTx) -> EngineResult<()>;

/// An ordered-key storage engine.
///
/// The engine is an opaque collaborator: it owns the data representation
/// and exposes primitive open/close, transaction, store, index and cursor
/// operations. Clients layer schema management, key resolution and query
/// semantics on top.
///
/// # Invariants
///
/// - Opening at a version above the stored one runs `upgrade` before the
///   connection is handed out; opening below it fails with
///   `VersionMismatch`.
/// - A successful open supersedes every previously issued connection to
///   the same database: their subsequent transactions fail with
///   `VersionChanged`.
/// - Engines must be `Send + Sync` for shared access.
pub trait StorageEngine: Send + Sync {
    /// Opens the named database at `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is below the stored one or the
    /// upgrade callback fails (in which case no schema change is kept).
    fn open(
        &self,
        name: &str,
        version: u64,
        upgrade: UpgradeFn<'_>,
    ) -> EngineResult<Box<dyn Connection>>;

    /// Deletes the named database and all of its stores.
    ///
    /// Deleting a database that does not exist is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot discard the database.
    fn delete_database(&self, name: &str) -> EngineResult<ReadyState>;
}

/// An open handle to a database at a specific version.
pub trait Connection: Send + Sync {
    /// The version this connection was opened at.
    fn version(&self) -> u64;

    /// Returns `false` once the connection has been closed or superseded
    /// by a newer open of the same database.
    fn is_live(&self) -> bool;

    /// Names of all stores in the database.
    fn store_names(&self) -> Vec<String>;

    /// Returns `true` if the database contains the named store.
    fn has_store(&self, name: &str) -> bool;

    /// Starts a transaction scoped to the given stores.
    ///
    /// # Errors
    ///
    /// Fails with `VersionChanged`/`ConnectionClosed` on a dead handle, or
    /// `StoreNotFound` if a scoped store does not exist.
    fn transaction(&self, stores: &[&str], mode: TxMode) -> EngineResult<Box<dyn EngineTx>>;

    /// Closes the connection. Idempotent.
    fn close(&self);
}

/// Schema transaction passed to upgrade callbacks.
///
/// Store and index creation/deletion is only possible here; normal
/// transactions never change schema.
pub trait SchemaTx {
    /// Returns `true` if the store exists.
    fn has_store(&self, name: &str) -> bool;

    /// Creates a store.
    ///
    /// With a key path, records are structured values carrying their own
    /// key in that field; without one, keys are explicit or engine-assigned
    /// auto-increment integers.
    ///
    /// # Errors
    ///
    /// Fails if the store already exists.
    fn create_store(&mut self, name: &str, key_path: Option<&str>) -> EngineResult<()>;

    /// Deletes a store and all of its records. No-op if absent.
    ///
    /// # Errors
    ///
    /// Fails only on engine-internal errors.
    fn delete_store(&mut self, name: &str) -> EngineResult<()>;

    /// Creates an index projecting the named field of each record.
    ///
    /// # Errors
    ///
    /// Fails if the store is missing or the index already exists.
    fn create_index(&mut self, store: &str, index: &str, unique: bool) -> EngineResult<()>;
}

/// A transaction over one or more stores.
///
/// All methods validate that the named store exists and was declared in
/// the transaction scope; write methods additionally require
/// [`TxMode::ReadWrite`].
pub trait EngineTx {
    /// Returns the store's configuration.
    ///
    /// # Errors
    ///
    /// Fails if the store is missing or out of scope.
    fn meta(&self, store: &str) -> EngineResult<StoreMeta>;

    /// Reads the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Fails if the store is missing or out of scope.
    fn get(&self, store: &str, key: &Key) -> EngineResult<Option<Value>>;

    /// Writes a record, inserting or overwriting. Returns the resolved key.
    ///
    /// For key-path stores the key comes from the record itself and `key`
    /// must be `None`; otherwise the explicit key is used, or an
    /// auto-increment key is assigned when `key` is `None`.
    ///
    /// # Errors
    ///
    /// Fails on unresolvable keys or unique index violations; the store is
    /// left untouched on failure.
    fn put(&mut self, store: &str, value: Value, key: Option<Key>) -> EngineResult<Key>;

    /// Writes a record that must not already exist. Returns the resolved key.
    ///
    /// # Errors
    ///
    /// As [`EngineTx::put`], plus `KeyExists` when the resolved key is
    /// already present.
    fn add(&mut self, store: &str, value: Value, key: Option<Key>) -> EngineResult<Key>;

    /// Deletes every record whose primary key falls in `range`.
    ///
    /// # Errors
    ///
    /// Fails on inverted ranges.
    fn delete_range(&mut self, store: &str, range: &KeyRange) -> EngineResult<()>;

    /// Removes every record in the store.
    ///
    /// # Errors
    ///
    /// Fails if the store is missing or out of scope.
    fn clear(&mut self, store: &str) -> EngineResult<()>;

    /// Counts records, over the named index or the primary key space,
    /// restricted to `range`.
    ///
    /// # Errors
    ///
    /// Fails on unknown indexes and inverted ranges.
    fn count(&self, store: &str, index: Option<&str>, range: &KeyRange) -> EngineResult<u64>;

    /// Opens a cursor over the store or one of its indexes.
    ///
    /// # Errors
    ///
    /// Fails on unknown indexes and inverted ranges.
    fn open_cursor(
        &self,
        store: &str,
        index: Option<&str>,
        range: &KeyRange,
        direction: Direction,
    ) -> EngineResult<Box<dyn Cursor>>;
}

/// Ephemeral ordered traversal over a store or index.
///
/// Cursors advance one record at a time and are never persisted.
pub trait Cursor {
    /// Advances to the next record, or `None` when exhausted.
    ///
    /// # Errors
    ///
    /// Fails if the underlying connection died mid-traversal.
    fn next_entry(&mut self) -> EngineResult<Option<CursorEntry>>;

    /// Deletes the record the cursor is currently positioned on.
    ///
    /// # Errors
    ///
    /// Fails if called before the first `next_entry` or after exhaustion,
    /// or when the cursor belongs to a read-only transaction.
    fn delete_current(&mut self) -> EngineResult<()>;
}
