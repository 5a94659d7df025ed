//! In-memory storage engine.

use crate::engine::{Connection, Cursor, EngineTx, SchemaTx, StorageEngine, UpgradeFn};
use crate::error::{EngineError, EngineResult};
use crate::types::{CursorEntry, Direction, Key, KeyRange, ReadyState, StoreMeta, TxMode};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An in-memory storage engine.
///
/// Suitable for unit tests, integration tests and ephemeral databases.
/// Data lives only as long as the engine instance.
///
/// # Thread Safety
///
/// The engine and the connections it hands out are thread-safe.
/// Transactions take the database lock per operation, so a cursor sees
/// the snapshot taken when it was opened.
///
/// # Example
///
/// ```rust
/// use vaultkv_engine::{MemoryEngine, StorageEngine, TxMode, Key};
///
/// let engine = MemoryEngine::new();
/// let conn = engine
///     .open("app", 1, &mut |schema| schema.create_store("items", None))
///     .unwrap();
/// let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();
/// let key = tx.put("items", serde_json::json!({"n": 1}), None).unwrap();
/// assert_eq!(key, Key::from(1));
/// ```
#[derive(Default)]
pub struct MemoryEngine {
    dbs: Mutex<HashMap<String, Arc<DbShared>>>,
}

struct DbShared {
    state: RwLock<DbState>,
}

#[derive(Default)]
struct DbState {
    version: u64,
    /// Bumped whenever a higher-version open or a database delete
    /// supersedes existing connections.
    generation: u64,
    stores: BTreeMap<String, StoreState>,
}

#[derive(Clone, Default)]
struct StoreState {
    key_path: Option<String>,
    auto_increment: bool,
    next_auto: i64,
    records: BTreeMap<Key, Value>,
    indexes: BTreeMap<String, IndexState>,
}

#[derive(Clone)]
struct IndexState {
    unique: bool,
    entries: BTreeMap<Key, BTreeSet<Key>>,
}

impl MemoryEngine {
    /// Creates a new engine with no databases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored version of a database, if it exists.
    #[must_use]
    pub fn stored_version(&self, name: &str) -> Option<u64> {
        let dbs = self.dbs.lock();
        dbs.get(name).map(|db| db.state.read().version)
    }
}

impl StorageEngine for MemoryEngine {
    fn open(
        &self,
        name: &str,
        version: u64,
        upgrade: UpgradeFn<'_>,
    ) -> EngineResult<Box<dyn Connection>> {
        let db = {
            let mut dbs = self.dbs.lock();
            Arc::clone(dbs.entry(name.to_string()).or_insert_with(|| {
                Arc::new(DbShared {
                    state: RwLock::new(DbState::default()),
                })
            }))
        };

        let mut state = db.state.write();
        if version < state.version {
            return Err(EngineError::VersionMismatch {
                requested: version,
                current: state.version,
            });
        }

        if version > state.version {
            // Run the upgrade against a scratch copy so a failed callback
            // keeps neither schema changes nor the version bump.
            let mut schema = MemorySchemaTx {
                stores: state.stores.clone(),
            };
            upgrade(&mut schema)?;
            state.stores = schema.stores;
            state.version = version;
            state.generation += 1;
        }

        Ok(Box::new(MemoryConnection {
            db: Arc::clone(&db),
            version: state.version,
            generation: state.generation,
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }

    fn delete_database(&self, name: &str) -> EngineResult<ReadyState> {
        let removed = self.dbs.lock().remove(name);
        if let Some(db) = removed {
            // Kill any connection still holding the old state.
            db.state.write().generation += 1;
        }
        Ok(ReadyState::Done)
    }
}

struct MemoryConnection {
    db: Arc<DbShared>,
    version: u64,
    generation: u64,
    closed: Arc<AtomicBool>,
}

impl MemoryConnection {
    fn check_live(&self) -> EngineResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::ConnectionClosed);
        }
        if self.db.state.read().generation != self.generation {
            return Err(EngineError::VersionChanged);
        }
        Ok(())
    }
}

impl Connection for MemoryConnection {
    fn version(&self) -> u64 {
        self.version
    }

    fn is_live(&self) -> bool {
        self.check_live().is_ok()
    }

    fn store_names(&self) -> Vec<String> {
        self.db.state.read().stores.keys().cloned().collect()
    }

    fn has_store(&self, name: &str) -> bool {
        self.db.state.read().stores.contains_key(name)
    }

    fn transaction(&self, stores: &[&str], mode: TxMode) -> EngineResult<Box<dyn EngineTx>> {
        self.check_live()?;
        {
            let state = self.db.state.read();
            for store in stores {
                if !state.stores.contains_key(*store) {
                    return Err(EngineError::store_not_found(*store));
                }
            }
        }
        Ok(Box::new(MemoryTx {
            db: Arc::clone(&self.db),
            closed: Arc::clone(&self.closed),
            generation: self.generation,
            scope: stores.iter().map(|s| (*s).to_string()).collect(),
            mode,
        }))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct MemorySchemaTx {
    stores: BTreeMap<String, StoreState>,
}

impl SchemaTx for MemorySchemaTx {
    fn has_store(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    fn create_store(&mut self, name: &str, key_path: Option<&str>) -> EngineResult<()> {
        if self.stores.contains_key(name) {
            return Err(EngineError::StoreExists {
                name: name.to_string(),
            });
        }
        self.stores.insert(
            name.to_string(),
            StoreState {
                key_path: key_path.map(String::from),
                auto_increment: key_path.is_none(),
                next_auto: 1,
                records: BTreeMap::new(),
                indexes: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn delete_store(&mut self, name: &str) -> EngineResult<()> {
        self.stores.remove(name);
        Ok(())
    }

    fn create_index(&mut self, store: &str, index: &str, unique: bool) -> EngineResult<()> {
        let state = self
            .stores
            .get_mut(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        if state.indexes.contains_key(index) {
            return Err(EngineError::IndexExists {
                store: store.to_string(),
                index: index.to_string(),
            });
        }
        // Backfill from existing records; the field name doubles as the
        // projected field.
        let mut entries: BTreeMap<Key, BTreeSet<Key>> = BTreeMap::new();
        for (pk, value) in &state.records {
            if let Some(ikey) = extract_field_key(value, index) {
                let set = entries.entry(ikey).or_default();
                if unique && !set.is_empty() {
                    return Err(EngineError::UniqueViolation {
                        index: index.to_string(),
                    });
                }
                set.insert(pk.clone());
            }
        }
        state
            .indexes
            .insert(index.to_string(), IndexState { unique, entries });
        Ok(())
    }
}

struct MemoryTx {
    db: Arc<DbShared>,
    closed: Arc<AtomicBool>,
    generation: u64,
    scope: Vec<String>,
    mode: TxMode,
}

impl MemoryTx {
    fn check_live(&self) -> EngineResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::ConnectionClosed);
        }
        if self.db.state.read().generation != self.generation {
            return Err(EngineError::VersionChanged);
        }
        Ok(())
    }

    fn check_scope(&self, store: &str) -> EngineResult<()> {
        if self.scope.iter().any(|s| s == store) {
            Ok(())
        } else {
            Err(EngineError::StoreOutOfScope {
                name: store.to_string(),
            })
        }
    }

    fn check_writable(&self) -> EngineResult<()> {
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(EngineError::ReadOnly),
        }
    }

    fn check_range(range: &KeyRange) -> EngineResult<()> {
        if range.is_inverted() {
            Err(EngineError::invalid_range(
                "lower bound is greater than upper bound",
            ))
        } else {
            Ok(())
        }
    }

    fn write(
        &mut self,
        store: &str,
        value: Value,
        key: Option<Key>,
        overwrite: bool,
    ) -> EngineResult<Key> {
        self.check_live()?;
        self.check_scope(store)?;
        self.check_writable()?;
        let mut state = self.db.state.write();
        let store_state = state
            .stores
            .get_mut(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;

        let resolved = match (&store_state.key_path, key) {
            (Some(path), None) => extract_field_key(&value, path).ok_or_else(|| {
                EngineError::invalid_key(format!("record has no usable key at path {path:?}"))
            })?,
            (Some(_), Some(_)) => {
                return Err(EngineError::invalid_key(
                    "explicit key given for a store with in-line keys",
                ))
            }
            (None, Some(k)) => k,
            (None, None) => Key::from(store_state.next_auto),
        };

        if !overwrite && store_state.records.contains_key(&resolved) {
            return Err(EngineError::KeyExists {
                key: resolved.to_string(),
            });
        }

        // Check unique constraints before mutating anything.
        for (name, index) in &store_state.indexes {
            if !index.unique {
                continue;
            }
            if let Some(ikey) = extract_field_key(&value, name) {
                if let Some(holders) = index.entries.get(&ikey) {
                    if holders.iter().any(|pk| pk != &resolved) {
                        return Err(EngineError::UniqueViolation { index: name.clone() });
                    }
                }
            }
        }

        if let Some(old) = store_state.records.remove(&resolved) {
            unindex_record(store_state, &resolved, &old);
        }
        for (name, index) in &mut store_state.indexes {
            if let Some(ikey) = extract_field_key(&value, name) {
                index.entries.entry(ikey).or_default().insert(resolved.clone());
            }
        }
        store_state.records.insert(resolved.clone(), value);

        // Keep the auto-increment watermark ahead of every integer part
        // seen so far, so later auto keys never collide.
        if let Key::Number(n) = resolved {
            if n.is_finite() {
                let floor = n.floor() as i64;
                store_state.next_auto = store_state.next_auto.max(floor.saturating_add(1));
            }
        }

        Ok(resolved)
    }

    /// Materializes the cursor snapshot for a store or index scan.
    fn snapshot(
        store_state: &StoreState,
        store: &str,
        index: Option<&str>,
        range: &KeyRange,
        direction: Direction,
    ) -> EngineResult<Vec<CursorEntry>> {
        let mut entries = match index {
            None => store_state
                .records
                .iter()
                .filter(|(pk, _)| range.contains(pk))
                .map(|(pk, value)| CursorEntry {
                    key: pk.clone(),
                    primary_key: pk.clone(),
                    value: value.clone(),
                })
                .collect::<Vec<_>>(),
            Some(name) => {
                let idx = store_state
                    .indexes
                    .get(name)
                    .ok_or_else(|| EngineError::index_not_found(store, name))?;
                let mut out = Vec::new();
                for (ikey, pks) in &idx.entries {
                    if !range.contains(ikey) {
                        continue;
                    }
                    for pk in pks {
                        if let Some(value) = store_state.records.get(pk) {
                            out.push(CursorEntry {
                                key: ikey.clone(),
                                primary_key: pk.clone(),
                                value: value.clone(),
                            });
                        }
                    }
                }
                out
            }
        };

        if direction.is_reverse() {
            entries.reverse();
        }
        if direction.is_unique() {
            let mut seen: Option<Key> = None;
            entries.retain(|e| {
                if seen.as_ref() == Some(&e.key) {
                    false
                } else {
                    seen = Some(e.key.clone());
                    true
                }
            });
        }
        Ok(entries)
    }
}

impl EngineTx for MemoryTx {
    fn meta(&self, store: &str) -> EngineResult<StoreMeta> {
        self.check_live()?;
        self.check_scope(store)?;
        let state = self.db.state.read();
        let store_state = state
            .stores
            .get(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        Ok(StoreMeta {
            key_path: store_state.key_path.clone(),
            auto_increment: store_state.auto_increment,
        })
    }

    fn get(&self, store: &str, key: &Key) -> EngineResult<Option<Value>> {
        self.check_live()?;
        self.check_scope(store)?;
        let state = self.db.state.read();
        let store_state = state
            .stores
            .get(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        Ok(store_state.records.get(key).cloned())
    }

    fn put(&mut self, store: &str, value: Value, key: Option<Key>) -> EngineResult<Key> {
        self.write(store, value, key, true)
    }

    fn add(&mut self, store: &str, value: Value, key: Option<Key>) -> EngineResult<Key> {
        self.write(store, value, key, false)
    }

    fn delete_range(&mut self, store: &str, range: &KeyRange) -> EngineResult<()> {
        self.check_live()?;
        self.check_scope(store)?;
        self.check_writable()?;
        Self::check_range(range)?;
        let mut state = self.db.state.write();
        let store_state = state
            .stores
            .get_mut(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        let victims: Vec<Key> = store_state
            .records
            .keys()
            .filter(|pk| range.contains(pk))
            .cloned()
            .collect();
        for pk in victims {
            if let Some(value) = store_state.records.remove(&pk) {
                unindex_record(store_state, &pk, &value);
            }
        }
        Ok(())
    }

    fn clear(&mut self, store: &str) -> EngineResult<()> {
        self.check_live()?;
        self.check_scope(store)?;
        self.check_writable()?;
        let mut state = self.db.state.write();
        let store_state = state
            .stores
            .get_mut(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        store_state.records.clear();
        for index in store_state.indexes.values_mut() {
            index.entries.clear();
        }
        // The key generator survives a clear.
        Ok(())
    }

    fn count(&self, store: &str, index: Option<&str>, range: &KeyRange) -> EngineResult<u64> {
        self.check_live()?;
        self.check_scope(store)?;
        Self::check_range(range)?;
        let state = self.db.state.read();
        let store_state = state
            .stores
            .get(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        match index {
            None => Ok(store_state
                .records
                .keys()
                .filter(|pk| range.contains(pk))
                .count() as u64),
            Some(name) => {
                let idx = store_state
                    .indexes
                    .get(name)
                    .ok_or_else(|| EngineError::index_not_found(store, name))?;
                Ok(idx
                    .entries
                    .iter()
                    .filter(|(ikey, _)| range.contains(ikey))
                    .map(|(_, pks)| pks.len() as u64)
                    .sum())
            }
        }
    }

    fn open_cursor(
        &self,
        store: &str,
        index: Option<&str>,
        range: &KeyRange,
        direction: Direction,
    ) -> EngineResult<Box<dyn Cursor>> {
        self.check_live()?;
        self.check_scope(store)?;
        Self::check_range(range)?;
        let state = self.db.state.read();
        let store_state = state
            .stores
            .get(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        let entries = Self::snapshot(store_state, store, index, range, direction)?;
        Ok(Box::new(MemoryCursor {
            db: Arc::clone(&self.db),
            closed: Arc::clone(&self.closed),
            generation: self.generation,
            store: store.to_string(),
            writable: self.mode == TxMode::ReadWrite,
            entries,
            pos: None,
        }))
    }
}

struct MemoryCursor {
    db: Arc<DbShared>,
    closed: Arc<AtomicBool>,
    generation: u64,
    store: String,
    writable: bool,
    entries: Vec<CursorEntry>,
    pos: Option<usize>,
}

impl MemoryCursor {
    fn check_live(&self) -> EngineResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::ConnectionClosed);
        }
        if self.db.state.read().generation != self.generation {
            return Err(EngineError::VersionChanged);
        }
        Ok(())
    }
}

impl Cursor for MemoryCursor {
    fn next_entry(&mut self) -> EngineResult<Option<CursorEntry>> {
        self.check_live()?;
        let next = self.pos.map_or(0, |p| p + 1);
        if next >= self.entries.len() {
            // Stay exhausted; delete_current must not see a position.
            self.pos = None;
            self.entries.clear();
            return Ok(None);
        }
        self.pos = Some(next);
        Ok(Some(self.entries[next].clone()))
    }

    fn delete_current(&mut self) -> EngineResult<()> {
        self.check_live()?;
        if !self.writable {
            return Err(EngineError::ReadOnly);
        }
        let pos = self.pos.ok_or_else(|| {
            EngineError::invalid_key("cursor is not positioned on a record")
        })?;
        let pk = self.entries[pos].primary_key.clone();
        let mut state = self.db.state.write();
        let store_state = state
            .stores
            .get_mut(&self.store)
            .ok_or_else(|| EngineError::store_not_found(&self.store))?;
        if let Some(value) = store_state.records.remove(&pk) {
            unindex_record(store_state, &pk, &value);
        }
        Ok(())
    }
}

/// Extracts an index or primary key from a record field.
fn extract_field_key(value: &Value, field: &str) -> Option<Key> {
    value.get(field).and_then(Key::from_value)
}

/// Removes a record's entries from every index of the store.
fn unindex_record(store_state: &mut StoreState, pk: &Key, value: &Value) {
    for (name, index) in &mut store_state.indexes {
        if let Some(ikey) = extract_field_key(value, name) {
            if let Some(set) = index.entries.get_mut(&ikey) {
                set.remove(pk);
                if set.is_empty() {
                    index.entries.remove(&ikey);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_with_store(engine: &MemoryEngine, version: u64) -> Box<dyn Connection> {
        engine
            .open("test", version, &mut |schema| {
                if !schema.has_store("items") {
                    schema.create_store("items", None)?;
                    schema.create_index("items", "tag", false)?;
                }
                Ok(())
            })
            .unwrap()
    }

    #[test]
    fn put_and_get() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        let key = tx.put("items", json!({"tag": "a"}), Some(Key::from(7))).unwrap();
        assert_eq!(key, Key::from(7));
        assert_eq!(
            tx.get("items", &Key::from(7)).unwrap(),
            Some(json!({"tag": "a"}))
        );
        assert_eq!(tx.get("items", &Key::from(8)).unwrap(), None);
    }

    #[test]
    fn auto_increment_assigns_sequential_keys() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        assert_eq!(tx.put("items", json!(1), None).unwrap(), Key::from(1));
        assert_eq!(tx.put("items", json!(2), None).unwrap(), Key::from(2));
    }

    #[test]
    fn auto_increment_continues_past_explicit_numeric_keys() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        tx.put("items", json!(1), Some(Key::from(41))).unwrap();
        assert_eq!(tx.put("items", json!(2), None).unwrap(), Key::from(42));
    }

    #[test]
    fn huge_explicit_key_saturates_the_key_generator() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        // The integer part exceeds i64::MAX, so the generator clamps
        // instead of overflowing.
        tx.put("items", json!(1), Some(Key::from(9.3e18))).unwrap();
        assert_eq!(
            tx.put("items", json!(2), None).unwrap(),
            Key::from(i64::MAX)
        );
    }

    #[test]
    fn clear_keeps_the_key_generator() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        tx.put("items", json!(1), None).unwrap();
        tx.put("items", json!(2), None).unwrap();
        tx.clear("items").unwrap();
        assert_eq!(tx.put("items", json!(3), None).unwrap(), Key::from(3));
    }

    #[test]
    fn add_rejects_existing_key() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        tx.add("items", json!(1), Some(Key::from(1))).unwrap();
        let err = tx.add("items", json!(2), Some(Key::from(1))).unwrap_err();
        assert!(matches!(err, EngineError::KeyExists { .. }));
    }

    #[test]
    fn key_path_store_extracts_keys() {
        let engine = MemoryEngine::new();
        let conn = engine
            .open("test", 1, &mut |schema| schema.create_store("users", Some("id")))
            .unwrap();
        let mut tx = conn.transaction(&["users"], TxMode::ReadWrite).unwrap();

        tx.put("users", json!({"id": 1, "name": "a"}), None).unwrap();
        assert_eq!(
            tx.get("users", &Key::from(1)).unwrap(),
            Some(json!({"id": 1, "name": "a"}))
        );

        let err = tx.put("users", json!({"name": "b"}), None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidKey { .. }));

        let err = tx
            .put("users", json!({"id": 2}), Some(Key::from(2)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidKey { .. }));
    }

    #[test]
    fn unique_index_rejects_without_mutating() {
        let engine = MemoryEngine::new();
        let conn = engine
            .open("test", 1, &mut |schema| {
                schema.create_store("users", Some("id"))?;
                schema.create_index("users", "email", true)
            })
            .unwrap();
        let mut tx = conn.transaction(&["users"], TxMode::ReadWrite).unwrap();

        tx.put("users", json!({"id": 1, "email": "a@x"}), None).unwrap();
        let err = tx
            .put("users", json!({"id": 2, "email": "a@x"}), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::UniqueViolation { .. }));
        assert_eq!(tx.get("users", &Key::from(2)).unwrap(), None);

        // Overwriting the holder with the same indexed value is fine.
        tx.put("users", json!({"id": 1, "email": "a@x", "v": 2}), None)
            .unwrap();
    }

    #[test]
    fn index_cursor_orders_by_index_key() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        tx.put("items", json!({"tag": "c"}), None).unwrap();
        tx.put("items", json!({"tag": "a"}), None).unwrap();
        tx.put("items", json!({"tag": "b"}), None).unwrap();

        let mut cursor = tx
            .open_cursor("items", Some("tag"), &KeyRange::Unbounded, Direction::Next)
            .unwrap();
        let mut tags = Vec::new();
        while let Some(entry) = cursor.next_entry().unwrap() {
            tags.push(entry.key.as_text().unwrap().to_string());
        }
        assert_eq!(tags, ["a", "b", "c"]);
    }

    #[test]
    fn unique_direction_skips_duplicate_keys() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        for tag in ["a", "a", "b", "b", "c"] {
            tx.put("items", json!({"tag": tag}), None).unwrap();
        }

        let mut cursor = tx
            .open_cursor(
                "items",
                Some("tag"),
                &KeyRange::Unbounded,
                Direction::PrevUnique,
            )
            .unwrap();
        let mut tags = Vec::new();
        while let Some(entry) = cursor.next_entry().unwrap() {
            tags.push(entry.key.as_text().unwrap().to_string());
        }
        assert_eq!(tags, ["c", "b", "a"]);
    }

    #[test]
    fn records_without_the_indexed_field_are_invisible_to_the_index() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        tx.put("items", json!({"tag": "a"}), None).unwrap();
        tx.put("items", json!({"other": 1}), None).unwrap();

        assert_eq!(tx.count("items", Some("tag"), &KeyRange::Unbounded).unwrap(), 1);
        assert_eq!(tx.count("items", None, &KeyRange::Unbounded).unwrap(), 2);
    }

    #[test]
    fn cursor_delete_removes_records_and_index_entries() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadWrite).unwrap();

        for tag in ["a", "b"] {
            tx.put("items", json!({"tag": tag}), None).unwrap();
        }
        let mut cursor = tx
            .open_cursor("items", Some("tag"), &KeyRange::Unbounded, Direction::Next)
            .unwrap();
        while cursor.next_entry().unwrap().is_some() {
            cursor.delete_current().unwrap();
        }
        drop(cursor);

        assert_eq!(tx.count("items", None, &KeyRange::Unbounded).unwrap(), 0);
        assert_eq!(tx.count("items", Some("tag"), &KeyRange::Unbounded).unwrap(), 0);
    }

    #[test]
    fn read_only_transactions_reject_writes() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let mut tx = conn.transaction(&["items"], TxMode::ReadOnly).unwrap();

        let err = tx.put("items", json!(1), None).unwrap_err();
        assert!(matches!(err, EngineError::ReadOnly));
    }

    #[test]
    fn out_of_scope_store_is_rejected() {
        let engine = MemoryEngine::new();
        let conn = engine
            .open("test", 1, &mut |schema| {
                schema.create_store("a", None)?;
                schema.create_store("b", None)
            })
            .unwrap();
        let mut tx = conn.transaction(&["a"], TxMode::ReadWrite).unwrap();
        let err = tx.put("b", json!(1), None).unwrap_err();
        assert!(matches!(err, EngineError::StoreOutOfScope { .. }));
    }

    #[test]
    fn inverted_range_is_the_engines_error() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        let tx = conn.transaction(&["items"], TxMode::ReadOnly).unwrap();

        let range = KeyRange::Bound(Key::from(9), Key::from(1));
        let err = tx.count("items", None, &range).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { .. }));
        let err = tx
            .open_cursor("items", None, &range, Direction::Next)
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { .. }));
    }

    #[test]
    fn open_below_stored_version_fails() {
        let engine = MemoryEngine::new();
        let _conn = open_with_store(&engine, 5);
        let err = engine
            .open("test", 3, &mut |_| Ok(()))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, EngineError::VersionMismatch { .. }));
    }

    #[test]
    fn higher_version_open_supersedes_existing_connections() {
        let engine = MemoryEngine::new();
        let old = open_with_store(&engine, 1);
        assert!(old.is_live());

        let new = open_with_store(&engine, 2);
        assert!(!old.is_live());
        assert!(new.is_live());

        let err = old
            .transaction(&["items"], TxMode::ReadOnly)
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, EngineError::VersionChanged));
    }

    #[test]
    fn same_version_open_does_not_supersede() {
        let engine = MemoryEngine::new();
        let first = open_with_store(&engine, 1);
        let second = open_with_store(&engine, 1);
        assert!(first.is_live());
        assert!(second.is_live());
    }

    #[test]
    fn failed_upgrade_keeps_old_schema_and_version() {
        let engine = MemoryEngine::new();
        let _conn = open_with_store(&engine, 1);
        let err = engine
            .open("test", 2, &mut |schema| {
                schema.create_store("extra", None)?;
                Err(EngineError::invalid_key("boom"))
            })
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidKey { .. }));
        assert_eq!(engine.stored_version("test"), Some(1));

        let conn = open_with_store(&engine, 1);
        assert!(!conn.has_store("extra"));
    }

    #[test]
    fn delete_database_discards_state() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        engine.delete_database("test").unwrap();
        assert!(!conn.is_live());
        assert_eq!(engine.stored_version("test"), None);
    }

    #[test]
    fn closed_connection_rejects_transactions() {
        let engine = MemoryEngine::new();
        let conn = open_with_store(&engine, 1);
        conn.close();
        let err = conn
            .transaction(&["items"], TxMode::ReadOnly)
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, EngineError::ConnectionClosed));
    }
}
