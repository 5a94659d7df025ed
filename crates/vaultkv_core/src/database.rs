//! The public database facade.
//!
//! [`Database`] ties the connection manager, schema operations, record
//! writer and query functions together behind one handle. Every method
//! accepts its parameters as an options struct from [`crate::options`]
//! and opens the underlying connection on demand.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use vaultkv_engine::{Key, ReadyState, StorageEngine, TxMode};

use crate::config::{Config, DEFAULT_DATABASE_NAME};
use crate::connection::ConnectionManager;
use crate::error::{ClientError, ClientResult};
use crate::keys::normalize_key;
use crate::options::{Count, CreateStore, Delete, Find, FindPage, Set};
use crate::query::{self, Page};
use crate::schema;
use crate::writer::{write_record, WriteMode};

/// A named database handle.
///
/// Cloning is intentionally not offered; wrap in [`Arc`] to share.
pub struct Database {
    manager: ConnectionManager,
    config: Config,
}

impl Database {
    /// Creates a handle with the default configuration.
    ///
    /// An empty `name` falls back to [`DEFAULT_DATABASE_NAME`].
    pub fn new(engine: Arc<dyn StorageEngine>, name: impl Into<String>) -> Self {
        Self::with_config(engine, name, Config::default())
    }

    /// Creates a handle with an explicit configuration.
    pub fn with_config(
        engine: Arc<dyn StorageEngine>,
        name: impl Into<String>,
        config: Config,
    ) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            name = DEFAULT_DATABASE_NAME.to_string();
        }
        Self {
            manager: ConnectionManager::new(engine, name),
            config,
        }
    }

    /// The database name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.manager.name()
    }

    /// Returns `true` while a live connection is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.manager.is_open()
    }

    /// Eagerly opens the connection. Optional; every operation opens on
    /// demand.
    pub fn open(&self) -> ClientResult<()> {
        self.manager.open()
    }

    /// Closes the connection. Later operations reopen transparently.
    pub fn close(&self) {
        self.manager.close();
    }

    /// Deletes the whole database, closing the connection first.
    pub fn delete_database(&self) -> ClientResult<ReadyState> {
        self.manager.delete_database()
    }

    /// Returns `true` when the named store exists.
    pub fn has_store(&self, store: Option<&Value>) -> ClientResult<bool> {
        let store = normalize_key(store);
        self.manager.with_conn(|conn| Ok(conn.has_store(&store)))
    }

    /// The names of every store, sorted.
    pub fn store_names(&self) -> ClientResult<Vec<String>> {
        self.manager.with_conn(|conn| Ok(conn.store_names()))
    }

    /// Creates a store via a version upgrade. Idempotent unless
    /// `opts.replace` is set, in which case an existing store is
    /// dropped and rebuilt empty.
    pub fn create_store(&self, opts: CreateStore) -> ClientResult<ReadyState> {
        let store = normalize_key(opts.store.as_ref());
        schema::create_store(
            &self.manager,
            &store,
            &opts.indexes,
            opts.key_path.as_deref(),
            opts.replace,
        )
    }

    /// Deletes a store (and all of its records) via a version upgrade.
    /// Succeeds even when the store does not exist.
    pub fn delete_store(&self, store: Option<&Value>) -> ClientResult<ReadyState> {
        let store = normalize_key(store);
        schema::delete_store(&self.manager, &store)
    }

    /// Fetches the record stored under `key`, or `None`.
    pub fn get(&self, key: impl Into<Key>, store: Option<&Value>) -> ClientResult<Option<Value>> {
        let store = normalize_key(store);
        let key = key.into();
        self.manager.with_conn(|conn| {
            let tx = conn.transaction(&[&store], TxMode::ReadOnly)?;
            Ok(tx.get(&store, &key)?)
        })
    }

    /// Writes one record, or a sequence of records.
    ///
    /// Returns one flag per attempted write; a failed write logs and
    /// reports `false` without aborting the rest of the batch. A
    /// sequence value is written element-wise when `opts.spread` is set
    /// or the store has an in-line key path; otherwise the sequence is
    /// stored as a single record. `opts.only_add` refuses to overwrite
    /// for the single record branch; spread writes always upsert.
    pub fn set(&self, opts: Set) -> ClientResult<Vec<bool>> {
        let store = normalize_key(opts.store.as_ref());
        self.manager.with_conn(|conn| {
            let mut tx = conn.transaction(&[&store], TxMode::ReadWrite)?;
            let has_key_path = tx.meta(&store)?.key_path.is_some();
            let key = opts.key.as_ref();
            let results = match &opts.val {
                Value::Array(items) if opts.spread || has_key_path => {
                    debug!(store = %store, count = items.len(), "spreading batch write");
                    items
                        .iter()
                        .map(|item| {
                            write_record(tx.as_mut(), &store, item, key, WriteMode::Upsert)
                        })
                        .collect()
                }
                val => {
                    let mode = if opts.only_add {
                        WriteMode::Insert
                    } else {
                        WriteMode::Upsert
                    };
                    vec![write_record(tx.as_mut(), &store, val, key, mode)]
                }
            };
            Ok(results)
        })
    }

    /// Scans an index, returning every matching record in traversal
    /// order.
    pub fn find(&self, opts: Find) -> ClientResult<Vec<Value>> {
        let store = normalize_key(opts.store.as_ref());
        self.manager.with_conn(|conn| {
            query::find(
                conn,
                &store,
                &opts.index,
                opts.start.clone(),
                opts.end.clone(),
                opts.direction,
                opts.filter.as_deref(),
            )
        })
    }

    /// Scans an index, returning one page of records plus the total
    /// match count.
    ///
    /// `opts.page` is 1-based and rejected before any engine work when
    /// zero, as is a zero `opts.page_size`.
    pub fn find_page(&self, opts: FindPage) -> ClientResult<Page> {
        let page_size = opts.page_size.unwrap_or(self.config.default_page_size);
        if opts.page == 0 || page_size == 0 {
            return Err(ClientError::invalid_argument(
                "page and page_size are 1-based and must be positive",
            ));
        }
        let q = opts.query;
        let store = normalize_key(q.store.as_ref());
        self.manager.with_conn(|conn| {
            query::find_page(
                conn,
                &store,
                &q.index,
                q.start.clone(),
                q.end.clone(),
                q.direction,
                opts.page,
                page_size,
                q.filter.as_deref(),
            )
        })
    }

    /// Counts records, over an index or over primary keys.
    pub fn count(&self, opts: Count) -> ClientResult<u64> {
        let store = normalize_key(opts.store.as_ref());
        self.manager.with_conn(|conn| {
            query::count(
                conn,
                &store,
                opts.index.as_deref(),
                opts.start.clone(),
                opts.end.clone(),
            )
        })
    }

    /// Removes every record in the store, keeping the store itself.
    pub fn clear(&self, store: Option<&Value>) -> ClientResult<ReadyState> {
        let store = normalize_key(store);
        self.manager
            .with_conn(|conn| query::delete_in(conn, &store, None, None, None, None))
    }

    /// Deletes records in range, optionally through an index and
    /// filter. With no index, range or filter the store is cleared.
    pub fn delete(&self, opts: Delete) -> ClientResult<ReadyState> {
        let store = normalize_key(opts.store.as_ref());
        self.manager.with_conn(|conn| {
            query::delete_in(
                conn,
                &store,
                opts.index.as_deref(),
                opts.start.clone(),
                opts.end.clone(),
                opts.filter.as_deref(),
            )
        })
    }
}
