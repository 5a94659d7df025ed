//! Operation parameter structs.
//!
//! Every public operation takes one of these instead of a long argument
//! list. Fields mirror the historical option objects, including the
//! defaulted store identifier, and the setters follow the same chained
//! builder idiom as [`crate::Config`].

use crate::schema::IndexSpec;
use serde_json::Value;
use vaultkv_engine::{Direction, Key};

/// Boxed record predicate carried by query options.
pub type BoxedPredicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// Parameters for [`crate::Database::create_store`].
#[derive(Default)]
pub struct CreateStore {
    /// Store identifier; absent normalizes to `"undefined"`.
    pub store: Option<Value>,
    /// Index name mapped to its uniqueness flag.
    pub indexes: IndexSpec,
    /// Primary key path; records must then carry that field. Absent
    /// means auto-increment keys.
    pub key_path: Option<String>,
    /// Whether an existing store is dropped and recreated.
    pub replace: bool,
}

impl CreateStore {
    /// Creates empty parameters (auto-increment store, no indexes).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store identifier.
    #[must_use]
    pub fn store(mut self, store: impl Into<Value>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Adds an index over the same-named record field.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>, unique: bool) -> Self {
        self.indexes.insert(name.into(), unique);
        self
    }

    /// Sets the primary key path.
    #[must_use]
    pub fn key_path(mut self, path: impl Into<String>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    /// Sets whether an existing store is replaced.
    #[must_use]
    pub const fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }
}

/// Parameters for [`crate::Database::find`].
///
/// Note the range endpoint semantics: `start` alone bounds the scan from
/// *above*, `end` alone from *below* (see [`crate::build_range`]).
pub struct Find {
    /// Store identifier; absent normalizes to `"undefined"`.
    pub store: Option<Value>,
    /// Index to traverse.
    pub index: String,
    /// Range start endpoint.
    pub start: Option<Key>,
    /// Range end endpoint.
    pub end: Option<Key>,
    /// Traversal direction.
    pub direction: Direction,
    /// Optional record predicate.
    pub filter: Option<BoxedPredicate>,
}

impl Find {
    /// Creates parameters for a scan over `index`.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            store: None,
            index: index.into(),
            start: None,
            end: None,
            direction: Direction::Next,
            filter: None,
        }
    }

    /// Sets the store identifier.
    #[must_use]
    pub fn store(mut self, store: impl Into<Value>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Sets the range start endpoint (an upper bound when given alone).
    #[must_use]
    pub fn start(mut self, start: impl Into<Key>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Sets the range end endpoint (a lower bound when given alone).
    #[must_use]
    pub fn end(mut self, end: impl Into<Key>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Sets the traversal direction.
    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the record predicate.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }
}

/// Parameters for [`crate::Database::find_page`].
pub struct FindPage {
    /// The underlying scan parameters.
    pub query: Find,
    /// 1-based page number.
    pub page: u64,
    /// Page size; absent uses the configured default.
    pub page_size: Option<u64>,
}

impl FindPage {
    /// Creates parameters for page 1 over `index`.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            query: Find::new(index),
            page: 1,
            page_size: None,
        }
    }

    /// Sets the store identifier.
    #[must_use]
    pub fn store(mut self, store: impl Into<Value>) -> Self {
        self.query = self.query.store(store);
        self
    }

    /// Sets the range start endpoint (an upper bound when given alone).
    #[must_use]
    pub fn start(mut self, start: impl Into<Key>) -> Self {
        self.query = self.query.start(start);
        self
    }

    /// Sets the range end endpoint (a lower bound when given alone).
    #[must_use]
    pub fn end(mut self, end: impl Into<Key>) -> Self {
        self.query = self.query.end(end);
        self
    }

    /// Sets the traversal direction.
    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.query.direction = direction;
        self
    }

    /// Sets the record predicate.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.query = self.query.filter(filter);
        self
    }

    /// Sets the 1-based page number.
    #[must_use]
    pub const fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, size: u64) -> Self {
        self.page_size = Some(size);
        self
    }
}

/// Parameters for [`crate::Database::count`].
#[derive(Default)]
pub struct Count {
    /// Store identifier; absent normalizes to `"undefined"`.
    pub store: Option<Value>,
    /// Index to count over; absent counts primary keys.
    pub index: Option<String>,
    /// Range start endpoint.
    pub start: Option<Key>,
    /// Range end endpoint.
    pub end: Option<Key>,
}

impl Count {
    /// Creates parameters counting every record of the store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store identifier.
    #[must_use]
    pub fn store(mut self, store: impl Into<Value>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Sets the index to count over.
    #[must_use]
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Sets the range start endpoint (an upper bound when given alone).
    #[must_use]
    pub fn start(mut self, start: impl Into<Key>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Sets the range end endpoint (a lower bound when given alone).
    #[must_use]
    pub fn end(mut self, end: impl Into<Key>) -> Self {
        self.end = Some(end.into());
        self
    }
}

/// Parameters for [`crate::Database::set`].
pub struct Set {
    /// Store identifier; absent normalizes to `"undefined"`.
    pub store: Option<Value>,
    /// The record, or a sequence of records.
    pub val: Value,
    /// Explicit key, or the name of a record field holding the key.
    /// Ignored for stores with an in-line key path.
    pub key: Option<Key>,
    /// Whether a sequence is written element-wise. A store with an
    /// in-line key path always spreads.
    pub spread: bool,
    /// Insert-only mode: `add` instead of `put`. Applies to the single
    /// record branch; spread writes always upsert.
    pub only_add: bool,
}

impl Set {
    /// Creates parameters writing `val` with spread enabled.
    pub fn new(val: impl Into<Value>) -> Self {
        Self {
            store: None,
            val: val.into(),
            key: None,
            spread: true,
            only_add: false,
        }
    }

    /// Sets the store identifier.
    #[must_use]
    pub fn store(mut self, store: impl Into<Value>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Sets the explicit key or key-holding field name.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets whether sequences are written element-wise.
    #[must_use]
    pub const fn spread(mut self, spread: bool) -> Self {
        self.spread = spread;
        self
    }

    /// Sets insert-only mode.
    #[must_use]
    pub const fn only_add(mut self, only_add: bool) -> Self {
        self.only_add = only_add;
        self
    }
}

/// Parameters for [`crate::Database::delete`].
///
/// With no index, range or filter this clears the whole store.
#[derive(Default)]
pub struct Delete {
    /// Store identifier; absent normalizes to `"undefined"`.
    pub store: Option<Value>,
    /// Optional index to traverse; without it the range applies to
    /// primary keys.
    pub index: Option<String>,
    /// Range start endpoint.
    pub start: Option<Key>,
    /// Range end endpoint.
    pub end: Option<Key>,
    /// Optional record predicate; only matching records are deleted.
    pub filter: Option<BoxedPredicate>,
}

impl Delete {
    /// Creates parameters deleting every record of the store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store identifier.
    #[must_use]
    pub fn store(mut self, store: impl Into<Value>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Sets the index to traverse.
    #[must_use]
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Sets the range start endpoint (an upper bound when given alone).
    #[must_use]
    pub fn start(mut self, start: impl Into<Key>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Sets the range end endpoint (a lower bound when given alone).
    #[must_use]
    pub fn end(mut self, end: impl Into<Key>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Sets the record predicate.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }
}
