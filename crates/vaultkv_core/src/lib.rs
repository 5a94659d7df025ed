//! Versioned, indexed key-value storage client.
//!
//! vaultkv wraps an ordered-key [`StorageEngine`] behind a small CRUD
//! surface: named stores with optional in-line key paths, secondary
//! indexes, range scans, pagination and bulk writes. Schema changes are
//! expressed as engine version upgrades; the [`Database`] handle opens,
//! reopens and upgrades its connection transparently.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use vaultkv_core::{CreateStore, Database, Find, Set};
//! use vaultkv_engine::MemoryEngine;
//!
//! let db = Database::new(Arc::new(MemoryEngine::new()), "app");
//! db.create_store(CreateStore::new().store("users").key_path("id").index("age", false))?;
//! db.set(Set::new(json!([
//!     { "id": 1, "age": 31 },
//!     { "id": 2, "age": 27 },
//! ])).store("users"))?;
//! let young = db.find(Find::new("age").store("users").start(30.0))?;
//! assert_eq!(young.len(), 1);
//! # Ok::<(), vaultkv_core::ClientError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod database;
mod error;
pub mod keys;
mod options;
pub mod query;
mod range;
pub mod schema;
pub mod writer;

pub use config::{Config, DEFAULT_DATABASE_NAME};
pub use connection::ConnectionManager;
pub use database::Database;
pub use error::{ClientError, ClientResult};
pub use options::{BoxedPredicate, Count, CreateStore, Delete, Find, FindPage, Set};
pub use query::{Page, RecordPredicate};
pub use range::build_range;

pub use vaultkv_engine::{Direction, Key, KeyRange, ReadyState, StorageEngine};
