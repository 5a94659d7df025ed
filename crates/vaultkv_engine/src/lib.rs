//! # vaultkv Engine
//!
//! Storage engine abstraction for vaultkv.
//!
//! This crate defines the ordered-key engine the vaultkv client sits on:
//! engines are **opaque primitive stores** exposing open/close,
//! transactions, object stores, indexes and cursors. They do not know
//! about schema upgrades beyond running a callback, key resolution
//! policy, or query semantics - the client owns all of that.
//!
//! ## Design Principles
//!
//! - Engines expose primitive get/put/delete/cursor operations only
//! - Versioning rule: opening at a higher version runs an upgrade
//!   callback exactly once, and supersedes older connections
//! - All trait objects are object-safe so engines can be swapped
//!
//! ## Available Engines
//!
//! - [`MemoryEngine`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use vaultkv_engine::{MemoryEngine, StorageEngine, TxMode};
//!
//! let engine = MemoryEngine::new();
//! let conn = engine
//!     .open("app", 1, &mut |schema| schema.create_store("items", None))
//!     .unwrap();
//! assert!(conn.has_store("items"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod memory;
mod types;

pub use engine::{Connection, Cursor, EngineTx, SchemaTx, StorageEngine, UpgradeFn};
pub use error::{EngineError, EngineResult};
pub use memory::MemoryEngine;
pub use types::{CursorEntry, Direction, Key, KeyRange, ReadyState, StoreMeta, TxMode};
