//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur inside a storage engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An open was requested at a version below the stored one.
    #[error("version {requested} is below the stored version {current}")]
    VersionMismatch {
        /// The version the open requested.
        requested: u64,
        /// The version currently stored.
        current: u64,
    },

    /// The connection was superseded by a newer open of the same database.
    #[error("connection superseded by a newer database version")]
    VersionChanged,

    /// The connection was explicitly closed.
    #[error("connection is closed")]
    ConnectionClosed,

    /// The named store does not exist.
    #[error("store not found: {name}")]
    StoreNotFound {
        /// Name of the store.
        name: String,
    },

    /// A store creation hit an existing store.
    #[error("store already exists: {name}")]
    StoreExists {
        /// Name of the store.
        name: String,
    },

    /// An index creation hit an existing index.
    #[error("index {index} already exists on store {store}")]
    IndexExists {
        /// Name of the store.
        store: String,
        /// Name of the index.
        index: String,
    },

    /// The named store is not part of the transaction's scope.
    #[error("store {name} is outside the transaction scope")]
    StoreOutOfScope {
        /// Name of the store.
        name: String,
    },

    /// The named index does not exist on the store.
    #[error("index {index} not found on store {store}")]
    IndexNotFound {
        /// Name of the store.
        store: String,
        /// Name of the index.
        index: String,
    },

    /// A write was attempted inside a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,

    /// An `add` hit an existing primary key.
    #[error("key already exists: {key}")]
    KeyExists {
        /// The conflicting key.
        key: String,
    },

    /// A write violated a unique index constraint.
    #[error("unique constraint violated on index {index}")]
    UniqueViolation {
        /// Name of the unique index.
        index: String,
    },

    /// No valid key could be derived for a record.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },

    /// A two-sided range had inverted bounds.
    #[error("invalid range: {message}")]
    InvalidRange {
        /// Description of the problem.
        message: String,
    },
}

impl EngineError {
    /// Creates a store-not-found error.
    pub fn store_not_found(name: impl Into<String>) -> Self {
        Self::StoreNotFound { name: name.into() }
    }

    /// Creates an index-not-found error.
    pub fn index_not_found(store: impl Into<String>, index: impl Into<String>) -> Self {
        Self::IndexNotFound {
            store: store.into(),
            index: index.into(),
        }
    }

    /// Creates an invalid-key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates an invalid-range error.
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Returns `true` when the error means the connection handle is dead
    /// and the holder should discard it.
    #[must_use]
    pub fn is_connection_invalid(&self) -> bool {
        matches!(
            self,
            EngineError::VersionChanged | EngineError::ConnectionClosed
        )
    }
}
