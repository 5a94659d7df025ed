//! Error types for client operations.

use thiserror::Error;
use vaultkv_engine::EngineError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the vaultkv client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The engine refused to open or upgrade the database.
    #[error("open failed: {source}")]
    OpenFailed {
        /// The underlying engine error.
        #[source]
        source: EngineError,
    },

    /// An engine-level error inside a transaction. Not retried.
    #[error("transaction failed: {source}")]
    TransactionFailed {
        /// The underlying engine error.
        #[source]
        source: EngineError,
    },

    /// A caller-supplied argument was rejected before any engine call.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// Another actor upgraded the schema concurrently; the local
    /// connection was closed and the next call must reopen.
    #[error("database version changed by another connection")]
    VersionConflict,
}

impl ClientError {
    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wraps an engine failure from an open attempt.
    #[must_use]
    pub fn open_failed(source: EngineError) -> Self {
        Self::OpenFailed { source }
    }

    /// Wraps an engine failure from inside a transaction, promoting
    /// connection-invalidation errors to [`ClientError::VersionConflict`].
    #[must_use]
    pub fn from_engine(source: EngineError) -> Self {
        if source.is_connection_invalid() {
            Self::VersionConflict
        } else {
            Self::TransactionFailed { source }
        }
    }
}

impl From<EngineError> for ClientError {
    fn from(source: EngineError) -> Self {
        Self::from_engine(source)
    }
}
