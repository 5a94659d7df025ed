//! Connection lifecycle and version management.

use crate::error::{ClientError, ClientResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use vaultkv_engine::{Connection, EngineError, EngineResult, ReadyState, SchemaTx, StorageEngine};

/// The single live connection handle and the current schema version.
///
/// This is the only shared mutable state of the client. It is an owned
/// struct behind the manager's mutex - never a module-level singleton -
/// so each database name maps to its own independent instance.
struct ConnectionState {
    /// The live handle, if any. Superseded handles are discarded here
    /// without closing other actors' connections. Shared so operations
    /// can run against a clone outside the state lock.
    conn: Option<Arc<dyn Connection>>,
    /// Highest version this client has itself requested.
    version: u64,
}

/// Owns the live connection and serializes schema-changing operations.
///
/// Every operation goes through [`ConnectionManager::with_conn`], which
/// guarantees the connection is open first, or through
/// [`ConnectionManager::upgrade`], which runs the whole
/// close - version bump - reopen - upgrade sequence under one lock so
/// concurrent schema changes cannot race on the version counter.
pub struct ConnectionManager {
    engine: Arc<dyn StorageEngine>,
    name: String,
    state: Mutex<ConnectionState>,
}

impl ConnectionManager {
    /// Creates a manager for the named database.
    pub fn new(engine: Arc<dyn StorageEngine>, name: impl Into<String>) -> Self {
        Self {
            engine,
            name: name.into(),
            state: Mutex::new(ConnectionState {
                conn: None,
                version: 0,
            }),
        }
    }

    /// The database name this manager owns.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` while a live connection is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        let state = self.state.lock();
        state.conn.as_ref().is_some_and(|c| c.is_live())
    }

    /// Opens the database, a no-op if a live connection already exists.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OpenFailed`] when the engine refuses the
    /// open; the handle is cleared in that case.
    pub fn open(&self) -> ClientResult<()> {
        let mut state = self.state.lock();
        self.ensure_open_locked(&mut state)
    }

    /// Closes the connection. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        Self::close_locked(&mut state);
    }

    /// Deletes the whole database, closing any open connection first.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TransactionFailed`] when the engine cannot
    /// discard the database.
    pub fn delete_database(&self) -> ClientResult<ReadyState> {
        let mut state = self.state.lock();
        Self::close_locked(&mut state);
        debug!(database = %self.name, "deleting database");
        self.engine
            .delete_database(&self.name)
            .map_err(ClientError::from_engine)
    }

    /// Runs `f` against an open connection, opening one first if needed.
    ///
    /// A [`ClientError::VersionConflict`] coming out of `f` means another
    /// actor superseded the handle: the local bookkeeping is cleared so
    /// the next call reopens, and the conflict is surfaced to the caller.
    ///
    /// The state lock covers only the open and handle bookkeeping; `f`
    /// runs against a clone of the handle outside it, so `f` may call
    /// back into this manager (reentrant operations take their own
    /// engine transactions).
    ///
    /// # Errors
    ///
    /// Propagates open failures and whatever `f` returns.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&dyn Connection) -> ClientResult<T>,
    ) -> ClientResult<T> {
        let conn = {
            let mut state = self.state.lock();
            self.ensure_open_locked(&mut state)?;
            match state.conn.as_ref() {
                Some(conn) => Arc::clone(conn),
                None => return Err(ClientError::VersionConflict),
            }
        };
        let result = f(conn.as_ref());
        if matches!(result, Err(ClientError::VersionConflict)) {
            warn!(database = %self.name, "connection superseded, discarding handle");
            let mut state = self.state.lock();
            if state
                .conn
                .as_ref()
                .is_some_and(|held| Arc::ptr_eq(held, &conn))
            {
                state.conn = None;
            }
        }
        result
    }

    /// Performs a schema change: close, bump the version to a strictly
    /// greater value, and reopen so the engine's versioning rule fires
    /// the upgrade callback exactly once.
    ///
    /// The entire sequence holds the manager lock, which is the
    /// serialization the upstream behavior lacked.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OpenFailed`] when the reopen or the upgrade
    /// callback fails; no handle is kept in that case.
    pub fn upgrade(
        &self,
        mut f: impl FnMut(&mut dyn SchemaTx) -> EngineResult<()>,
    ) -> ClientResult<ReadyState> {
        let mut state = self.state.lock();
        Self::close_locked(&mut state);
        state.version = next_version(state.version);
        debug!(database = %self.name, version = state.version, "upgrading schema");
        match self.engine.open(&self.name, state.version, &mut f) {
            Ok(conn) => {
                state.conn = Some(Arc::from(conn));
                Ok(ReadyState::Done)
            }
            // Another handle already moved the database past our version;
            // bump past its version and retry once.
            Err(EngineError::VersionMismatch { current, .. }) if current >= state.version => {
                state.version = current + 1;
                match self.engine.open(&self.name, state.version, &mut f) {
                    Ok(conn) => {
                        state.conn = Some(Arc::from(conn));
                        Ok(ReadyState::Done)
                    }
                    Err(source) => Err(ClientError::open_failed(source)),
                }
            }
            Err(source) => Err(ClientError::open_failed(source)),
        }
    }

    fn ensure_open_locked(&self, state: &mut ConnectionState) -> ClientResult<()> {
        if state.conn.as_ref().is_some_and(|c| c.is_live()) {
            return Ok(());
        }
        state.conn = None;
        state.version = next_version(state.version);
        debug!(database = %self.name, version = state.version, "opening database");
        match self.engine.open(&self.name, state.version, &mut |_| Ok(())) {
            Ok(conn) => {
                state.conn = Some(Arc::from(conn));
                Ok(())
            }
            // Another handle already moved the database past our version;
            // adopt its version and retry once.
            Err(EngineError::VersionMismatch { current, .. }) if current > state.version => {
                state.version = current;
                match self.engine.open(&self.name, state.version, &mut |_| Ok(())) {
                    Ok(conn) => {
                        state.conn = Some(Arc::from(conn));
                        Ok(())
                    }
                    Err(source) => Err(ClientError::open_failed(source)),
                }
            }
            Err(source) => Err(ClientError::open_failed(source)),
        }
    }

    fn close_locked(state: &mut ConnectionState) {
        if let Some(conn) = state.conn.take() {
            conn.close();
        }
    }
}

/// Next schema version: derived from wall-clock milliseconds so versions
/// stay monotonic across process restarts, and clamped to strictly exceed
/// the previous value so bumps within one millisecond (or under clock
/// regress) still move forward.
fn next_version(previous: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    now.max(previous + 1)
}
