//! Connection manager for the single session each invocation uses.

use tracing::{debug, info, warn};

use crate::config::MySqlConfig;
use crate::db::DatabaseClient;
use crate::error::{Result, TpchError};
use crate::harness::{session_limit_statement, QueryTimeout};

/// Owns the invocation's database session.
pub struct ConnectionManager {
    db: Option<Box<dyn DatabaseClient>>,
}

impl ConnectionManager {
    /// Opens a session for `config`. Connection failures propagate.
    pub async fn open(config: &MySqlConfig) -> Result<Self> {
        info!("Connecting to {}", config.display_string());
        let db = crate::db::connect(config).await?;
        Ok(Self::with_client(db))
    }

    /// Wraps an existing client (used with mock clients in tests).
    pub fn with_client(db: Box<dyn DatabaseClient>) -> Self {
        Self { db: Some(db) }
    }

    /// The live session.
    pub fn db(&mut self) -> Result<&mut dyn DatabaseClient> {
        match self.db.as_deref_mut() {
            Some(db) => Ok(db),
            None => Err(TpchError::connection("connection is already closed")),
        }
    }

    /// Check if the session is still open.
    pub fn is_connected(&self) -> bool {
        self.db.is_some()
    }

    /// Closes the session. Safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut db) = self.db.take() {
            db.close().await?;
        }
        Ok(())
    }

    /// Closes the session and hands back `outcome`.
    ///
    /// Call this with the result of the work done on the session so the
    /// connection is released on both the success and the failure path. A
    /// close failure only surfaces when the work itself succeeded.
    pub async fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        let closed = self.close().await;
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!("Failed to close connection after error: {close_err}");
                }
                Err(e)
            }
        }
    }
}

/// Best-effort `SET SESSION max_execution_time` for the session.
///
/// Returns whether the limit is in effect. A server that rejects the variable
/// is not an error; callers discard the result explicitly. A disabled timeout
/// sends nothing and reports `false`.
pub async fn try_set_session_limit(db: &mut dyn DatabaseClient, timeout: QueryTimeout) -> bool {
    let Some(sql) = session_limit_statement(timeout) else {
        return false;
    };
    match db.execute(&sql).await {
        Ok(_) => true,
        Err(e) => {
            debug!("Session execution-time limit not applied: {e}");
            false
        }
    }
}
