//! # Unit of Work
//!
//! Scoped transaction handle for one lifecycle operation.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Unit of Work                                     │
//! │                                                                         │
//! │  let mut uow = UnitOfWork::begin(&db).await?;                          │
//! │       │                                                                 │
//! │       │  uow.conn() ──► threaded through every repository call         │
//! │       ▼                                                                 │
//! │  ┌─ operation succeeds ──► uow.commit().await?   (consumes handle)    │
//! │  │                                                                     │
//! │  └─ operation fails ─────► uow.rollback().await  (consumes handle)    │
//! │                                                                         │
//! │  Handle dropped without either? The transaction rolls back.           │
//! │  No exit path can leave a transaction dangling.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ownership makes double-begin unrepresentable: a unit of work exists
//! exactly as long as its transaction, and commit/rollback consume it.

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::warn;

use crate::error::EngineResult;
use storely_db::{Database, DbError};

/// A scoped database transaction for one engine operation.
#[derive(Debug)]
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Begins a new transaction on the database.
    pub async fn begin(db: &Database) -> EngineResult<Self> {
        let tx = db.begin().await?;
        Ok(UnitOfWork { tx })
    }

    /// Returns the transaction's connection for repository calls.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    /// Commits the transaction, consuming the unit of work.
    pub async fn commit(self) -> EngineResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Rolls the transaction back, consuming the unit of work.
    ///
    /// Rollback runs on error paths where the original error must reach
    /// the caller, so a rollback failure is logged rather than returned
    /// (dropping the transaction would roll back anyway).
    pub async fn rollback(self) {
        if let Err(e) = self.tx.rollback().await {
            warn!(error = %e, "Transaction rollback failed");
        }
    }
}
