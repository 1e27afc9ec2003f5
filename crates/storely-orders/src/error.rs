//! # Engine Error Types
//!
//! What callers of the order engine see: the domain taxonomy from
//! storely-core unioned with infrastructure failures from storely-db.
//!
//! Every engine operation rolls back its transaction on error and
//! re-raises the error unchanged; nothing is swallowed or retried here.

use thiserror::Error;

use storely_core::{CoreError, ValidationError};
use storely_db::DbError;

/// Errors returned by order engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule was violated (not found, invalid state,
    /// insufficient stock, promotion rules, payment mismatches).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database failed (connection, constraint, transaction).
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(err.into())
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
