//! # Store Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sqlx::Error ──────────────┐                                            │
//! │                            ▼                                            │
//! │  settlement checks ──► DbError ──► ApiError (taproom-pos)               │
//! │  (stock, version)                  names the failed operation           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error raised inside a settlement transaction drops the transaction,
//! which rolls back every write made so far.

use sqlx::error::ErrorKind;
use taproom_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write. In practice, a reused barcode.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// The conditional stock decrement matched no row.
    ///
    /// ```text
    /// Stock: 1                  Terminal A          Terminal B
    ///                           pay (needs 1)       pay (needs 1)
    ///                           UPDATE ... ≥ 1 ✓
    ///                           stock: 0            UPDATE ... ≥ 1 ✗
    ///                                               → InsufficientStock
    ///                                               (nothing written)
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// The tab was saved, paid or deleted by someone else since it was reopened.
    #[error("Tab {order_id} was changed by someone else (expected version {expected})")]
    ConcurrencyConflict { order_id: String, expected: i64 },

    /// Input rejected before touching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// The store rejected a statement. The message is SQLite's, verbatim.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No pooled connection became free in time, or the pool is closed.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn conflict(order_id: impl Into<String>, expected: i64) -> Self {
        DbError::ConcurrencyConflict {
            order_id: order_id.into(),
            expected,
        }
    }
}

/// Column named by SQLite in "UNIQUE constraint failed: table.column".
fn constrained_column(message: &str) -> &str {
    message
        .rsplit(": ")
        .next()
        .and_then(|target| target.rsplit('.').next())
        .unwrap_or("value")
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        DbError::duplicate(constrained_column(message), "unknown")
                    }
                    ErrorKind::ForeignKeyViolation => {
                        DbError::ForeignKeyViolation(message.to_string())
                    }
                    _ => DbError::QueryFailed(message.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::Unavailable("no free connection".to_string()),
            sqlx::Error::PoolClosed => DbError::Unavailable("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_details() {
        let err = DbError::InsufficientStock {
            name: "Beer".to_string(),
            available: 0,
            requested: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Beer: available 0, requested 1"
        );

        let err = DbError::conflict("o-1", 2);
        assert!(err.to_string().contains("o-1"));
    }

    #[test]
    fn test_constrained_column() {
        assert_eq!(
            constrained_column("UNIQUE constraint failed: stocked_items.barcode"),
            "barcode"
        );
        assert_eq!(constrained_column("something else"), "something else");
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::Unavailable(_)));

        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
