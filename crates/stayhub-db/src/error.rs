//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Recognises the storage backstops              │
//! │       │                   ROOM_DOUBLE_BOOKED, AUDIT_LOG_APPEND_ONLY     │
//! │       ▼                                                                 │
//! │  ServiceError (service::error) ← CoreError | DbError                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/api) ← {success:false, message, error?}                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stayhub_core::ErrorKind;
use thiserror::Error;

/// Message raised by the `room_bookings_no_overlap_*` triggers.
pub const DOUBLE_BOOKED_MARKER: &str = "ROOM_DOUBLE_BOOKED";

/// Message raised by the `audit_logs_no_*` triggers.
pub const APPEND_ONLY_MARKER: &str = "AUDIT_LOG_APPEND_ONLY";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate booking reference or unit number
    /// - A second live assignment for the same room booking
    #[error("Duplicate {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The overlap trigger rejected a write.
    #[error("Room is already booked for overlapping dates")]
    DoubleBooking,

    /// Someone tried to rewrite history.
    #[error("Audit log entries cannot be modified or deleted")]
    AppendOnly,

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The unit of work ran past its deadline and was rolled back.
    #[error("Transaction timed out after {0} seconds")]
    TransactionTimeout(u64),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Serializing an audit snapshot failed.
    #[error("Snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A fail point set by a test aborted the unit of work.
    #[cfg(test)]
    #[error("Injected failure at {0}")]
    Injected(&'static str),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Maps storage failures onto the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::DoubleBooking | DbError::UniqueViolation { .. } => ErrorKind::Conflict,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Whether the caller may simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::TransactionTimeout(_) | DbError::PoolExhausted)
            || matches!(self, DbError::QueryFailed(msg) if msg.contains("database is locked"))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → trigger marker or constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains(DOUBLE_BOOKED_MARKER) {
                    DbError::DoubleBooking
                } else if msg.contains(APPEND_ONLY_MARKER) {
                    DbError::AppendOnly
                } else if let Some(field) = msg.split("UNIQUE constraint failed: ").nth(1) {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(DbError::DoubleBooking.kind(), ErrorKind::Conflict);
        assert_eq!(DbError::not_found("Booking", "b").kind(), ErrorKind::NotFound);
        assert_eq!(DbError::AppendOnly.kind(), ErrorKind::Unexpected);
        assert_eq!(DbError::TransactionTimeout(10).kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_retryable() {
        assert!(DbError::TransactionTimeout(10).is_retryable());
        assert!(DbError::QueryFailed("database is locked".into()).is_retryable());
        assert!(!DbError::DoubleBooking.is_retryable());
    }
}
