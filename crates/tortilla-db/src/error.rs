//! # Database Error Types
//!
//! Error types for ledger, credential and import operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / csv::Error / io::Error    ValidationError (core)        │
//! │       │                                        │                        │
//! │       ▼                                        ▼                        │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError::kind() ──► Validation | Persistence | IndexOutOfRange        │
//! │                      | ImportFormat | NotFound                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CliError (in app) ← Code + message for the operator                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use tortilla_core::ValidationError;

// =============================================================================
// Database Error
// =============================================================================

/// Storage operation errors.
///
/// No variant leaves a partial write behind: every mutation runs in a single
/// statement or a single transaction.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found.
    ///
    /// ## When This Occurs
    /// - Deleting a user that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Delete-by-index with a stale or invalid position.
    ///
    /// ## When This Occurs
    /// - Two listings taken before and after a delete, the older index used
    /// - Index typed by hand past the end of the ledger
    #[error("Index {index} is out of range (ledger has {count} records)")]
    IndexOutOfRange { index: usize, count: usize },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Data directory cannot be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A stored row could not be turned back into a valid Sale Record.
    ///
    /// ## When This Occurs
    /// - The database file was edited by hand
    /// - Date or time text is not ISO formatted
    /// - Stored total no longer matches the priced quantities
    #[error("Corrupt record (seq {seq}): {reason}")]
    CorruptRecord { seq: i64, reason: String },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),

    /// Record rejected before it reached storage.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Import file rejected as a whole.
    #[error("Import error: {0}")]
    Import(#[from] ImportFormatError),
}

/// The failure categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Persistence,
    IndexOutOfRange,
    ImportFormat,
    NotFound,
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a CorruptRecord error.
    pub fn corrupt(seq: i64, reason: impl Into<String>) -> Self {
        DbError::CorruptRecord {
            seq,
            reason: reason.into(),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Validation(_) => ErrorKind::Validation,
            DbError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            DbError::Import(_) => ErrorKind::ImportFormat,
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::CorruptRecord { .. }
            | DbError::Io(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ErrorKind::Persistence,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::Io             → DbError::Io
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::Io(io_err) => DbError::Io(io_err.to_string()),
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

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::Io(err.to_string())
    }
}

impl From<csv::Error> for DbError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            DbError::Io(err.to_string())
        } else {
            DbError::Internal(err.to_string())
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Import Format Error
// =============================================================================

/// A spreadsheet file that cannot be imported at all.
///
/// Individual bad rows do not raise this; they are skipped and listed in the
/// import report instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportFormatError {
    /// Header row lacks required columns.
    #[error("{file}: missing required columns: {}", .columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },

    /// The file is not readable as CSV.
    #[error("{file}: unreadable: {reason}")]
    Unreadable { file: String, reason: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            DbError::IndexOutOfRange { index: 5, count: 2 }.kind(),
            ErrorKind::IndexOutOfRange
        );
        assert_eq!(
            DbError::from(ValidationError::EmptySale).kind(),
            ErrorKind::Validation
        );
        assert_eq!(DbError::corrupt(3, "bad date").kind(), ErrorKind::Persistence);
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Persistence);
        assert_eq!(DbError::not_found("User", "bob").kind(), ErrorKind::NotFound);

        let import = ImportFormatError::MissingColumns {
            file: "a.csv".to_string(),
            columns: vec!["total".to_string()],
        };
        assert_eq!(DbError::from(import).kind(), ErrorKind::ImportFormat);
    }

    #[test]
    fn test_messages() {
        let err = DbError::IndexOutOfRange { index: 5, count: 2 };
        assert_eq!(
            err.to_string(),
            "Index 5 is out of range (ledger has 2 records)"
        );

        let err = ImportFormatError::MissingColumns {
            file: "june.csv".to_string(),
            columns: vec!["total".to_string(), "payment".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "june.csv: missing required columns: total, payment"
        );
    }

    #[test]
    fn test_io_error_is_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DbError = io.into();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }
}
