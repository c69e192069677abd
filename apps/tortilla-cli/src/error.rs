//! # CLI Error Type
//!
//! One error type for every command, carrying a machine-readable code.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the CLI                                │
//! │                                                                         │
//! │  Command handler                                                        │
//! │  Result<(), CliError>                                                   │
//! │         │                                                               │
//! │         ├── DbError::Validation ───────► VALIDATION_ERROR   (exit 2)    │
//! │         ├── DbError::IndexOutOfRange ──► INDEX_OUT_OF_RANGE (exit 2)    │
//! │         ├── DbError::Import ───────────► IMPORT_FORMAT      (exit 2)    │
//! │         ├── DbError::NotFound ─────────► NOT_FOUND          (exit 2)    │
//! │         ├── DbError (storage) ─────────► PERSISTENCE_ERROR  (exit 1)    │
//! │         │     detail logged with tracing, generic message shown        │
//! │         ├── bad password / not admin ──► UNAUTHORIZED       (exit 3)    │
//! │         └── ConfigError / io ──────────► CONFIG_ERROR / IO_ERROR        │
//! │                                                                         │
//! │  main: print "CODE: message" (or JSON with --json), exit non-zero      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use tortilla_core::ValidationError;
use tortilla_db::{DbError, ErrorKind};

use crate::config::ConfigError;

/// Error reported to the operator.
///
/// ## Serialization
/// With `--json` failures print as:
/// ```json
/// {
///   "code": "INDEX_OUT_OF_RANGE",
///   "message": "Index 9 is out of range (ledger has 3 records)"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for CLI failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A sale or input broke a rule
    ValidationError,

    /// Delete/receipt with a stale or invalid position
    IndexOutOfRange,

    /// Import file rejected as a whole
    ImportFormat,

    /// User or record not found
    NotFound,

    /// Storage unreadable or unwritable
    PersistenceError,

    /// Wrong credentials or missing admin role
    Unauthorized,

    /// Config file or value rejected
    ConfigError,

    /// Reading or writing a user-named file failed
    IoError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::IndexOutOfRange => "INDEX_OUT_OF_RANGE",
            ErrorCode::ImportFormat => "IMPORT_FORMAT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PersistenceError => "PERSISTENCE_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::IoError => "IO_ERROR",
        }
    }

    /// Process exit status: 1 for environment failures, 2 for rejected
    /// input, 3 for access.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::PersistenceError | ErrorCode::ConfigError | ErrorCode::IoError => 1,
            ErrorCode::ValidationError
            | ErrorCode::IndexOutOfRange
            | ErrorCode::ImportFormat
            | ErrorCode::NotFound => 2,
            ErrorCode::Unauthorized => 3,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Unauthorized, message)
    }

    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        CliError::new(ErrorCode::IoError, format!("{}: {err}", path.display()))
    }
}

/// Converts storage errors, hiding driver detail behind a generic message.
impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        let code = match err.kind() {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::IndexOutOfRange => ErrorCode::IndexOutOfRange,
            ErrorKind::ImportFormat => ErrorCode::ImportFormat,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Persistence => ErrorCode::PersistenceError,
        };

        match err {
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                tracing::error!("Storage operation failed: {}", e);
                CliError::new(code, "Storage operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                CliError::new(code, "Storage transaction failed")
            }
            DbError::Validation(e) => CliError::new(code, e.to_string()),
            DbError::Import(e) => CliError::new(code, e.to_string()),
            other => CliError::new(code, other.to_string()),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::new(ErrorCode::IoError, format!("cannot encode output: {err}"))
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: CliError = DbError::IndexOutOfRange { index: 9, count: 3 }.into();
        assert_eq!(err.code, ErrorCode::IndexOutOfRange);
        assert_eq!(err.message, "Index 9 is out of range (ledger has 3 records)");
        assert_eq!(err.code.exit_code(), 2);

        let err: CliError = DbError::Validation(ValidationError::EmptySale).into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: CliError = DbError::QueryFailed("disk I/O error near seq".into()).into();
        assert_eq!(err.code, ErrorCode::PersistenceError);
        assert_eq!(err.message, "Storage operation failed");
        assert_eq!(err.code.exit_code(), 1);
    }

    #[test]
    fn test_display_and_json() {
        let err = CliError::unauthorized("invalid username or password");
        assert_eq!(
            err.to_string(),
            "UNAUTHORIZED: invalid username or password"
        );

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert_eq!(err.code.exit_code(), 3);
    }
}
