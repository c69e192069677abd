//! # Error Types
//!
//! Domain-specific error types for tortilla-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tortilla-core errors (this file)                                      │
//! │  ├── CoreError        - Parse failures for money, quantity, product    │
//! │  └── ValidationError  - Sale invariants violated before commit         │
//! │                                                                         │
//! │  tortilla-db errors (separate crate)                                   │
//! │  ├── DbError          - Persistence, index and import failures         │
//! │  └── ImportFormatError - Spreadsheet rows that cannot be converted     │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── CliError         - Code + message printed to the operator         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError / DbError → CliError → stderr       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validation variant names the field it is about, using the same
//! column names as the persisted layout (`tortilla_qty`, `payment`, ...),
//! so an import rejection can point at the offending column directly.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A money amount could not be parsed.
    ///
    /// ## When This Occurs
    /// - Operator typed `"12,50"` or `"abc"` as a payment
    /// - An imported cell holds more than two decimal places
    #[error("Invalid amount '{input}': {reason}")]
    InvalidMoney { input: String, reason: String },

    /// A quantity could not be parsed.
    #[error("Invalid quantity '{input}': {reason}")]
    InvalidQuantity { input: String, reason: String },

    /// Unknown product name.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Sale validation errors.
///
/// Raised before anything reaches the ledger. The ledger is unchanged when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is not a number (or not a valid date/time).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Quantities and amounts can never go below zero.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Quantity or amount above what one sale may hold.
    #[error("{field} exceeds the maximum of {limit}")]
    TooLarge { field: String, limit: String },

    /// Quantity is not a multiple of the product's sale step.
    ///
    /// ## When This Occurs
    /// - Tortilla entered as `1.25` kg (sold in 0.5 kg steps)
    /// - Totopos entered as `1.5` units (sold whole)
    #[error("{field} must be a multiple of {step}")]
    InvalidStep { field: String, step: String },

    /// Payment does not cover the total.
    ///
    /// ## User Workflow
    /// ```text
    /// Total: $50.00, Payment: $40.00
    ///      │
    ///      ▼
    /// InsufficientPayment { total: $50.00, payment: $40.00 }
    ///      │
    ///      ▼
    /// Operator sees: "Insufficient payment. Missing: $10.00"
    /// ```
    #[error("Insufficient payment: total {total}, payment {payment} (missing {})", shortfall(.total, .payment))]
    InsufficientPayment { total: Money, payment: Money },

    /// Stored total does not match the priced quantities.
    #[error("total {stored} does not match computed total {computed}")]
    TotalMismatch { stored: Money, computed: Money },

    /// Stored change is not `payment - total`.
    #[error("change {stored} does not match payment minus total ({expected})")]
    ChangeMismatch { stored: Money, expected: Money },

    /// Nothing was sold.
    #[error("sale has no products")]
    EmptySale,
}

fn shortfall(total: &Money, payment: &Money) -> Money {
    *total - *payment
}

impl ValidationError {
    /// The field (persisted column name) this error is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::Required { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::InvalidStep { field, .. } => Some(field),
            ValidationError::InsufficientPayment { .. } => Some("payment"),
            ValidationError::TotalMismatch { .. } => Some("total"),
            ValidationError::ChangeMismatch { .. } => Some("change"),
            ValidationError::EmptySale => None,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "username".to_string(),
        };
        assert_eq!(err.to_string(), "username is required");

        let err = ValidationError::InvalidStep {
            field: "tortilla_qty".to_string(),
            step: "0.5".to_string(),
        };
        assert_eq!(err.to_string(), "tortilla_qty must be a multiple of 0.5");
    }

    #[test]
    fn test_insufficient_payment_shows_missing_amount() {
        let err = ValidationError::InsufficientPayment {
            total: Money::from_cents(5000),
            payment: Money::from_cents(4000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient payment: total $50.00, payment $40.00 (missing $10.00)"
        );
    }

    #[test]
    fn test_field_lookup() {
        let err = ValidationError::MustNotBeNegative {
            field: "mix_qty".to_string(),
        };
        assert_eq!(err.field(), Some("mix_qty"));
        assert_eq!(ValidationError::EmptySale.field(), None);
        let err = ValidationError::TotalMismatch {
            stored: Money::zero(),
            computed: Money::from_cents(100),
        };
        assert_eq!(err.field(), Some("total"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::EmptySale.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
