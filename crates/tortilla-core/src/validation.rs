//! # Validation Module
//!
//! Sale invariants, checked before a record reaches the ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Parsing (Money / Quantity FromStr)                           │
//! │  └── Non-numeric input never becomes a value                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantities: non-negative, at most MAX_QUANTITY, product step      │
//! │  ├── Amounts: non-negative, at most MAX_AMOUNT                         │
//! │  └── Record: total = priced sum > 0, change = payment - total          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── CHECK (qty >= 0) constraints                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tortilla_core::pricing::Product;
//! use tortilla_core::quantity::Quantity;
//! use tortilla_core::validation::validate_quantity;
//!
//! assert!(validate_quantity(Product::Tortilla, Quantity::from_milli(1500)).is_ok());
//! assert!(validate_quantity(Product::Tortilla, Quantity::from_milli(1250)).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::{Money, MAX_AMOUNT};
use crate::pricing::{checked_sale_total, PricingContext, Product};
use crate::quantity::{Quantity, MAX_QUANTITY};
use crate::types::{ProductQuantities, SaleRecord};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a text field is present.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a product quantity.
///
/// ## Rules
/// - Must not be negative
/// - At most [`MAX_QUANTITY`]
/// - Tortilla: multiple of 0.5 kg
/// - Everything else: whole units
pub fn validate_quantity(product: Product, qty: Quantity) -> ValidationResult<()> {
    if qty.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: product.column().to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::TooLarge {
            field: product.column().to_string(),
            limit: MAX_QUANTITY.to_string(),
        });
    }
    if !qty.is_multiple_of(product.step()) {
        return Err(ValidationError::InvalidStep {
            field: product.column().to_string(),
            step: product.step().to_string(),
        });
    }
    Ok(())
}

/// Validates an amount is neither negative nor above [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            limit: MAX_AMOUNT.to_string(),
        });
    }
    Ok(())
}

/// Prices `quantities`; the one place a sale's total is decided.
///
/// ## Errors
/// - `TooLarge` on `total` when the sum overflows or exceeds [`MAX_AMOUNT`]
/// - `EmptySale` when the total is not above zero
pub fn priced_total(quantities: &ProductQuantities, ctx: &PricingContext) -> ValidationResult<Money> {
    let total = checked_sale_total(quantities, ctx)
        .filter(|total| *total <= MAX_AMOUNT)
        .ok_or_else(|| ValidationError::TooLarge {
            field: "total".to_string(),
            limit: MAX_AMOUNT.to_string(),
        })?;
    if !total.is_positive() {
        return Err(ValidationError::EmptySale);
    }
    Ok(total)
}

// =============================================================================
// Record Validator
// =============================================================================

/// Validates every invariant of a Sale Record.
///
/// ## Rules (checked in this order)
/// 1. `username` present
/// 2. every quantity valid for its product
/// 3. `special_price` and `payment` within range
/// 4. priced total within range and above zero ([`priced_total`])
/// 5. `total` equals that priced total
/// 6. `payment` covers `total`
/// 7. `change` equals `payment - total`
pub fn validate_record(record: &SaleRecord) -> ValidationResult<()> {
    validate_required("username", &record.recorded_by)?;

    for (product, qty) in record.quantities.iter() {
        validate_quantity(product, qty)?;
    }

    validate_amount("special_price", record.special_unit_price)?;
    validate_amount("payment", record.payment)?;

    let computed = priced_total(&record.quantities, &record.pricing_context())?;
    if record.total != computed {
        return Err(ValidationError::TotalMismatch {
            stored: record.total,
            computed,
        });
    }

    if record.payment < record.total {
        return Err(ValidationError::InsufficientPayment {
            total: record.total,
            payment: record.payment,
        });
    }

    let expected = record.payment - record.total;
    if record.change != expected {
        return Err(ValidationError::ChangeMismatch {
            stored: record.change,
            expected,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn record() -> SaleRecord {
        let mut quantities = ProductQuantities::default();
        quantities.set(Product::Tortilla, Quantity::from_units(2));
        SaleRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            recorded_by: "maria".to_string(),
            quantities,
            special_unit_price: Money::zero(),
            frequent_customer: false,
            supplier_rate: false,
            total: Money::from_cents(5000),
            payment: Money::from_cents(6000),
            change: Money::from_cents(1000),
        }
    }

    #[test]
    fn test_valid_record() {
        assert!(validate_record(&record()).is_ok());
    }

    #[test]
    fn test_quantity_rules() {
        assert!(validate_quantity(Product::Tortilla, Quantity::from_milli(500)).is_ok());
        assert!(validate_quantity(Product::Tortilla, Quantity::zero()).is_ok());
        assert!(validate_quantity(Product::Special, Quantity::from_units(7)).is_ok());

        let err = validate_quantity(Product::Tortilla, Quantity::from_milli(750)).unwrap_err();
        assert_eq!(err.to_string(), "tortilla_qty must be a multiple of 0.5");

        let err = validate_quantity(Product::Cacahuates, Quantity::from_milli(-1000)).unwrap_err();
        assert_eq!(err.to_string(), "cacahuates_qty must not be negative");
    }

    #[test]
    fn test_total_mismatch() {
        let mut r = record();
        r.total = Money::from_cents(4400);
        r.change = Money::from_cents(1600);
        assert!(matches!(
            validate_record(&r),
            Err(ValidationError::TotalMismatch { .. })
        ));

        // Same quantities are valid at the supplier rate
        r.supplier_rate = true;
        assert!(validate_record(&r).is_ok());
    }

    #[test]
    fn test_change_mismatch() {
        let mut r = record();
        r.change = Money::from_cents(900);
        assert!(matches!(
            validate_record(&r),
            Err(ValidationError::ChangeMismatch { .. })
        ));
    }

    #[test]
    fn test_payment_must_cover_total() {
        let mut r = record();
        r.payment = Money::from_cents(4000);
        r.change = Money::from_cents(-1000);
        assert!(matches!(
            validate_record(&r),
            Err(ValidationError::InsufficientPayment { .. })
        ));
    }

    #[test]
    fn test_empty_and_missing_user() {
        let mut r = record();
        r.quantities = ProductQuantities::default();
        assert_eq!(validate_record(&r), Err(ValidationError::EmptySale));

        let mut r = record();
        r.recorded_by = String::new();
        assert!(matches!(
            validate_record(&r),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_zero_priced_special_is_empty_sale() {
        let mut r = record();
        r.quantities = ProductQuantities::default();
        r.quantities.set(Product::Special, Quantity::from_units(2));
        r.total = Money::zero();
        r.change = r.payment;
        assert_eq!(validate_record(&r), Err(ValidationError::EmptySale));
    }

    #[test]
    fn test_limits() {
        let err = validate_quantity(Product::Mix, Quantity::from_units(1_000_001)).unwrap_err();
        assert_eq!(err.field(), Some("mix_qty"));
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert!(validate_quantity(Product::Mix, MAX_QUANTITY).is_ok());

        let err = validate_amount("payment", Money::from_cents(i64::MAX)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert!(validate_amount("payment", MAX_AMOUNT).is_ok());
    }

    #[test]
    fn test_overflowing_quantities_are_rejected_not_wrapped() {
        let huge: Quantity = "9000000000000000".parse().unwrap();
        let regular = PricingContext::default();

        let mut q = ProductQuantities::default();
        q.set(Product::Totopos, huge);
        assert_eq!(
            priced_total(&q, &regular).unwrap_err().field(),
            Some("total")
        );

        q.set(Product::Cacahuates, huge);
        assert!(matches!(
            priced_total(&q, &regular),
            Err(ValidationError::TooLarge { .. })
        ));

        // An imported row carrying the same quantities stops at the cap
        let mut r = record();
        r.quantities = q;
        assert!(matches!(
            validate_record(&r),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_negative_amounts() {
        let mut r = record();
        r.special_unit_price = Money::from_cents(-100);
        assert_eq!(
            validate_record(&r).unwrap_err().field(),
            Some("special_price")
        );
    }
}
