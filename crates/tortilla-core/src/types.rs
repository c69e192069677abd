//! # Domain Types
//!
//! Core data structures for the tortilla shop ledger.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sale Lifecycle                                 │
//! │                                                                         │
//! │  ┌───────────┐   commit()    ┌────────────┐   append()   ┌───────────┐ │
//! │  │ SaleDraft │──────────────►│ SaleRecord │─────────────►│  Ledger   │ │
//! │  │ (mutable, │  validates,   │ (immutable)│              │  (seq)    │ │
//! │  │  caller-  │  stamps user, │            │              └─────┬─────┘ │
//! │  │  owned)   │  date, time   └────────────┘                    │       │
//! │  └───────────┘                                                 ▼       │
//! │                                                        LedgerEntry     │
//! │                                                        { index, record}│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{line_amount, sale_total, PricingContext, Product};
use crate::quantity::Quantity;
use crate::validation::{
    priced_total, validate_amount, validate_quantity, validate_record, ValidationResult,
};

// =============================================================================
// Product Quantities
// =============================================================================

/// One quantity per product.
///
/// Used both for a single sale and for per-product totals over many sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantities {
    pub tortilla: Quantity,
    pub totopos: Quantity,
    pub cacahuates: Quantity,
    pub mix: Quantity,
    pub salted_chips: Quantity,
    pub special: Quantity,
}

impl ProductQuantities {
    pub fn get(&self, product: Product) -> Quantity {
        match product {
            Product::Tortilla => self.tortilla,
            Product::Totopos => self.totopos,
            Product::Cacahuates => self.cacahuates,
            Product::Mix => self.mix,
            Product::SaltedChips => self.salted_chips,
            Product::Special => self.special,
        }
    }

    pub fn set(&mut self, product: Product, qty: Quantity) {
        *self.slot(product) = qty;
    }

    fn slot(&mut self, product: Product) -> &mut Quantity {
        match product {
            Product::Tortilla => &mut self.tortilla,
            Product::Totopos => &mut self.totopos,
            Product::Cacahuates => &mut self.cacahuates,
            Product::Mix => &mut self.mix,
            Product::SaltedChips => &mut self.salted_chips,
            Product::Special => &mut self.special,
        }
    }

    /// `(product, quantity)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Product, Quantity)> + '_ {
        Product::ALL.iter().map(move |p| (*p, self.get(*p)))
    }

    /// Products with a non-zero quantity.
    pub fn non_zero(&self) -> impl Iterator<Item = (Product, Quantity)> + '_ {
        self.iter().filter(|(_, q)| !q.is_zero())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, q)| q.is_zero())
    }

    /// Adds every product quantity of `other` into `self`.
    pub fn accumulate(&mut self, other: &ProductQuantities) {
        for (product, qty) in other.iter() {
            *self.slot(product) += qty;
        }
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// One committed transaction.
///
/// Immutable once persisted. `total` is the priced sum at the record's
/// supplier rate and `change` is always `payment - total`; both invariants
/// are checked by [`validate_record`] before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub recorded_by: String,
    pub quantities: ProductQuantities,
    pub special_unit_price: Money,
    /// Informational only, does not affect price.
    pub frequent_customer: bool,
    pub supplier_rate: bool,
    pub total: Money,
    pub payment: Money,
    pub change: Money,
}

impl SaleRecord {
    pub fn pricing_context(&self) -> PricingContext {
        PricingContext::new(self.supplier_rate, self.special_unit_price)
    }

    /// Line amount for one product of this sale.
    pub fn line_amount(&self, product: Product) -> Money {
        line_amount(product, self.quantities.get(product), &self.pricing_context())
    }
}

/// A record together with its 0-based position in storage order.
///
/// Listings are sorted for display, so the position travels with the record
/// and delete-by-index always targets the row that was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub index: usize,
    pub record: SaleRecord,
}

// =============================================================================
// Sale Draft
// =============================================================================

/// A sale being assembled at the counter.
///
/// The caller owns the draft and passes it to commit. Nothing here touches
/// the ledger.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Tortilla 1 kg ──► set_quantity(Tortilla, 1.0)                         │
/// │  [x] Supplier  ──► set_supplier_rate(true)                             │
/// │  Payment $30   ──► set_payment($30.00)    total $22.00, change $8.00   │
/// │  [Save]        ──► commit(user, date, time) ──► SaleRecord             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDraft {
    quantities: ProductQuantities,
    special_unit_price: Money,
    frequent_customer: bool,
    supplier_rate: bool,
    payment: Money,
}

impl SaleDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantities(&self) -> &ProductQuantities {
        &self.quantities
    }

    pub fn quantity(&self, product: Product) -> Quantity {
        self.quantities.get(product)
    }

    pub fn special_unit_price(&self) -> Money {
        self.special_unit_price
    }

    pub fn frequent_customer(&self) -> bool {
        self.frequent_customer
    }

    pub fn supplier_rate(&self) -> bool {
        self.supplier_rate
    }

    pub fn payment(&self) -> Money {
        self.payment
    }

    /// Sets a product quantity.
    ///
    /// ## Errors
    /// - `MustNotBeNegative` for negative quantities
    /// - `TooLarge` above [`crate::quantity::MAX_QUANTITY`]
    /// - `InvalidStep` when not a multiple of the product's step
    pub fn set_quantity(&mut self, product: Product, qty: Quantity) -> ValidationResult<()> {
        validate_quantity(product, qty)?;
        self.quantities.set(product, qty);
        Ok(())
    }

    pub fn set_special_unit_price(&mut self, price: Money) -> ValidationResult<()> {
        validate_amount("special_price", price)?;
        self.special_unit_price = price;
        Ok(())
    }

    pub fn set_frequent_customer(&mut self, frequent: bool) {
        self.frequent_customer = frequent;
    }

    pub fn set_supplier_rate(&mut self, supplier: bool) {
        self.supplier_rate = supplier;
    }

    pub fn set_payment(&mut self, payment: Money) -> ValidationResult<()> {
        validate_amount("payment", payment)?;
        self.payment = payment;
        Ok(())
    }

    pub fn pricing_context(&self) -> PricingContext {
        PricingContext::new(self.supplier_rate, self.special_unit_price)
    }

    /// Running total of the draft, for display. Saturates; [`Self::commit`]
    /// rejects anything out of range.
    pub fn total(&self) -> Money {
        sale_total(&self.quantities, &self.pricing_context())
    }

    /// `payment - total`; negative while the payment is short.
    pub fn change(&self) -> Money {
        self.payment - self.total()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Freezes the draft into a validated record.
    ///
    /// `time` is truncated to whole seconds. The draft itself is left as is,
    /// so a failed commit can be corrected and retried.
    ///
    /// ## Errors
    /// - `EmptySale` when the total is not above zero
    /// - `TooLarge` when the total is out of range
    /// - `InsufficientPayment` when payment does not cover the total
    /// - Any [`validate_record`] failure
    pub fn commit(
        &self,
        recorded_by: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> ValidationResult<SaleRecord> {
        let total = priced_total(&self.quantities, &self.pricing_context())?;
        if self.payment < total {
            return Err(ValidationError::InsufficientPayment {
                total,
                payment: self.payment,
            });
        }

        let record = SaleRecord {
            date,
            time: time.with_nanosecond(0).unwrap_or(time),
            recorded_by: recorded_by.trim().to_string(),
            quantities: self.quantities,
            special_unit_price: self.special_unit_price,
            frequent_customer: self.frequent_customer,
            supplier_rate: self.supplier_rate,
            total,
            payment: self.payment,
            change: self.payment - total,
        };
        validate_record(&record)?;
        Ok(record)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
