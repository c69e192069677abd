//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a day of sales as floats:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    2 kg × 2500 cents = 5000 cents, summed exactly                      │
//! │    Every report total is the exact sum of its lines                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tortilla_core::money::Money;
//! use tortilla_core::quantity::Quantity;
//!
//! let price = Money::from_cents(2500); // $25.00 per kg
//! let line = price.times_quantity(Quantity::from_milli(1500)); // 1.5 kg
//! assert_eq!(line.cents(), 3750);
//!
//! let payment: Money = "40".parse().unwrap();
//! assert_eq!((payment - line).to_string(), "$2.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::error::CoreError;
use crate::fixed::{format_scaled, parse_scaled, round_div};
use crate::quantity::Quantity;

// =============================================================================
// Money Type
// =============================================================================

/// Largest amount a single sale field may hold: $1,000,000,000,000.00.
///
/// Keeps every ledger sum far inside `i64` cents.
pub const MAX_AMOUNT: Money = Money::from_cents(100_000_000_000_000);

/// Represents a monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: Change can be computed as a plain subtraction
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serde**: Serialized as the raw cent count
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Pricing unit price ──► line amount ──► SaleRecord.total               │
/// │                                              │                          │
/// │  SaleRecord.payment ─────────────────────────┴──► SaleRecord.change    │
/// │                                                                         │
/// │  Daily subtotals / weekly revenue / receipts all sum these values      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use tortilla_core::money::Money;
    ///
    /// let price = Money::from_cents(2200); // $22.00
    /// assert_eq!(price.cents(), 2200);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole dollars.
    #[inline]
    pub const fn from_dollars(dollars: i64) -> Self {
        Money(dollars.saturating_mul(100))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the dollars portion (truncated toward zero).
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Addition that reports overflow instead of saturating.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiplies a unit price by a fixed-point quantity.
    ///
    /// ## Rounding
    /// `cents × thousandths / 1000`, rounded half away from zero to the
    /// nearest cent. For the quantity steps the shop sells (0.5 kg and whole
    /// units) with cent-exact prices the division is always exact.
    ///
    /// ## Example
    /// ```rust
    /// use tortilla_core::money::Money;
    /// use tortilla_core::quantity::Quantity;
    ///
    /// let special = Money::from_cents(1250); // $12.50 each
    /// assert_eq!(special.times_quantity(Quantity::from_units(3)).cents(), 3750);
    /// ```
    ///
    /// Saturates at the `i64` bounds; use [`Money::checked_times_quantity`]
    /// where an out-of-range product must be rejected.
    pub fn times_quantity(&self, qty: Quantity) -> Money {
        let cents = self.scaled_product(qty);
        Money(cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Like [`Money::times_quantity`], `None` when the product does not fit
    /// in `i64` cents.
    pub fn checked_times_quantity(&self, qty: Quantity) -> Option<Money> {
        i64::try_from(self.scaled_product(qty)).ok().map(Money)
    }

    fn scaled_product(&self, qty: Quantity) -> i128 {
        // i128 holds any i64 × i64
        round_div(self.0 as i128 * qty.milli() as i128, 1000)
    }

    /// Divides evenly by a count, rounding half away from zero.
    ///
    /// Returns zero when `count` is zero (an average over no sales).
    pub fn average_over(&self, count: u64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money::from_cents(round_div(self.0 as i128, count as i128) as i64)
    }

    /// Plain decimal text without the currency sign: `"37.50"`.
    ///
    /// Used for spreadsheet cells and right-aligned report columns.
    pub fn to_decimal_string(&self) -> String {
        format_scaled(self.0, 2, 2)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Arithmetic saturates instead of panicking. Validation caps every stored
// amount at MAX_AMOUNT, so a saturated value never passes as a real one.

/// Display shows money the way receipts and reports print it: `$37.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

/// Parses a decimal amount with at most two fractional digits.
///
/// A leading `$` is tolerated so values copied from a receipt parse back.
impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let without_sign = trimmed.strip_prefix('$').unwrap_or(trimmed);
        parse_scaled(without_sign, 2)
            .map(Money)
            .map_err(|reason| CoreError::InvalidMoney {
                input: s.to_string(),
                reason,
            })
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
