//! # Pricing Policy
//!
//! The single source of truth for what a line of a sale costs.
//!
//! ## Price List
//! ```text
//! ┌──────────────┬──────────────────────────────┬─────────┐
//! │ Product      │ Unit price                   │ Step    │
//! ├──────────────┼──────────────────────────────┼─────────┤
//! │ Tortilla     │ $25.00/kg ($22.00 supplier)  │ 0.5 kg  │
//! │ Totopos      │ $25.00                       │ 1       │
//! │ Cacahuates   │ $10.00                       │ 1       │
//! │ Mix          │ $10.00                       │ 1       │
//! │ Salted Chips │ $15.00                       │ 1       │
//! │ Special      │ entered per sale             │ 1       │
//! └──────────────┴──────────────────────────────┴─────────┘
//! ```
//!
//! Sale entry, daily aggregation and receipts all price through
//! [`line_amount`], so they can never disagree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::ProductQuantities;

// =============================================================================
// Price Constants
// =============================================================================

/// Regular tortilla price per kilogram.
pub const TORTILLA_PRICE: Money = Money::from_cents(2500);

/// Tortilla price per kilogram when the buyer is a supplier.
pub const TORTILLA_SUPPLIER_PRICE: Money = Money::from_cents(2200);

pub const TOTOPOS_PRICE: Money = Money::from_cents(2500);
pub const CACAHUATES_PRICE: Money = Money::from_cents(1000);
pub const MIX_PRICE: Money = Money::from_cents(1000);
pub const SALTED_CHIPS_PRICE: Money = Money::from_cents(1500);

// =============================================================================
// Product
// =============================================================================

/// The six products the shop sells.
///
/// Declaration order is the order products appear on every report and in the
/// persisted column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    Tortilla,
    Totopos,
    Cacahuates,
    Mix,
    SaltedChips,
    Special,
}

impl Product {
    /// All products in report order.
    pub const ALL: [Product; 6] = [
        Product::Tortilla,
        Product::Totopos,
        Product::Cacahuates,
        Product::Mix,
        Product::SaltedChips,
        Product::Special,
    ];

    /// Name printed on reports and receipts.
    pub const fn label(self) -> &'static str {
        match self {
            Product::Tortilla => "Tortillas",
            Product::Totopos => "Totopos",
            Product::Cacahuates => "Cacahuates",
            Product::Mix => "Mix",
            Product::SaltedChips => "Salted Chips",
            Product::Special => "Special",
        }
    }

    /// Quantity column in the persisted layout.
    pub const fn column(self) -> &'static str {
        match self {
            Product::Tortilla => "tortilla_qty",
            Product::Totopos => "totopos_qty",
            Product::Cacahuates => "cacahuates_qty",
            Product::Mix => "mix_qty",
            Product::SaltedChips => "salted_chips_qty",
            Product::Special => "special_qty",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Product::Tortilla => "kg",
            _ => "units",
        }
    }

    /// Smallest sellable increment.
    pub const fn step(self) -> Quantity {
        match self {
            Product::Tortilla => Quantity::from_milli(500),
            _ => Quantity::from_units(1),
        }
    }

    /// Fractional digits used when printing this product's quantity.
    pub const fn display_decimals(self) -> u32 {
        match self {
            Product::Tortilla => 1,
            _ => 0,
        }
    }

    /// Formats a quantity the way reports print it: `"2.5 kg"`, `"3 units"`.
    pub fn format_quantity(self, qty: Quantity) -> String {
        format!("{} {}", qty.format_decimals(self.display_decimals()), self.unit())
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts `tortilla`, `salted-chips`, `salted_chips`, `Salted Chips`, ...
impl FromStr for Product {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "tortilla" | "tortillas" => Ok(Product::Tortilla),
            "totopos" => Ok(Product::Totopos),
            "cacahuates" => Ok(Product::Cacahuates),
            "mix" => Ok(Product::Mix),
            "salted_chips" => Ok(Product::SaltedChips),
            "special" => Ok(Product::Special),
            _ => Err(CoreError::UnknownProduct(s.to_string())),
        }
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Per-sale inputs that change prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingContext {
    /// Tortilla sold at the supplier rate.
    pub supplier_rate: bool,
    /// Unit price entered for the Special product.
    pub special_unit_price: Money,
}

impl PricingContext {
    pub fn new(supplier_rate: bool, special_unit_price: Money) -> Self {
        Self {
            supplier_rate,
            special_unit_price,
        }
    }
}

/// Unit price of `product` under `ctx`.
pub fn unit_price(product: Product, ctx: &PricingContext) -> Money {
    match product {
        Product::Tortilla if ctx.supplier_rate => TORTILLA_SUPPLIER_PRICE,
        Product::Tortilla => TORTILLA_PRICE,
        Product::Totopos => TOTOPOS_PRICE,
        Product::Cacahuates => CACAHUATES_PRICE,
        Product::Mix => MIX_PRICE,
        Product::SaltedChips => SALTED_CHIPS_PRICE,
        Product::Special => ctx.special_unit_price,
    }
}

/// `quantity × unit price`.
///
/// ## Example
/// ```rust
/// use tortilla_core::pricing::{line_amount, PricingContext, Product};
/// use tortilla_core::quantity::Quantity;
///
/// let regular = PricingContext::default();
/// let amount = line_amount(Product::Tortilla, Quantity::from_units(2), &regular);
/// assert_eq!(amount.cents(), 5000);
/// ```
pub fn line_amount(product: Product, qty: Quantity, ctx: &PricingContext) -> Money {
    unit_price(product, ctx).times_quantity(qty)
}

/// Sum of the line amounts over all six products.
///
/// Saturates on overflow; validation goes through [`checked_sale_total`].
pub fn sale_total(quantities: &ProductQuantities, ctx: &PricingContext) -> Money {
    quantities
        .iter()
        .map(|(product, qty)| line_amount(product, qty, ctx))
        .sum()
}

/// [`sale_total`] that returns `None` if any line or the running sum
/// overflows.
pub fn checked_sale_total(quantities: &ProductQuantities, ctx: &PricingContext) -> Option<Money> {
    quantities
        .iter()
        .try_fold(Money::zero(), |total, (product, qty)| {
            unit_price(product, ctx)
                .checked_times_quantity(qty)
                .and_then(|line| total.checked_add(line))
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn test_unit_prices() {
        let regular = PricingContext::default();
        let supplier = PricingContext::new(true, Money::zero());
        assert_eq!(unit_price(Product::Tortilla, &regular).cents(), 2500);
        assert_eq!(unit_price(Product::Tortilla, &supplier).cents(), 2200);
        assert_eq!(unit_price(Product::Totopos, &supplier).cents(), 2500);
        assert_eq!(unit_price(Product::Cacahuates, &regular).cents(), 1000);
        assert_eq!(unit_price(Product::Mix, &regular).cents(), 1000);
        assert_eq!(unit_price(Product::SaltedChips, &regular).cents(), 1500);

        let special = PricingContext::new(false, Money::from_cents(1250));
        assert_eq!(unit_price(Product::Special, &special).cents(), 1250);
    }

    #[test]
    fn test_two_kilos_regular_and_supplier() {
        let mut q = ProductQuantities::default();
        q.set(Product::Tortilla, qty("2"));

        let regular = sale_total(&q, &PricingContext::default());
        assert_eq!(regular, Money::from_cents(5000));

        let supplier = sale_total(&q, &PricingContext::new(true, Money::zero()));
        assert_eq!(supplier, Money::from_cents(4400));
    }

    #[test]
    fn test_special_uses_entered_price() {
        let mut q = ProductQuantities::default();
        q.set(Product::Special, qty("3"));
        let ctx = PricingContext::new(false, Money::from_cents(1250));
        assert_eq!(sale_total(&q, &ctx).cents(), 3750);
    }

    #[test]
    fn test_total_equals_sum_of_lines_for_every_combination() {
        let mut q = ProductQuantities::default();
        q.set(Product::Tortilla, qty("1.5"));
        q.set(Product::Totopos, qty("2"));
        q.set(Product::Cacahuates, qty("1"));
        q.set(Product::Mix, qty("4"));
        q.set(Product::SaltedChips, qty("3"));
        q.set(Product::Special, qty("2"));

        for supplier_rate in [false, true] {
            for special_cents in [0, 1, 999, 1250] {
                let ctx = PricingContext::new(supplier_rate, Money::from_cents(special_cents));
                let manual: i64 = Product::ALL
                    .iter()
                    .map(|p| unit_price(*p, &ctx).cents() * q.get(*p).milli() / 1000)
                    .sum();
                assert_eq!(sale_total(&q, &ctx).cents(), manual);
            }
        }
    }

    #[test]
    fn test_checked_total_detects_overflow() {
        let regular = PricingContext::default();

        let mut q = ProductQuantities::default();
        q.set(Product::Totopos, qty("9000000000000000"));
        assert_eq!(checked_sale_total(&q, &regular), None);

        // Each line fits on its own; their sum does not
        let mut q = ProductQuantities::default();
        q.set(Product::Cacahuates, qty("9000000000000000"));
        q.set(Product::Mix, qty("9000000000000000"));
        assert!(Money::from_cents(1000)
            .checked_times_quantity(qty("9000000000000000"))
            .is_some());
        assert_eq!(checked_sale_total(&q, &regular), None);

        let mut q = ProductQuantities::default();
        q.set(Product::Tortilla, qty("2"));
        assert_eq!(checked_sale_total(&q, &regular), Some(Money::from_cents(5000)));
    }

    #[test]
    fn test_product_parsing_and_labels() {
        assert_eq!("salted-chips".parse::<Product>().unwrap(), Product::SaltedChips);
        assert_eq!("Salted Chips".parse::<Product>().unwrap(), Product::SaltedChips);
        assert_eq!("TORTILLA".parse::<Product>().unwrap(), Product::Tortilla);
        assert!("salsa".parse::<Product>().is_err());

        assert_eq!(Product::Tortilla.format_quantity(qty("3")), "3.0 kg");
        assert_eq!(Product::Mix.format_quantity(qty("4")), "4 units");
        assert_eq!(Product::SaltedChips.column(), "salted_chips_qty");
    }
}
