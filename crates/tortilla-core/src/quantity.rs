//! # Quantity Module
//!
//! Fixed-point product quantities.
//!
//! Tortillas are weighed (half-kilogram steps), everything else is counted.
//! Both fit in one representation: an `i64` count of thousandths.
//!
//! ```text
//! "2.5" kg  ──parse──►  Quantity(2500)  ──display──►  "2.5"
//! "3" units ──parse──►  Quantity(3000)  ──display──►  "3"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::CoreError;
use crate::fixed::{format_scaled, parse_scaled};

/// Number of fractional decimal digits a `Quantity` carries.
pub const QUANTITY_PLACES: u32 = 3;

/// Thousandths in one whole unit.
pub const MILLI_PER_UNIT: i64 = 1000;

/// Largest quantity of one product in a single sale: one million units.
pub const MAX_QUANTITY: Quantity = Quantity::from_units(1_000_000);

/// A product quantity in thousandths of a unit (or of a kilogram).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units.saturating_mul(MILLI_PER_UNIT))
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    /// Raw thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// True when the quantity is an exact multiple of `step`.
    ///
    /// A zero step never matches.
    pub const fn is_multiple_of(&self, step: Quantity) -> bool {
        step.0 != 0 && self.0 % step.0 == 0
    }

    /// Renders with exactly `decimals` fractional digits (at most 3).
    ///
    /// ```rust
    /// use tortilla_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(3).format_decimals(1), "3.0");
    /// assert_eq!(Quantity::from_milli(2500).format_decimals(0), "3");
    /// ```
    pub fn format_decimals(&self, decimals: u32) -> String {
        format_scaled(self.0, QUANTITY_PLACES, decimals)
    }
}

/// Shortest exact decimal: `2.5`, `3`, `0.125`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = format_scaled(self.0, QUANTITY_PLACES, QUANTITY_PLACES);
        let shown = full.trim_end_matches('0').trim_end_matches('.');
        f.write_str(shown)
    }
}

impl FromStr for Quantity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, QUANTITY_PLACES)
            .map(Quantity)
            .map_err(|reason| CoreError::InvalidQuantity {
                input: s.to_string(),
                reason,
            })
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("2.5".parse::<Quantity>().unwrap().milli(), 2500);
        assert_eq!("3".parse::<Quantity>().unwrap(), Quantity::from_units(3));
        assert_eq!("0.125".parse::<Quantity>().unwrap().milli(), 125);
        assert_eq!("-1".parse::<Quantity>().unwrap().milli(), -1000);
        assert!(matches!(
            "two".parse::<Quantity>(),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!("0.0001".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_display_is_shortest_exact() {
        assert_eq!(Quantity::from_milli(2500).to_string(), "2.5");
        assert_eq!(Quantity::from_units(3).to_string(), "3");
        assert_eq!(Quantity::from_milli(125).to_string(), "0.125");
        assert_eq!(Quantity::zero().to_string(), "0");
        assert_eq!(Quantity::from_milli(-500).to_string(), "-0.5");
    }

    #[test]
    fn test_step_checks() {
        let half = Quantity::from_milli(500);
        assert!(Quantity::from_milli(1500).is_multiple_of(half));
        assert!(!Quantity::from_milli(1250).is_multiple_of(half));
        assert!(Quantity::zero().is_multiple_of(half));
        assert!(!Quantity::from_units(1).is_multiple_of(Quantity::zero()));
    }

    #[test]
    fn test_sum_saturates() {
        let one = Quantity::from_units(1);
        let total: Quantity = [one, Quantity::from_milli(500)].into_iter().sum();
        assert_eq!(total.milli(), 1500);

        let near_max = Quantity::from_milli(i64::MAX - 1);
        assert_eq!((near_max + one).milli(), i64::MAX);
    }
}
