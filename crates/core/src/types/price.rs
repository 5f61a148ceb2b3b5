//! Type-safe price representation using decimal arithmetic.
//!
//! The shop trades in a single currency, so a price is just an exact decimal
//! amount. On the wire it is a JSON number; incoming payloads may also carry
//! decimal strings (`"100.00"`), which deserialize to the same value.
//!
//! Serialized numbers pass through `f64`, so an amount round-trips exactly
//! only up to about 15 significant digits (a price below 10^13 with two
//! decimal places). Larger amounts are rounded when written.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money in the shop currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in minor units (kopecks, cents).
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn line_total(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let unit = Price::from_minor(1999);
        assert_eq!(unit.line_total(3), Price::from_minor(5997));
        assert_eq!(unit.line_total(0), Price::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::from_minor(100), Price::from_minor(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_minor(350));

        let empty: Price = core::iter::empty().sum();
        assert_eq!(empty, Price::ZERO);
    }

    #[test]
    fn test_display_uses_two_decimals() {
        assert_eq!(Price::new(Decimal::from(100)).to_string(), "100.00");
        assert_eq!(Price::from_minor(1999).to_string(), "19.99");
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Price::from_minor(1999)).unwrap();
        assert_eq!(json, "19.99");
    }

    #[test]
    fn test_realistic_prices_round_trip_exactly() {
        for minor in [1, 2_490_99, 9_999_999_999_99, 1_234_567_890_123_45] {
            let price = Price::from_minor(minor);
            let json = serde_json::to_string(&price).unwrap();
            assert_eq!(serde_json::from_str::<Price>(&json).unwrap(), price, "{json}");
        }
    }

    #[test]
    fn test_deserializes_from_number_or_string() {
        let from_number: Price = serde_json::from_str("100").unwrap();
        let from_string: Price = serde_json::from_str("\"100.00\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_string, Price::from_minor(10_000));
    }
}
