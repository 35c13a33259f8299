//! Fixed-precision decimal types for prices and quantities
//!
//! Uses rust_decimal for exact arithmetic. Floating point never touches
//! money or size; values serialize as strings so JSON cannot degrade them.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A trade price. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal
    ///
    /// # Panics
    /// Panics if the price is zero or negative
    pub fn new(value: Decimal) -> Self {
        assert!(value > Decimal::ZERO, "Price must be positive");
        Self(value)
    }

    /// Try to create a Price, returning None if non-positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self(value))
    }

    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Self::new(Decimal::from_str(s)?))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Round half-up to the given number of decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Self(self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl Mul<Quantity> for Price {
    type Output = Decimal;

    fn mul(self, rhs: Quantity) -> Decimal {
        self.0 * rhs.as_decimal()
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order or fill quantity. Non-negative; zero is reserved for
/// `filled_quantity` bookkeeping, order entry requires a positive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(Decimal);

impl Default for Quantity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// Create a new Quantity from a Decimal
    ///
    /// # Panics
    /// Panics if the quantity is negative
    pub fn new(value: Decimal) -> Self {
        assert!(value >= Decimal::ZERO, "Quantity cannot be negative");
        Self(value)
    }

    /// Try to create a Quantity, returning None if negative
    pub fn try_new(value: Decimal) -> Option<Self> {
        (value >= Decimal::ZERO).then_some(Self(value))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Self::new(Decimal::from_str(s)?))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn min(self, other: Quantity) -> Quantity {
        if self.0 <= other.0 { self } else { other }
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        assert!(self.0 >= rhs.0, "Quantity subtraction would go negative");
        Self(self.0 - rhs.0)
    }
}

impl Mul<Price> for Quantity {
    type Output = Decimal;

    fn mul(self, rhs: Price) -> Decimal {
        self.0 * rhs.as_decimal()
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("quantity cannot be negative"))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_rejects_non_positive() {
        assert!(Price::try_new(Decimal::ZERO).is_none());
        assert!(Price::try_new(Decimal::from(-5)).is_none());
        assert!(Price::try_new(Decimal::ONE).is_some());
    }

    #[test]
    fn quantity_allows_zero_but_not_negative() {
        assert!(Quantity::try_new(Decimal::ZERO).is_some());
        assert!(Quantity::try_new(Decimal::from(-1)).is_none());
        assert!(Quantity::ZERO.is_zero());
    }

    #[test]
    fn price_times_quantity() {
        let price = Price::from_u64(50_000);
        let qty = Quantity::from_str("0.5").unwrap();
        assert_eq!(price * qty, Decimal::from(25_000));
        assert_eq!(qty * price, Decimal::from(25_000));
    }

    #[test]
    fn quantity_arithmetic() {
        let a = Quantity::from_str("2.5").unwrap();
        let b = Quantity::from_str("1.5").unwrap();
        assert_eq!((a + b).as_decimal(), Decimal::from(4));
        assert_eq!((a - b).as_decimal(), Decimal::ONE);
        assert_eq!(a.min(b), b);
    }

    #[test]
    fn string_serde_round_trip() {
        let price = Price::from_str("50000.25").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"50000.25\"");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, back);
    }

    #[test]
    fn price_rounding_half_up() {
        let price = Price::from_str("49999.995").unwrap();
        assert_eq!(price.round_dp(2).to_string(), "50000.00");
    }
}
