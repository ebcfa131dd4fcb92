//! Amount type for monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Amounts are stored in the
//! database as plain decimal strings and displayed with thousands separators and two decimals.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::str::FromStr;

/// Represents a monetary value.
///
/// # Examples
///
/// ```
/// # use smartcash::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1234.5").unwrap();
/// assert_eq!(amount.to_string(), "1,234.50");
/// assert_eq!(amount.with_symbol("R$"), "R$ 1,234.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// The value as an `f64`, for presentation math such as bar heights.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// The exact decimal text used for storage, e.g. `1234.5`.
    pub fn to_storage_string(&self) -> String {
        self.0.normalize().to_string()
    }

    /// Adds `rhs`, returning `None` on overflow.
    pub fn checked_add(&self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_mul(&self, quantity: Decimal) -> Option<Amount> {
        self.0.checked_mul(quantity).map(Amount)
    }

    pub fn saturating_add(&self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_mul(&self, quantity: Decimal) -> Amount {
        Amount(self.0.saturating_mul(quantity))
    }

    /// Formats the amount prefixed by a currency symbol, e.g. `$ 1,234.50`.
    pub fn with_symbol(&self, symbol: &str) -> String {
        if symbol.is_empty() {
            self.to_string()
        } else {
            format!("{symbol} {self}")
        }
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }
        // Thousands separators are accepted on input
        let without_commas = trimmed.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.0.abs().round_dp(2);
        write!(
            f,
            "{sign}{}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_storage_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

/// Sums saturate at the `Decimal` bounds rather than overflowing.
impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc.saturating_add(a))
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(amt("50.00").value(), Decimal::from_str("50").unwrap());
    }

    #[test]
    fn test_parse_with_commas() {
        assert_eq!(
            amt("1,234,567.89").value(),
            Decimal::from_str("1234567.89").unwrap()
        );
    }

    #[test]
    fn test_parse_empty_string() {
        assert_eq!(amt("  ").value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("$5").is_err());
        assert!(Amount::from_str("five").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(amt("50").to_string(), "50.00");
        assert_eq!(amt("-60000").to_string(), "-60,000.00");
        assert_eq!(amt("0").to_string(), "0.00");
    }

    #[test]
    fn test_with_symbol() {
        assert_eq!(amt("3.5").with_symbol("$"), "$ 3.50");
        assert_eq!(amt("3.5").with_symbol(""), "3.50");
    }

    #[test]
    fn test_storage_string_is_exact() {
        assert_eq!(amt("10.50").to_storage_string(), "10.5");
        assert_eq!(amt("0.125").to_storage_string(), "0.125");
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&amt("12.30")).unwrap();
        assert_eq!(json, "\"12.3\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amt("12.3"));
    }

    #[test]
    fn test_arithmetic() {
        let total: Amount = [amt("1.10"), amt("2.20")].iter().sum();
        assert_eq!(total, amt("3.3"));
        assert_eq!(amt("2.5").checked_mul(Decimal::from(3)), Some(amt("7.5")));
        assert_eq!(amt("1").checked_add(amt("2")), Some(amt("3")));
    }

    #[test]
    fn test_overflow() {
        let max = Amount::new(Decimal::MAX);
        assert_eq!(max.checked_add(amt("1")), None);
        assert_eq!(max.checked_mul(Decimal::TWO), None);
        assert_eq!(max.saturating_add(amt("1")), max);
        assert_eq!(max.saturating_mul(Decimal::TWO), max);
        let total: Amount = [max, max].iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_sign() {
        assert!(amt("1").is_positive());
        assert!(!amt("0").is_positive());
        assert!(!amt("0").is_negative());
        assert!(amt("-1").is_negative());
    }
}
