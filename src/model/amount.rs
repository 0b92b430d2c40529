//! Amount type for handling monetary values as they appear in the sheet.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may carry a currency prefix (e.g. `NT$`) and thousands separators.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Represents a monetary amount.
///
/// Equality and ordering are numeric, so `100` and `100.00` are equal. When written back to the
/// sheet the value is normalized, i.e. trailing zeros after the decimal point are dropped.
///
/// # Examples
///
/// ```
/// # use sheet_ledger::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("NT$1,250").unwrap();
/// let b = Amount::from_str("1250.00").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "1250");
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

    /// Returns true if the amount is greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Formats the amount for people, with thousands separators and a currency symbol,
    /// e.g. `NT$ 4,900` or `-NT$ 12.50`. Whole amounts are shown without decimals.
    pub fn display_with(&self, currency_symbol: &str) -> String {
        let sign = if self.0.is_sign_negative() && !self.is_zero() {
            "-"
        } else {
            ""
        };
        let abs = self.0.abs();
        // Formatted from the decimal digits, so large amounts stay exact
        let plain = if abs.fract().is_zero() {
            abs.trunc().normalize().to_string()
        } else {
            format!("{abs:.2}")
        };
        let digits = match plain.split_once('.') {
            Some((whole, cents)) => format!("{}.{cents}", group_thousands(whole)),
            None => group_thousands(&plain),
        };
        if currency_symbol.is_empty() {
            format!("{sign}{digits}")
        } else {
            format!("{sign}{currency_symbol} {digits}")
        }
    }
}

/// Inserts a comma between every group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (ix, c) in digits.chars().enumerate() {
        if ix > 0 && (len - ix) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(String);

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

impl Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError(String::from("The amount is empty")));
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        // Drop a currency prefix such as `NT$`, `$` or `NT$ `
        let digits_start = unsigned
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(unsigned.len());
        let (prefix, digits) = unsigned.split_at(digits_start);
        if !prefix.chars().all(|c| c.is_alphabetic() || c == '$' || c.is_whitespace()) {
            return Err(AmountError(format!("'{s}' is not a valid amount")));
        }

        let without_commas = digits.replace(',', "");
        let value = Decimal::from_str(&without_commas)
            .map_err(|e| AmountError(format!("'{s}' is not a valid amount: {e}")))?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.normalize(), f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
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

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
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

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50").unwrap();
        assert_eq!(amount.value(), dec("50"));
    }

    #[test]
    fn test_parse_with_currency_prefix() {
        assert_eq!(Amount::from_str("NT$120").unwrap().value(), dec("120"));
        assert_eq!(Amount::from_str("NT$ 120").unwrap().value(), dec("120"));
        assert_eq!(Amount::from_str("$50.00").unwrap().value(), dec("50"));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(Amount::from_str("-50.25").unwrap().value(), dec("-50.25"));
        assert_eq!(Amount::from_str("-$50").unwrap().value(), dec("-50"));
    }

    #[test]
    fn test_parse_with_commas() {
        let amount = Amount::from_str("1,234,567.89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_whitespace() {
        let amount = Amount::from_str("  300  ").unwrap();
        assert_eq!(amount.value(), dec("300"));
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("   ").is_err());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(Amount::from_str("abc").is_err());
        assert!(Amount::from_str("12abc").is_err());
        assert!(Amount::from_str("#100").is_err());
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(Amount::from_str("100.00").unwrap().to_string(), "100");
        assert_eq!(Amount::from_str("12.50").unwrap().to_string(), "12.5");
        assert_eq!(Amount::ZERO.to_string(), "0");
    }

    #[test]
    fn test_numeric_equality() {
        let a = Amount::from_str("100").unwrap();
        let b = Amount::from_str("NT$100.00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_with_large_amount_is_exact() {
        let amount = Amount::from_str("12345678901234567890.5").unwrap();
        assert_eq!(amount.display_with("NT$"), "NT$ 12,345,678,901,234,567,890.50");
        let amount = Amount::from_str("9007199254740993").unwrap();
        assert_eq!(amount.display_with(""), "9,007,199,254,740,993");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }

    #[test]
    fn test_display_with_currency() {
        let amount = Amount::from_str("4900").unwrap();
        assert_eq!(amount.display_with("NT$"), "NT$ 4,900");
        let amount = Amount::from_str("-1234.5").unwrap();
        assert_eq!(amount.display_with("$"), "-$ 1,234.50");
        assert_eq!(Amount::ZERO.display_with(""), "0");
    }

    #[test]
    fn test_is_positive() {
        assert!(Amount::from_str("1").unwrap().is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::from_str("-1").unwrap().is_positive());
    }

    #[test]
    fn test_sum() {
        let amounts = vec![
            Amount::from_str("100").unwrap(),
            Amount::from_str("0.5").unwrap(),
            Amount::from_str("20").unwrap(),
        ];
        let total: Amount = amounts.iter().sum();
        assert_eq!(total.value(), dec("120.5"));
        let empty: Vec<Amount> = Vec::new();
        assert_eq!(empty.into_iter().sum::<Amount>(), Amount::ZERO);
    }

    #[test]
    fn test_serde() {
        let amount = Amount::from_str("5000").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"5000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
