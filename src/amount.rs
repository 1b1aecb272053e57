//! Amount Module
//!
//! Fixed-point protocol amounts. Every balance, limit and threshold on the
//! ledger is a signed 64-bit count of the smallest unit (1/10^7 of a whole
//! unit). Parsing never rounds: input with more than seven fraction digits is
//! rejected instead of truncated, and arithmetic is checked so that overflow
//! surfaces as a failure rather than a wrapped value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of smallest units in one whole unit.
pub const ONE: i64 = 10_000_000;

/// Number of digits after the decimal point.
pub const PRECISION: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid amount {0:?}")]
    Invalid(String),
    #[error("amount {0:?} has more than 7 fraction digits")]
    TooPrecise(String),
    #[error("amount {0:?} does not fit in 64 bits")]
    Overflow(String),
}

/// A protocol amount in smallest units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(i64::MAX);

    /// Wraps a raw count of smallest units.
    pub const fn from_units(units: i64) -> Self {
        Amount(units)
    }

    /// Builds an amount from whole units, `None` on overflow.
    pub fn from_whole(whole: i64) -> Option<Self> {
        whole.checked_mul(ONE).map(Amount)
    }

    pub const fn units(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Multiplies by the rational `n / d`, rounding down.
    ///
    /// Used for the buying side of an offer (`amount * price`). Returns `None`
    /// when `d` is not positive or the result does not fit in 64 bits.
    pub fn checked_mul_div(self, n: i64, d: i64) -> Option<Amount> {
        if d <= 0 {
            return None;
        }
        let product = (self.0 as i128).checked_mul(n as i128)?;
        i64::try_from(product / d as i128).ok().map(Amount)
    }

    /// Parses a decimal string such as `"500"`, `"500.0"` or `"0.0000001"`.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
            return Err(AmountError::Invalid(input.to_string()));
        }
        if fraction.len() > PRECISION {
            return Err(AmountError::TooPrecise(input.to_string()));
        }

        let overflow = || AmountError::Overflow(input.to_string());

        let whole_units: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse::<i128>().map_err(|_| overflow())?
        };
        let mut fraction_units: i128 = 0;
        for (i, b) in fraction.bytes().enumerate() {
            fraction_units += (b - b'0') as i128 * 10_i128.pow((PRECISION - 1 - i) as u32);
        }

        let total = whole_units
            .checked_mul(ONE as i128)
            .and_then(|w| w.checked_add(fraction_units))
            .ok_or_else(overflow)?;
        let signed = if negative { -total } else { total };

        i64::try_from(signed).map(Amount).map_err(|_| overflow())
    }
}

impl fmt::Display for Amount {
    /// Formats with exactly seven fraction digits, e.g. `500.0000000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0 as i128;
        let sign = if units < 0 { "-" } else { "" };
        let abs = units.abs();
        write!(
            f,
            "{}{}.{:07}",
            sign,
            abs / ONE as i128,
            abs % ONE as i128
        )
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(Amount::parse("500").unwrap().units(), 5_000_000_000);
        assert_eq!(Amount::parse("500.0").unwrap().units(), 5_000_000_000);
        assert_eq!(Amount::parse("0.0000001").unwrap().units(), 1);
        assert_eq!(Amount::parse(".5").unwrap().units(), 5_000_000);
        assert_eq!(Amount::parse("-1.25").unwrap().units(), -12_500_000);
    }

    #[test]
    fn test_parse_rejects_extra_precision() {
        // Would silently lose the last digit if truncated
        assert_eq!(
            Amount::parse("1.00000001"),
            Err(AmountError::TooPrecise("1.00000001".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Amount::parse(""), Err(AmountError::Empty));
        assert!(matches!(Amount::parse("abc"), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::parse("1.2.3"), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::parse("."), Err(AmountError::Invalid(_))));
        assert!(matches!(Amount::parse("1e5"), Err(AmountError::Invalid(_))));
    }

    #[test]
    fn test_parse_overflow() {
        // i64::MAX is 922337203685.4775807
        assert_eq!(Amount::parse("922337203685.4775807").unwrap(), Amount::MAX);
        assert!(matches!(
            Amount::parse("922337203685.4775808"),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_units(5_000_000_000).to_string(), "500.0000000");
        assert_eq!(Amount::from_units(1).to_string(), "0.0000001");
        assert_eq!(Amount::from_units(-12_500_000).to_string(), "-1.2500000");
        assert_eq!(Amount::MAX.to_string(), "922337203685.4775807");
    }

    #[test]
    fn test_checked_arithmetic_does_not_wrap() {
        assert_eq!(Amount::MAX.checked_add(Amount::from_units(1)), None);
        assert_eq!(Amount::MAX.saturating_add(Amount::from_units(1)), Amount::MAX);
        assert_eq!(
            Amount::from_units(10).checked_sub(Amount::from_units(3)),
            Some(Amount::from_units(7))
        );
    }

    #[test]
    fn test_mul_div() {
        let amount = Amount::from_whole(10).unwrap();
        assert_eq!(amount.checked_mul_div(3, 2), Amount::from_whole(15));
        assert_eq!(amount.checked_mul_div(1, 0), None);
        assert_eq!(Amount::MAX.checked_mul_div(2, 1), None);
    }

    #[test]
    fn test_serde_as_string() {
        let amount = Amount::from_whole(42).unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"42.0000000\"");
        let back: Amount = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, amount);
    }
}
