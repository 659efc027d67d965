//! Type-safe money representation using decimal arithmetic.
//!
//! The store trades in a single currency (USD), so `Money` carries only an
//! amount. Amounts are never negative and are kept at two decimal places.
//! Stored amounts are `NUMERIC(10,2)`, which caps them at [`Money::MAX`].

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount cannot be negative")]
    Negative,
    #[error("amount cannot exceed 99999999.99")]
    TooLarge,
}

/// A non-negative amount in dollars, rounded half-up to cents.
///
/// Serializes as a decimal string (`"129.00"`) so clients never see float
/// rounding artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);
    /// Largest storable amount, 99,999,999.99.
    pub const MAX: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, 2));

    /// Create a money amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for amounts below zero.
    /// Returns `MoneyError::TooLarge` for amounts above [`Money::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Self::bounded(round_cents(amount))
    }

    /// Reject sums and products that no longer fit [`Money::MAX`].
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::TooLarge` when `self` exceeds the maximum.
    pub fn checked(self) -> Result<Self, MoneyError> {
        Self::bounded(self.0)
    }

    fn bounded(amount: Decimal) -> Result<Self, MoneyError> {
        if amount > Self::MAX.0 {
            return Err(MoneyError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Create a money amount from whole cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract without going below zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(round_cents(self.0 * Decimal::from(rhs)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Money::new(dec("-0.01")), Err(MoneyError::Negative));
        assert!(Money::new(dec("0")).is_ok());
    }

    #[test]
    fn test_rejects_amounts_over_max() {
        assert_eq!(Money::MAX.amount(), dec("99999999.99"));
        assert!(Money::new(dec("99999999.99")).is_ok());
        assert_eq!(Money::new(dec("100000000.00")), Err(MoneyError::TooLarge));
        assert_eq!(Money::new(dec("99999999.995")), Err(MoneyError::TooLarge));
        assert!(serde_json::from_str::<Money>("\"1000000000.00\"").is_err());
    }

    #[test]
    fn test_checked_sum() {
        let big = Money::new(dec("60000000.00")).unwrap();
        assert_eq!((big + big).checked(), Err(MoneyError::TooLarge));
        assert_eq!((big * 1).checked(), Ok(big));
    }

    #[test]
    fn test_rounds_to_cents() {
        assert_eq!(Money::new(dec("10.005")).unwrap().amount(), dec("10.01"));
        assert_eq!(Money::new(dec("10")).unwrap().to_string(), "$10.00");
    }

    #[test]
    fn test_arithmetic() {
        let price = Money::from_cents(4999);
        assert_eq!((price * 3).amount(), dec("149.97"));
        assert_eq!((price + Money::from_cents(1)).amount(), dec("50.00"));
        let total: Money = [price, price].into_iter().sum();
        assert_eq!(total.amount(), dec("99.98"));
    }

    #[test]
    fn test_saturating_sub() {
        let a = Money::from_cents(500);
        let b = Money::from_cents(700);
        assert_eq!(a.saturating_sub(b), Money::ZERO);
        assert_eq!(b.saturating_sub(a), Money::from_cents(200));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Money::from_cents(12900)).unwrap();
        assert_eq!(json, "\"129.00\"");
        let parsed: Money = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(parsed, Money::from_cents(1250));
        assert!(serde_json::from_str::<Money>("\"-1\"").is_err());
    }
}
