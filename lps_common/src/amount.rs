use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------      Amount       -----------------------------------------------------------
/// A fixed-decimal sum of loyalty points.
///
/// `Amount` is used end-to-end: the database column type is NUMERIC, all arithmetic happens on the decimal
/// representation, and only the JSON boundary converts to plain numbers. The wire contract wants unquoted
/// numbers, so serialization goes through the float encoder, while deserialization accepts integer, fractional
/// and string forms.
#[derive(Debug, Clone, Copy, Default, Type, PartialOrd, Ord)]
#[sqlx(transparent)]
pub struct Amount(Decimal);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(inplace Amount, AddAssign, add_assign);
op!(inplace Amount, SubAssign, sub_assign);
op!(unary Amount, Neg, neg);

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a point amount: {0}")]
pub struct AmountConversionError(String);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self).map_err(|e| AmountConversionError(format!("{s}: {e}")))
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Amount {}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod test {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn arithmetic() {
        let a = Amount::from(dec!(500));
        let b = Amount::from(dec!(10.5));
        assert_eq!(a + b, Amount::from(dec!(510.5)));
        assert_eq!(a - b, Amount::from(dec!(489.5)));
        let total: Amount = [a, b, Amount::ZERO].into_iter().sum();
        assert_eq!(total, Amount::from(dec!(510.5)));
    }

    #[test]
    fn serializes_as_plain_number() {
        let a = Amount::from(dec!(729.98));
        assert_eq!(serde_json::to_string(&a).unwrap(), "729.98");
        let b = Amount::from(500i64);
        assert_eq!(serde_json::to_string(&b).unwrap(), "500.0");
    }

    #[test]
    fn deserializes_integer_and_fractional_forms() {
        let a: Amount = serde_json::from_str("751").unwrap();
        assert_eq!(a, Amount::from(751i64));
        let b: Amount = serde_json::from_str("729.98").unwrap();
        assert_eq!(b, Amount::from(dec!(729.98)));
    }

    #[test]
    fn comparisons() {
        assert!(Amount::from(dec!(100)) > Amount::from(dec!(99.99)));
        assert!(Amount::from(dec!(0.01)).is_positive());
        assert!(!Amount::ZERO.is_positive());
    }
}
