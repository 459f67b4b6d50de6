use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::op;

//--------------------------------------      Money       ------------------------------------------------------------
/// An amount of money in integer cents. All marketplace pricing arithmetic happens in cents so that totals are exact.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = self.0 / 100;
        let cents = (self.0 % 100).abs();
        write!(f, "${dollars}.{cents:02}")
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_on_cents() {
        let a = Money::from_cents(4_000);
        let b = Money::from_cents(1_250);
        assert_eq!((a + b).value(), 5_250);
        assert_eq!((a - b).value(), 2_750);
        assert_eq!((a * 3).value(), 12_000);
        assert_eq!((-b).value(), -1_250);
        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.value(), 6_500);
    }

    #[test]
    fn display_in_dollars() {
        assert_eq!(Money::from_cents(12_345).to_string(), "$123.45");
        assert_eq!(Money::from_dollars(40).to_string(), "$40.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }
}
