use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The number of decimal places carried by every [`Amount`].
pub const AMOUNT_SCALE: u32 = 2;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A monetary value held as a signed count of minor units (hundredths of the currency unit).
///
/// The currency is always carried alongside the amount, never inside it, so that aggregation code has to compare
/// currencies explicitly before adding amounts together.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Amount(i64);

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

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountConversionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let minor = value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
            * Decimal::ONE_HUNDRED;
        minor
            .to_i64()
            .map(Self)
            .ok_or_else(|| AmountConversionError(format!("{value} is out of range")))
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = Decimal::from_str(s.trim()).map_err(|e| AmountConversionError(format!("{s}: {e}")))?;
        Self::try_from(d)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Amount {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn zero() -> Self {
        Self(0)
    }

    /// Builds an amount from whole currency units, e.g. `Amount::from_units(10) == "10.00"`.
    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, AMOUNT_SCALE)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Multiplies the amount by `numerator / denominator`, rounding half away from zero.
    ///
    /// Returns `None` if the denominator is zero or the result does not fit.
    pub fn scale(&self, numerator: i64, denominator: i64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let product = i128::from(self.0) * i128::from(numerator);
        let d = i128::from(denominator);
        let negative = (product < 0) != (d < 0);
        let magnitude = (product.abs() + d.abs() / 2) / d.abs();
        let rounded = if negative { -magnitude } else { magnitude };
        i64::try_from(rounded).ok().map(Self)
    }
}
