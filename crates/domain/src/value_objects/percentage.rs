//! Exact fractional rates for fees, bands and buffers.

use crate::error::{MathError, MathResult};
use crate::math::full_math::{Rounding, mul_div_u128};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An exact rate in `[0, 1)`.
///
/// Backed by a `Decimal` so configured values like `0.1` stay exact; applying the rate
/// to an amount is integer math on the decimal's mantissa and scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);

    pub fn new(value: Decimal) -> MathResult<Self> {
        if value.is_sign_negative() || value >= Decimal::ONE {
            return Err(MathError::InvalidRate);
        }
        Ok(Self(value))
    }

    pub fn from_bps(bps: u32) -> MathResult<Self> {
        Self::new(Decimal::from(bps) / Decimal::from(10_000))
    }

    /// Parts per million, the unit AMM pools quote swap fees in.
    pub fn from_ppm(ppm: u32) -> MathResult<Self> {
        Self::new(Decimal::from(ppm) / Decimal::from(1_000_000))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    fn ratio(&self) -> (u128, u128) {
        let normalized = self.0.normalize();
        // [0, 1) keeps the mantissa non-negative and below 10^28.
        let numerator = normalized.mantissa().unsigned_abs();
        let denominator = 10u128.pow(normalized.scale());
        (numerator, denominator)
    }

    /// `amount * rate`.
    pub fn apply(&self, amount: u128, rounding: Rounding) -> MathResult<u128> {
        let (numerator, denominator) = self.ratio();
        mul_div_u128(amount, numerator, denominator, rounding)
    }

    /// `amount / (1 - rate)`.
    pub fn divide_by_complement(&self, amount: u128, rounding: Rounding) -> MathResult<u128> {
        let (numerator, denominator) = self.ratio();
        mul_div_u128(amount, denominator, denominator - numerator, rounding)
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = MathError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Self {
        p.0
    }
}
