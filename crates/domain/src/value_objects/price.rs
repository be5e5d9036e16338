use crate::error::{MathError, MathResult};
use crate::math::full_math::{Rounding, mul_div, to_u128};
use crate::math::tick_math::{
    MAX_SQRT_RATIO, MIN_SQRT_RATIO, Q96, sqrt_ratio_at_tick, tick_at_sqrt_ratio,
};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pool price of A in units of B, stored as `sqrt(price) * 2^96`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SqrtPrice(U256);

impl SqrtPrice {
    pub fn new(sqrt_price_x96: U256) -> MathResult<Self> {
        if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 > MAX_SQRT_RATIO {
            return Err(MathError::SqrtPriceOutOfBounds);
        }
        Ok(Self(sqrt_price_x96))
    }

    pub fn from_tick(tick: i32) -> MathResult<Self> {
        Ok(Self(sqrt_ratio_at_tick(tick)?))
    }

    /// Price 1:1.
    pub fn parity() -> Self {
        Self(Q96)
    }

    pub fn x96(&self) -> U256 {
        self.0
    }

    pub fn tick(&self) -> MathResult<i32> {
        tick_at_sqrt_ratio(self.0)
    }

    /// Value of `amount_a` expressed in B.
    pub fn quote_a_in_b(&self, amount_a: u128, rounding: Rounding) -> MathResult<u128> {
        let partial = mul_div(U256::from(amount_a), self.0, Q96, rounding)?;
        to_u128(mul_div(partial, self.0, Q96, rounding)?)
    }

    /// Value of `amount_b` expressed in A.
    pub fn quote_b_in_a(&self, amount_b: u128, rounding: Rounding) -> MathResult<u128> {
        let partial = mul_div(U256::from(amount_b), Q96, self.0, rounding)?;
        to_u128(mul_div(partial, Q96, self.0, rounding)?)
    }

    /// Human-readable price with 18 decimals of precision. Display only.
    pub fn to_decimal(&self) -> MathResult<Decimal> {
        const SCALE: u32 = 18;
        let scaled = self.quote_a_in_b(10u128.pow(SCALE), Rounding::Floor)?;
        let mantissa = i128::try_from(scaled).map_err(|_| MathError::Overflow)?;
        Decimal::try_from_i128_with_scale(mantissa, SCALE).map_err(|_| MathError::Overflow)
    }
}
