//! Multiply-then-divide with a 512-bit intermediate and caller-chosen rounding.
//!
//! Every share and amount computation in the vault goes through these helpers so the
//! rounding direction is always explicit at the call site.

use crate::error::{MathError, MathResult};
use primitive_types::{U256, U512};

/// Rounding direction for a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round toward zero.
    Floor,
    /// Round away from zero when there is a remainder.
    Ceiling,
}

/// Computes `a * b / denominator` without intermediate overflow.
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> MathResult<U256> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    let product = a.full_mul(b);
    let (quotient, remainder) = product.div_mod(U512::from(denominator));
    let quotient = U256::try_from(quotient).map_err(|_| MathError::Overflow)?;

    match rounding {
        Rounding::Floor => Ok(quotient),
        Rounding::Ceiling if remainder.is_zero() => Ok(quotient),
        Rounding::Ceiling => quotient
            .checked_add(U256::one())
            .ok_or(MathError::Overflow),
    }
}

/// [`mul_div`] for `u128` operands and result.
pub fn mul_div_u128(a: u128, b: u128, denominator: u128, rounding: Rounding) -> MathResult<u128> {
    let result = mul_div(
        U256::from(a),
        U256::from(b),
        U256::from(denominator),
        rounding,
    )?;
    to_u128(result)
}

/// Divides rounding up.
pub fn div_rounding_up(a: U256, b: U256) -> MathResult<U256> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let (quotient, remainder) = a.div_mod(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::one()).ok_or(MathError::Overflow)
    }
}

/// Narrows a 256-bit value to `u128`.
pub fn to_u128(value: U256) -> MathResult<u128> {
    if value.bits() > 128 {
        return Err(MathError::Overflow);
    }
    Ok(value.low_u128())
}
