use crate::error::{MathError, MathResult};
use crate::math::full_math::{Rounding, div_rounding_up, mul_div, to_u128};
use crate::math::tick_math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO, Q96};
use crate::token::TokenPair;
use primitive_types::U256;

fn ordered(sqrt_price_a: U256, sqrt_price_b: U256) -> MathResult<(U256, U256)> {
    let (lower, upper) = if sqrt_price_a < sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    };
    if lower.is_zero() {
        return Err(MathError::SqrtPriceOutOfBounds);
    }
    Ok((lower, upper))
}

/// Calculates the amount of token A covered by `liquidity` between two sqrt prices.
/// delta_a = L * (1/sqrt(P_a) - 1/sqrt(P_b))
pub fn amount_a_delta(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    rounding: Rounding,
) -> MathResult<u128> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b)?;

    // L * (upper - lower) / (lower * upper), with L lifted to Q96
    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = upper - lower;

    let amount = match rounding {
        Rounding::Floor => mul_div(numerator1, numerator2, upper, Rounding::Floor)? / lower,
        Rounding::Ceiling => div_rounding_up(
            mul_div(numerator1, numerator2, upper, Rounding::Ceiling)?,
            lower,
        )?,
    };
    to_u128(amount)
}

/// Calculates the amount of token B covered by `liquidity` between two sqrt prices.
/// delta_b = L * (sqrt(P_b) - sqrt(P_a))
pub fn amount_b_delta(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    rounding: Rounding,
) -> MathResult<u128> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b)?;
    to_u128(mul_div(U256::from(liquidity), upper - lower, Q96, rounding)?)
}

/// Token amounts represented by `liquidity` in `[sqrt_lower, sqrt_upper]` at `sqrt_price`.
///
/// Below the range the position is all token A, above it all token B.
pub fn amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_lower: U256,
    sqrt_upper: U256,
    liquidity: u128,
    rounding: Rounding,
) -> MathResult<TokenPair> {
    if sqrt_lower >= sqrt_upper {
        return Err(MathError::InvalidRange);
    }
    if liquidity == 0 {
        return Ok(TokenPair::ZERO);
    }

    if sqrt_price <= sqrt_lower {
        let a = amount_a_delta(sqrt_lower, sqrt_upper, liquidity, rounding)?;
        Ok(TokenPair::new(a, 0))
    } else if sqrt_price < sqrt_upper {
        let a = amount_a_delta(sqrt_price, sqrt_upper, liquidity, rounding)?;
        let b = amount_b_delta(sqrt_lower, sqrt_price, liquidity, rounding)?;
        Ok(TokenPair::new(a, b))
    } else {
        let b = amount_b_delta(sqrt_lower, sqrt_upper, liquidity, rounding)?;
        Ok(TokenPair::new(0, b))
    }
}

/// Calculates liquidity for a given amount of token A and price range.
/// L = amount_a * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn liquidity_for_amount_a(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    amount_a: u128,
) -> MathResult<u128> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b)?;
    if lower == upper {
        return Err(MathError::InvalidRange);
    }
    let intermediate = mul_div(lower, upper, Q96, Rounding::Floor)?;
    to_u128(mul_div(
        U256::from(amount_a),
        intermediate,
        upper - lower,
        Rounding::Floor,
    )?)
}

/// Calculates liquidity for a given amount of token B and price range.
/// L = amount_b / (sqrt(P_b) - sqrt(P_a))
pub fn liquidity_for_amount_b(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    amount_b: u128,
) -> MathResult<u128> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b)?;
    if lower == upper {
        return Err(MathError::InvalidRange);
    }
    to_u128(mul_div(
        U256::from(amount_b),
        Q96,
        upper - lower,
        Rounding::Floor,
    )?)
}

/// Largest liquidity that `amount_a` and `amount_b` can both fund in the range.
pub fn liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_lower: U256,
    sqrt_upper: U256,
    amount_a: u128,
    amount_b: u128,
) -> MathResult<u128> {
    if sqrt_lower >= sqrt_upper {
        return Err(MathError::InvalidRange);
    }

    if sqrt_price <= sqrt_lower {
        liquidity_for_amount_a(sqrt_lower, sqrt_upper, amount_a)
    } else if sqrt_price < sqrt_upper {
        let from_a = liquidity_for_amount_a(sqrt_price, sqrt_upper, amount_a)?;
        let from_b = liquidity_for_amount_b(sqrt_lower, sqrt_price, amount_b)?;
        Ok(from_a.min(from_b))
    } else {
        liquidity_for_amount_b(sqrt_lower, sqrt_upper, amount_b)
    }
}

/// Liquidity `amount_a` funds on its own over `[sqrt_price, MAX_SQRT_RATIO]`.
pub fn single_sided_liquidity_a(sqrt_price: U256, amount_a: u128) -> MathResult<u128> {
    liquidity_for_amount_a(sqrt_price, MAX_SQRT_RATIO, amount_a)
}

/// Liquidity `amount_b` funds on its own over `[MIN_SQRT_RATIO, sqrt_price]`.
pub fn single_sided_liquidity_b(sqrt_price: U256, amount_b: u128) -> MathResult<u128> {
    liquidity_for_amount_b(MIN_SQRT_RATIO, sqrt_price, amount_b)
}

/// Upper sqrt price at which `liquidity` above `sqrt_price` consumes exactly `amount_a`.
/// 1/sqrt(P_u) = 1/sqrt(P) - amount_a / L
///
/// Returns `None` when the amount would fund an unbounded range.
pub fn sqrt_upper_for_amount_a(
    sqrt_price: U256,
    liquidity: u128,
    amount_a: u128,
) -> MathResult<Option<U256>> {
    if liquidity == 0 {
        return Err(MathError::DivisionByZero);
    }
    let liquidity = U256::from(liquidity);
    let consumed = mul_div(U256::from(amount_a), sqrt_price, Q96, Rounding::Ceiling)?;
    if consumed >= liquidity {
        return Ok(None);
    }
    let upper = mul_div(liquidity, sqrt_price, liquidity - consumed, Rounding::Floor)?;
    Ok((upper <= MAX_SQRT_RATIO).then_some(upper))
}

/// Lower sqrt price at which `liquidity` below `sqrt_price` consumes exactly `amount_b`.
/// sqrt(P_l) = sqrt(P) - amount_b / L
///
/// Returns `None` when the amount would fund an unbounded range.
pub fn sqrt_lower_for_amount_b(
    sqrt_price: U256,
    liquidity: u128,
    amount_b: u128,
) -> MathResult<Option<U256>> {
    if liquidity == 0 {
        return Err(MathError::DivisionByZero);
    }
    let drop = mul_div(
        U256::from(amount_b),
        Q96,
        U256::from(liquidity),
        Rounding::Ceiling,
    )?;
    if drop >= sqrt_price {
        return Ok(None);
    }
    let lower = sqrt_price - drop;
    Ok((lower >= MIN_SQRT_RATIO).then_some(lower))
}
