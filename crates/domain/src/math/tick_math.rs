//! Tick ↔ sqrt-price conversions on the 1.0001 price grid.
//!
//! Prices are carried as `sqrt(price) * 2^96` in a 256-bit integer; no floating point is
//! involved anywhere, so a tick always maps to the same sqrt price.

use crate::error::{MathError, MathResult};
use primitive_types::U256;

/// Lowest tick the AMM accepts.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick the AMM accepts.
pub const MAX_TICK: i32 = 887_272;

/// 2^96, the fixed-point scale of sqrt prices.
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);

/// `sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256([4_295_128_739, 0, 0, 0]);
/// `sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 = U256([0x5d95_1d52_6398_8d26, 0xefd1_fc6a_5064_8849, 0xfffd_8963, 0]);

const ODD_TICK_RATIO: u128 = 0xfffcb933bd6fad37aa2d162d1a594001;

// sqrt(1.0001^-(2^i)) in Q128.128 for i = 1..=19.
const RATIO_MULTIPLIERS: [u128; 19] = [
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

/// Returns `sqrt(1.0001^tick) * 2^96`, rounded up.
pub fn sqrt_ratio_at_tick(tick: i32) -> MathResult<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfBounds(tick));
    }

    let abs_tick = tick.unsigned_abs();
    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(ODD_TICK_RATIO)
    } else {
        U256::one() << 128
    };

    for (bit, multiplier) in RATIO_MULTIPLIERS.iter().enumerate() {
        if abs_tick & (2u32 << bit) != 0 {
            ratio = (ratio * U256::from(*multiplier)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 down to Q64.96, rounding up so the result never undershoots the tick.
    let shifted = ratio >> 32;
    if (ratio & U256::from(u32::MAX)).is_zero() {
        Ok(shifted)
    } else {
        Ok(shifted + U256::one())
    }
}

/// Returns the greatest tick whose sqrt ratio is `<= sqrt_price`.
pub fn tick_at_sqrt_ratio(sqrt_price: U256) -> MathResult<i32> {
    if sqrt_price < MIN_SQRT_RATIO || sqrt_price > MAX_SQRT_RATIO {
        return Err(MathError::SqrtPriceOutOfBounds);
    }

    let (mut lo, mut hi) = (MIN_TICK, MAX_TICK);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if sqrt_ratio_at_tick(mid)? <= sqrt_price {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// Rounds a tick to the nearest multiple of `spacing`. Exact ties round down.
pub fn round_to_spacing(tick: i32, spacing: i32) -> i32 {
    let floor = tick.div_euclid(spacing) * spacing;
    let remainder = tick - floor;
    if remainder * 2 > spacing {
        floor + spacing
    } else {
        floor
    }
}

/// Outermost ticks on the `spacing` grid inside `bounds`.
pub fn usable_tick_bounds(spacing: i32, bounds: (i32, i32)) -> (i32, i32) {
    let lower = -(-bounds.0).div_euclid(spacing) * spacing;
    let upper = bounds.1.div_euclid(spacing) * spacing;
    (lower, upper)
}
