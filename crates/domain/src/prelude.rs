//! Prelude module for convenient imports.
//!
//! ```rust
//! use range_vault_domain::prelude::*;
//! ```

pub use crate::error::{MathError, MathResult};
pub use crate::math::concentrated_liquidity::{
    amounts_for_liquidity, liquidity_for_amounts, single_sided_liquidity_a,
    single_sided_liquidity_b,
};
pub use crate::math::full_math::{Rounding, mul_div, mul_div_u128};
pub use crate::math::tick_math::{
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, Q96, round_to_spacing,
    sqrt_ratio_at_tick, tick_at_sqrt_ratio, usable_tick_bounds,
};
pub use crate::token::{Address, Asset, SwapDirection, Token, TokenPair};
pub use crate::value_objects::percentage::Percentage;
pub use crate::value_objects::price::SqrtPrice;
