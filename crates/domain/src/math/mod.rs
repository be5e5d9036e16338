/// Concentrated-liquidity amount and liquidity geometry.
pub mod concentrated_liquidity;
/// 256-bit multiply/divide with explicit rounding.
pub mod full_math;
/// Tick to sqrt-price conversions and tick grid helpers.
pub mod tick_math;
