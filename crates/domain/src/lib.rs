//! Domain types and fixed-point math for the range vault.
//!
//! This crate holds everything that is pure computation:
//! - 256-bit multiply/divide with explicit rounding
//! - Tick and Q64.96 sqrt-price conversions
//! - Concentrated-liquidity amount and liquidity geometry
//! - Value objects shared by the engine and its collaborators

/// Math error type.
pub mod error;
/// Fixed-point and concentrated-liquidity math.
pub mod math;
/// Token identities, addresses and amount pairs.
pub mod token;
/// Value objects (prices, percentages).
pub mod value_objects;

/// Prelude module for convenient imports.
pub mod prelude;

pub use error::{MathError, MathResult};
