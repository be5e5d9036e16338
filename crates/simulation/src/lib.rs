//! Simulated venues for the range vault.
//!
//! This crate provides in-memory stand-ins for everything the vault drives:
//! - A concentrated-liquidity pool with swap fees
//! - Exchange-rate yield reserves
//! - A share ledger and user wallets
//! - Price paths for external trading
//!
//! Every venue journals its state so vault operations stay atomic.

/// Prelude module for convenient imports.
pub mod prelude;

/// Snapshot journaling.
pub mod journal;
/// Market assembly.
pub mod market;
/// Price path generators.
pub mod price_path;
/// Simulated venues.
pub mod venues;
