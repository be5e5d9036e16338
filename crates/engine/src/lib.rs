//! Multi-venue liquidity accounting and rebalancing engine.
//!
//! This crate provides the vault that manages two assets across three places at once:
//! - A concentrated-liquidity range position in an AMM pool
//! - Two yield-bearing reserves, one per asset
//! - Idle balances held by the vault itself
//!
//! Users hold fungible shares of the aggregate. The engine prices deposits and withdrawals,
//! rebalances the venues, and charges a protocol fee on realized gains only.

/// Prelude module for convenient imports.
pub mod prelude;

/// Share accounting for deposits and withdrawals.
pub mod accounting;
/// Vault configuration.
pub mod config;
/// Error types.
pub mod error;
/// Vault events.
pub mod events;
/// Reentrancy and pause guards.
pub mod guard;
/// Fee and gain ledger.
pub mod ledger;
/// Rebalance controller.
pub mod rebalance;
/// Vault state aggregate.
pub mod state;
/// Draining venues back into idle.
pub mod unwind;
/// Valuation engine.
pub mod valuation;
/// The vault facade.
pub mod vault;
/// External collaborator interfaces.
pub mod venues;
