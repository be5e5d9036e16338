//! Prelude module for convenient imports.
//!
//! ```rust
//! use range_vault_simulation::prelude::*;
//! ```

pub use crate::journal::{Journaled, Shared};
pub use crate::market::{MarketConfig, SimulatedMarket};
pub use crate::price_path::{DeterministicPricePath, GeometricBrownianMotion, PricePathGenerator};
pub use crate::venues::{SimulatedPool, SimulatedReserve, SimulatedShareLedger, SimulatedWallets};
