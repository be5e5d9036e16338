//! A complete simulated market for one vault.

use crate::venues::{SimulatedPool, SimulatedReserve, SimulatedShareLedger, SimulatedWallets};
use range_vault_domain::error::MathResult;
use range_vault_domain::token::Asset;
use range_vault_domain::value_objects::{Percentage, SqrtPrice};
use range_vault_engine::venues::Venues;
use serde::{Deserialize, Serialize};

/// Parameters of a simulated market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Starting pool tick.
    pub initial_tick: i32,
    /// Pool tick spacing.
    pub tick_spacing: i32,
    /// Pool swap fee in basis points.
    pub fee_bps: u32,
    /// Full-range liquidity provided by others.
    pub base_liquidity: u128,
    /// Decimals of both reserves' exchange rates.
    pub reserve_decimals: u8,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            initial_tick: 0,
            tick_spacing: 60,
            fee_bps: 30,
            base_liquidity: 1_000_000_000_000,
            reserve_decimals: 6,
        }
    }
}

/// Handles to every simulated venue. Clones of the handles share state with the vault.
#[derive(Clone)]
pub struct SimulatedMarket {
    pub pool: SimulatedPool,
    pub reserve_a: SimulatedReserve,
    pub reserve_b: SimulatedReserve,
    pub shares: SimulatedShareLedger,
    pub wallets: SimulatedWallets,
}

impl SimulatedMarket {
    pub fn new(config: &MarketConfig) -> MathResult<Self> {
        let price = SqrtPrice::from_tick(config.initial_tick)?;
        let fee_rate = Percentage::from_bps(config.fee_bps)?;
        Ok(Self {
            pool: SimulatedPool::new(
                price,
                fee_rate,
                config.tick_spacing,
                config.base_liquidity,
            ),
            reserve_a: SimulatedReserve::new(Asset::A, config.reserve_decimals),
            reserve_b: SimulatedReserve::new(Asset::B, config.reserve_decimals),
            shares: SimulatedShareLedger::new(),
            wallets: SimulatedWallets::new(),
        })
    }

    /// Venue bundle for a vault, sharing state with these handles.
    pub fn venues(&self) -> Venues {
        Venues {
            pool: Box::new(self.pool.clone()),
            reserve_a: Box::new(self.reserve_a.clone()),
            reserve_b: Box::new(self.reserve_b.clone()),
            shares: Box::new(self.shares.clone()),
            transfers: Box::new(self.wallets.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_vault_domain::token::{Address, TokenPair};
    use range_vault_engine::venues::YieldReserve;

    #[test]
    fn test_venues_share_state_with_handles() {
        let market = SimulatedMarket::new(&MarketConfig::default()).unwrap();
        let mut venues = market.venues();
        let vault = Address::from("vault");

        venues.reserve_a.deposit(&vault, 500).unwrap();
        assert_eq!(market.reserve_a.balance_of_shares(&vault), 500);

        market.wallets.fund(&vault, TokenPair::new(1, 2));
        assert_eq!(market.wallets.balance(&vault), TokenPair::new(1, 2));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: MarketConfig = serde_json::from_str(r#"{ "fee_bps": 5 }"#).unwrap();
        assert_eq!(config.fee_bps, 5);
        assert_eq!(config.tick_spacing, 60);
    }
}
