//! Operational knobs of a vault.

use crate::error::{VaultError, VaultResult};
use range_vault_domain::token::TokenPair;
use range_vault_domain::value_objects::Percentage;
use serde::{Deserialize, Serialize};

/// Configuration of the fee ledger, supply cap and rebalance thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Share of realized gains taken as protocol fee.
    pub protocol_fee_rate: Percentage,
    /// Upper bound on total shares outstanding.
    pub max_total_supply: u128,
    /// Value imbalance, as a fraction of total value, left unswapped on rebalance.
    pub excess_ignore_band: Percentage,
    /// Idle balance at or below which nothing is swept into a reserve.
    pub reserve_deposit_threshold: TokenPair,
    /// Extra fraction pulled from a reserve on top of a shortfall.
    pub withdrawal_buffer: Percentage,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            protocol_fee_rate: Percentage::ZERO,
            max_total_supply: u128::MAX,
            excess_ignore_band: Percentage::ZERO,
            reserve_deposit_threshold: TokenPair::ZERO,
            withdrawal_buffer: Percentage::ZERO,
        }
    }
}

impl VaultConfig {
    /// Sets the protocol fee rate.
    #[must_use]
    pub fn with_protocol_fee_rate(mut self, rate: Percentage) -> Self {
        self.protocol_fee_rate = rate;
        self
    }

    /// Sets the share supply cap.
    #[must_use]
    pub fn with_max_total_supply(mut self, max_total_supply: u128) -> Self {
        self.max_total_supply = max_total_supply;
        self
    }

    /// Sets the excess-ignore band.
    #[must_use]
    pub fn with_excess_ignore_band(mut self, band: Percentage) -> Self {
        self.excess_ignore_band = band;
        self
    }

    /// Sets the per-asset reserve deposit thresholds.
    #[must_use]
    pub fn with_reserve_deposit_threshold(mut self, threshold: TokenPair) -> Self {
        self.reserve_deposit_threshold = threshold;
        self
    }

    /// Sets the withdrawal buffer.
    #[must_use]
    pub fn with_withdrawal_buffer(mut self, buffer: Percentage) -> Self {
        self.withdrawal_buffer = buffer;
        self
    }

    /// Checks the configuration for values the engine cannot operate with.
    pub fn validate(&self) -> VaultResult<()> {
        if self.max_total_supply == 0 {
            return Err(VaultError::InvalidConfig(
                "max_total_supply must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
