//! The vault aggregate every operation mutates.

use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult, VenueError};
use range_vault_domain::error::MathError;
use range_vault_domain::math::tick_math::sqrt_ratio_at_tick;
use range_vault_domain::token::{Address, Asset, Token, TokenPair};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Tick bounds of the AMM range position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }

    /// Ordered, inside `bounds`, and on the `spacing` grid.
    pub fn validate(&self, spacing: i32, bounds: (i32, i32)) -> VaultResult<()> {
        let invalid = |reason| VaultError::InvalidRange {
            lower: self.lower,
            upper: self.upper,
            reason,
        };

        if spacing <= 0 {
            return Err(invalid("tick spacing must be positive"));
        }
        if self.lower >= self.upper {
            return Err(invalid("lower bound must be below upper bound"));
        }
        if self.lower < bounds.0 || self.upper > bounds.1 {
            return Err(invalid("bound outside the global tick range"));
        }
        if self.lower % spacing != 0 || self.upper % spacing != 0 {
            return Err(invalid("bound not on the tick spacing grid"));
        }
        Ok(())
    }

    pub fn sqrt_bounds(&self) -> Result<(U256, U256), MathError> {
        Ok((sqrt_ratio_at_tick(self.lower)?, sqrt_ratio_at_tick(self.upper)?))
    }
}

/// Everything the vault itself remembers between operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultState {
    pub token_a: Token,
    pub token_b: Token,
    /// Holder address of the vault at every venue.
    pub address: Address,
    pub governance: Address,
    pub rebalancer: Address,
    pub range: TickRange,
    /// Principal believed deposited in each reserve.
    pub reserve_deposited: TokenPair,
    /// Protocol fee owed and not yet swept. Backed by `idle`.
    pub accrued_fee: TokenPair,
    /// Balances custodied by the vault, accrued fees included.
    pub idle: TokenPair,
    pub config: VaultConfig,
}

impl VaultState {
    /// Idle balances that belong to shareholders.
    pub fn idle_net(&self) -> TokenPair {
        self.idle.saturating_sub(self.accrued_fee)
    }

    pub fn credit_idle(&mut self, amounts: TokenPair) -> VaultResult<()> {
        self.idle = self
            .idle
            .checked_add(amounts)
            .ok_or(VaultError::Math(MathError::Overflow))?;
        Ok(())
    }

    pub fn credit_idle_asset(&mut self, asset: Asset, amount: u128) -> VaultResult<()> {
        let mut amounts = TokenPair::ZERO;
        *amounts.get_mut(asset) = amount;
        self.credit_idle(amounts)
    }

    /// Removes `amount` from the shareholders' idle balance.
    pub fn debit_idle(&mut self, asset: Asset, amount: u128) -> VaultResult<()> {
        let available = self.idle_net().get(asset);
        if amount > available {
            return Err(VenueError::InsufficientBalance {
                asset,
                requested: amount,
                available,
            }
            .into());
        }
        *self.idle.get_mut(asset) -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use range_vault_domain::math::tick_math::{MAX_TICK, MIN_TICK};

    fn state() -> VaultState {
        VaultState {
            token_a: Token::new("mint-a", "AAA", 9, "Asset A"),
            token_b: Token::new("mint-b", "BBB", 6, "Asset B"),
            address: Address::from("vault"),
            governance: Address::from("gov"),
            rebalancer: Address::from("keeper"),
            range: TickRange::new(-600, 600),
            reserve_deposited: TokenPair::ZERO,
            accrued_fee: TokenPair::new(10, 0),
            idle: TokenPair::new(100, 50),
            config: VaultConfig::default(),
        }
    }

    #[test]
    fn test_range_validation() {
        let bounds = (MIN_TICK, MAX_TICK);
        assert!(TickRange::new(-600, 600).validate(60, bounds).is_ok());
        assert!(TickRange::new(600, 600).validate(60, bounds).is_err());
        assert!(TickRange::new(-610, 600).validate(60, bounds).is_err());
        assert!(TickRange::new(-887_280, 600).validate(60, bounds).is_err());
    }

    #[test]
    fn test_idle_net_excludes_fees() {
        let s = state();
        assert_eq!(s.idle_net(), TokenPair::new(90, 50));
    }

    #[test]
    fn test_debit_idle_protects_fees() {
        let mut s = state();
        assert!(s.debit_idle(Asset::A, 91).is_err());
        s.debit_idle(Asset::A, 90).unwrap();
        assert_eq!(s.idle, TokenPair::new(10, 50));
    }
}
