//! Valuation of everything the vault holds across its venues.

use crate::error::VaultResult;
use crate::ledger;
use crate::state::VaultState;
use crate::venues::{AmmPool, Venues, YieldReserve};
use range_vault_domain::error::MathError;
use range_vault_domain::math::concentrated_liquidity::amounts_for_liquidity;
use range_vault_domain::math::full_math::{Rounding, mul_div_u128};
use range_vault_domain::token::{Address, Asset, TokenPair};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-venue breakdown of vault value. Every component excludes the protocol's share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    /// Amounts redeemable from the range position at the current price.
    pub position: TokenPair,
    /// Uncollected owed fees net of the protocol fee.
    pub owed_fees: TokenPair,
    /// Redeemable reserve value net of the fee on unrealized gain.
    pub reserves: TokenPair,
    /// Idle balances net of accrued fees.
    pub idle: TokenPair,
}

impl Valuation {
    pub fn total(&self) -> VaultResult<TokenPair> {
        let total = self
            .position
            .checked_add(self.owed_fees)
            .and_then(|sum| sum.checked_add(self.reserves))
            .and_then(|sum| sum.checked_add(self.idle))
            .ok_or(MathError::Overflow)?;
        Ok(total)
    }
}

/// Forces the pool to refresh owed fees on the current range.
pub fn poke(state: &VaultState, pool: &mut dyn AmmPool) -> VaultResult<()> {
    let range = state.range;
    let position = pool.position(range.lower, range.upper)?;
    if position.liquidity == 0 {
        return Ok(());
    }
    pool.close_position(range.lower, range.upper, 0)?;
    debug!(lower = range.lower, upper = range.upper, "Poked range position");
    Ok(())
}

/// Present redeemable value of `holder`'s reserve shares, rounded down.
pub fn reserve_value(reserve: &dyn YieldReserve, holder: &Address) -> VaultResult<u128> {
    let shares = reserve.balance_of_shares(holder);
    if shares == 0 {
        return Ok(0);
    }
    let scale = 10u128
        .checked_pow(u32::from(reserve.decimals()))
        .ok_or(MathError::Overflow)?;
    Ok(mul_div_u128(shares, reserve.exchange_rate(), scale, Rounding::Floor)?)
}

/// Values every holding of the vault. Reads only; nothing is mutated.
pub fn value(state: &VaultState, venues: &Venues) -> VaultResult<Valuation> {
    let rate = state.config.protocol_fee_rate;
    let range = state.range;

    let info = venues.pool.position(range.lower, range.upper)?;
    let position = if info.liquidity == 0 {
        TokenPair::ZERO
    } else {
        let price = venues.pool.current_price()?;
        let (sqrt_lower, sqrt_upper) = range.sqrt_bounds()?;
        amounts_for_liquidity(
            price.x96(),
            sqrt_lower,
            sqrt_upper,
            info.liquidity,
            Rounding::Floor,
        )?
    };

    let owed_fees = TokenPair::new(
        ledger::net_of_fee(rate, info.owed.a, 0)?,
        ledger::net_of_fee(rate, info.owed.b, 0)?,
    );

    let mut reserves = TokenPair::ZERO;
    for asset in [Asset::A, Asset::B] {
        let value = reserve_value(venues.reserve(asset), &state.address)?;
        *reserves.get_mut(asset) =
            ledger::net_of_fee(rate, value, state.reserve_deposited.get(asset))?;
    }

    Ok(Valuation {
        position,
        owed_fees,
        reserves,
        idle: state.idle_net(),
    })
}

/// Total value per asset.
pub fn total_value(state: &VaultState, venues: &Venues) -> VaultResult<TokenPair> {
    value(state, venues)?.total()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valuation_total_sums_components() {
        let valuation = Valuation {
            position: TokenPair::new(100, 200),
            owed_fees: TokenPair::new(1, 2),
            reserves: TokenPair::new(10, 0),
            idle: TokenPair::new(5, 5),
        };
        assert_eq!(valuation.total().unwrap(), TokenPair::new(116, 207));
    }

    #[test]
    fn test_valuation_total_overflow() {
        let valuation = Valuation {
            position: TokenPair::new(u128::MAX, 0),
            idle: TokenPair::new(1, 0),
            ..Valuation::default()
        };
        assert!(valuation.total().is_err());
    }
}
