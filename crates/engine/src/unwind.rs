//! Pulling assets back out of the venues into idle.
//!
//! These helpers only move assets and report what came back. Callers decide how the
//! recovered gain is charged, so the fee is still accrued once per operation.

use crate::error::VaultResult;
use crate::ledger;
use crate::state::VaultState;
use crate::valuation;
use crate::venues::{Venue, Venues};
use range_vault_domain::error::MathError;
use range_vault_domain::math::full_math::{Rounding, mul_div_u128};
use range_vault_domain::token::{Asset, TokenPair};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Amounts recovered from a venue and the part of them that was gain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recovery {
    pub recovered: TokenPair,
    pub gain: TokenPair,
}

/// Outcome of an emergency unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwindReport {
    pub venue: Venue,
    pub recovered: TokenPair,
    pub fee: TokenPair,
}

/// Closes all range liquidity and collects every owed amount into idle.
pub fn close_range(state: &mut VaultState, venues: &mut Venues) -> VaultResult<Recovery> {
    let range = state.range;
    let position = venues.pool.position(range.lower, range.upper)?;
    let principal = if position.liquidity > 0 {
        venues
            .pool
            .close_position(range.lower, range.upper, position.liquidity)?
    } else {
        TokenPair::ZERO
    };
    let collected =
        venues
            .pool
            .collect_owed(range.lower, range.upper, TokenPair::new(u128::MAX, u128::MAX))?;
    state.credit_idle(collected)?;

    let gain = collected.saturating_sub(principal);
    debug!(
        liquidity = position.liquidity,
        collected_a = collected.a,
        collected_b = collected.b,
        gain_a = gain.a,
        gain_b = gain.b,
        "Closed range position"
    );
    Ok(Recovery {
        recovered: collected,
        gain,
    })
}

/// Redeems enough reserve shares to return at least `amount`, capped at everything held.
///
/// Returned assets are credited to idle and taken off the tracked principal.
pub fn redeem_amount(
    state: &mut VaultState,
    venues: &mut Venues,
    asset: Asset,
    amount: u128,
) -> VaultResult<u128> {
    let reserve = venues.reserve_mut(asset);
    let held = reserve.balance_of_shares(&state.address);
    let rate = reserve.exchange_rate();
    if amount == 0 || held == 0 || rate == 0 {
        return Ok(0);
    }

    let scale = 10u128
        .checked_pow(u32::from(reserve.decimals()))
        .ok_or(MathError::Overflow)?;
    let shares = mul_div_u128(amount, scale, rate, Rounding::Ceiling)?.min(held);
    let returned = reserve.withdraw(&state.address, shares)?;

    state.credit_idle_asset(asset, returned)?;
    let principal = state.reserve_deposited.get_mut(asset);
    *principal = principal.saturating_sub(returned);

    debug!(asset = %asset, requested = amount, shares, returned, "Redeemed from reserve");
    Ok(returned)
}

/// Redeems every reserve share held and zeroes the tracked principal.
pub fn redeem_all(state: &mut VaultState, venues: &mut Venues, asset: Asset) -> VaultResult<Recovery> {
    let held = venues.reserve(asset).balance_of_shares(&state.address);
    let principal = std::mem::take(state.reserve_deposited.get_mut(asset));

    let mut recovery = Recovery::default();
    if held == 0 {
        return Ok(recovery);
    }
    let returned = venues.reserve_mut(asset).withdraw(&state.address, held)?;
    state.credit_idle_asset(asset, returned)?;

    *recovery.recovered.get_mut(asset) = returned;
    *recovery.gain.get_mut(asset) = ledger::realized_gain(returned, principal);
    Ok(recovery)
}

/// Drains a single venue into idle and charges the fee on its gain.
///
/// The AMM range is kept with zero liquidity; a drained reserve keeps no principal.
pub fn emergency_unwind(
    state: &mut VaultState,
    venues: &mut Venues,
    venue: Venue,
) -> VaultResult<UnwindReport> {
    warn!(venue = ?venue, "Emergency unwind started");

    let recovery = match venue {
        Venue::Amm => close_range(state, venues)?,
        Venue::Reserve(asset) => redeem_all(state, venues, asset)?,
    };
    let fee_before = state.accrued_fee;
    ledger::accrue_fee(state, recovery.gain)?;
    let fee = state.accrued_fee - fee_before;

    info!(
        venue = ?venue,
        recovered_a = recovery.recovered.a,
        recovered_b = recovery.recovered.b,
        fee_a = fee.a,
        fee_b = fee.b,
        "Emergency unwind completed"
    );
    Ok(UnwindReport {
        venue,
        recovered: recovery.recovered,
        fee,
    })
}

/// Present value of both reserve holdings.
pub fn reserve_values(state: &VaultState, venues: &Venues) -> VaultResult<TokenPair> {
    Ok(TokenPair::new(
        valuation::reserve_value(venues.reserve(Asset::A), &state.address)?,
        valuation::reserve_value(venues.reserve(Asset::B), &state.address)?,
    ))
}
