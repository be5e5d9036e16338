//! Fee and gain ledger.
//!
//! Gain is always what a venue returned beyond the principal tracked for it, floored at zero.
//! A venue below its principal contributes no gain and its loss is never netted against
//! another venue. The protocol fee is charged once per operation on the combined gain.

use crate::error::VaultResult;
use crate::state::VaultState;
use crate::venues::AssetTransfer;
use range_vault_domain::error::MathError;
use range_vault_domain::math::full_math::Rounding;
use range_vault_domain::token::{Address, Asset, TokenPair};
use range_vault_domain::value_objects::Percentage;
use tracing::{debug, info};

/// Amount recovered beyond `principal`, zero on a loss.
pub fn realized_gain(recovered: u128, principal: u128) -> u128 {
    recovered.saturating_sub(principal)
}

/// Protocol fee on `gain`, rounded down.
pub fn fee_on(rate: Percentage, gain: u128) -> VaultResult<u128> {
    if rate.is_zero() || gain == 0 {
        return Ok(0);
    }
    Ok(rate.apply(gain, Rounding::Floor)?)
}

/// Value of a venue holding net of the fee its unrealized gain would incur.
pub fn net_of_fee(rate: Percentage, value: u128, principal: u128) -> VaultResult<u128> {
    let fee = fee_on(rate, realized_gain(value, principal))?;
    Ok(value - fee)
}

/// Charges the protocol fee on `gain`, adds it to `accrued_fee`, and returns the net gain.
///
/// Callers must already hold the gain in idle so the accrued fee stays backed.
pub fn accrue_fee(state: &mut VaultState, gain: TokenPair) -> VaultResult<TokenPair> {
    let rate = state.config.protocol_fee_rate;
    let fee = TokenPair::new(fee_on(rate, gain.a)?, fee_on(rate, gain.b)?);

    state.accrued_fee = state
        .accrued_fee
        .checked_add(fee)
        .ok_or(MathError::Overflow)?;

    if !fee.is_zero() {
        debug!(
            gain_a = gain.a,
            gain_b = gain.b,
            fee_a = fee.a,
            fee_b = fee.b,
            "Accrued protocol fee"
        );
    }

    Ok(gain - fee)
}

/// Pays every accrued fee to `to` and zeroes the ledger.
pub fn sweep_fees(
    state: &mut VaultState,
    transfers: &mut dyn AssetTransfer,
    to: &Address,
) -> VaultResult<TokenPair> {
    let amounts = state.accrued_fee;
    for asset in [Asset::A, Asset::B] {
        let amount = amounts.get(asset);
        if amount == 0 {
            continue;
        }
        let remaining = state
            .idle
            .get(asset)
            .checked_sub(amount)
            .ok_or(MathError::Overflow)?;
        transfers.push(asset, to, amount)?;
        *state.idle.get_mut(asset) = remaining;
    }
    state.accrued_fee = TokenPair::ZERO;

    info!(to = %to, fee_a = amounts.a, fee_b = amounts.b, "Swept protocol fees");
    Ok(amounts)
}
