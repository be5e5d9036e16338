use super::{check_minimums, check_recipient};
use crate::error::{VaultError, VaultResult};
use crate::ledger;
use crate::state::VaultState;
use crate::venues::Venues;
use range_vault_domain::error::MathError;
use range_vault_domain::math::full_math::{Rounding, mul_div_u128};
use range_vault_domain::token::{Address, Asset, TokenPair};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of a completed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    pub shares: u128,
    pub amounts: TokenPair,
    /// Protocol fee accrued on the gain realized by this withdrawal.
    pub fee: TokenPair,
    pub total_supply: u128,
}

/// Pro-rata slice of vault holdings owned by `shares` out of `supply`.
struct Portion {
    shares: u128,
    supply: u128,
}

impl Portion {
    fn is_full(&self) -> bool {
        self.shares == self.supply
    }

    fn of(&self, amount: u128) -> VaultResult<u128> {
        if self.is_full() {
            return Ok(amount);
        }
        Ok(mul_div_u128(amount, self.shares, self.supply, Rounding::Floor)?)
    }

    fn of_pair(&self, amounts: TokenPair) -> VaultResult<TokenPair> {
        Ok(TokenPair::new(self.of(amounts.a)?, self.of(amounts.b)?))
    }
}

pub(crate) fn withdraw(
    state: &mut VaultState,
    venues: &mut Venues,
    caller: &Address,
    shares: u128,
    minimum: TokenPair,
    recipient: &Address,
) -> VaultResult<WithdrawReceipt> {
    if shares == 0 {
        return Err(VaultError::ZeroAmount);
    }
    check_recipient(state, recipient)?;

    let balance = venues.shares.balance_of(caller);
    if shares > balance {
        return Err(VaultError::InsufficientShares {
            requested: shares,
            balance,
        });
    }

    let portion = Portion {
        shares,
        supply: venues.shares.total_supply(),
    };
    venues.shares.burn(caller, shares)?;

    let idle_share = portion.of_pair(state.idle_net())?;

    // AMM: the closed liquidity is principal, anything collected beyond it is fee gain.
    let range = state.range;
    let position = venues.pool.position(range.lower, range.upper)?;
    let liquidity = portion.of(position.liquidity)?;
    let amm_principal = if liquidity > 0 {
        venues
            .pool
            .close_position(range.lower, range.upper, liquidity)?
    } else {
        TokenPair::ZERO
    };
    let collected =
        venues
            .pool
            .collect_owed(range.lower, range.upper, TokenPair::new(u128::MAX, u128::MAX))?;
    state.credit_idle(collected)?;
    let amm_gain = collected.saturating_sub(amm_principal);

    let mut reserve_principal = TokenPair::ZERO;
    let mut reserve_gain = TokenPair::ZERO;
    for asset in [Asset::A, Asset::B] {
        let principal = portion.of(state.reserve_deposited.get(asset))?;
        *state.reserve_deposited.get_mut(asset) -= principal;

        let held = venues.reserve(asset).balance_of_shares(&state.address);
        let redeem = portion.of(held)?;
        if redeem == 0 {
            continue;
        }
        let returned = venues
            .reserve_mut(asset)
            .withdraw(&state.address, redeem)?;
        state.credit_idle_asset(asset, returned)?;

        let gain = ledger::realized_gain(returned, principal);
        *reserve_principal.get_mut(asset) = returned - gain;
        *reserve_gain.get_mut(asset) = gain;
        debug!(asset = %asset, redeem, returned, gain, "Redeemed reserve share");
    }

    let total_gain = amm_gain
        .checked_add(reserve_gain)
        .ok_or(MathError::Overflow)?;
    let fee_before = state.accrued_fee;
    let net_gain = ledger::accrue_fee(state, total_gain)?;
    let fee = state.accrued_fee - fee_before;

    // The withdrawer owns its pro-rata of the AMM fees and all of the reserve gain it redeemed.
    let entitled = portion
        .of_pair(amm_gain)?
        .checked_add(reserve_gain)
        .ok_or(MathError::Overflow)?;
    let mut gain_share = TokenPair::ZERO;
    for asset in [Asset::A, Asset::B] {
        let total = total_gain.get(asset);
        if total == 0 {
            continue;
        }
        *gain_share.get_mut(asset) = if portion.is_full() {
            net_gain.get(asset)
        } else {
            mul_div_u128(
                net_gain.get(asset),
                entitled.get(asset),
                total,
                Rounding::Floor,
            )?
        };
    }

    let amounts = idle_share
        .checked_add(amm_principal)
        .and_then(|sum| sum.checked_add(reserve_principal))
        .and_then(|sum| sum.checked_add(gain_share))
        .ok_or(MathError::Overflow)?;
    check_minimums(amounts, minimum)?;

    for asset in [Asset::A, Asset::B] {
        let amount = amounts.get(asset);
        if amount == 0 {
            continue;
        }
        state.debit_idle(asset, amount)?;
        venues.transfers.push(asset, recipient, amount)?;
    }

    let total_supply = portion.supply - shares;
    info!(
        owner = %caller,
        recipient = %recipient,
        shares,
        amount_a = amounts.a,
        amount_b = amounts.b,
        fee_a = fee.a,
        fee_b = fee.b,
        "Withdraw completed"
    );

    Ok(WithdrawReceipt {
        shares,
        amounts,
        fee,
        total_supply,
    })
}
