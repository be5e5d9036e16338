//! Rebalance controller.
//!
//! A rebalance runs in strict order: unwind every venue, swap toward equal value, size a new
//! range around the post-swap price, deploy the target amounts to it and sweep the rest
//! into the reserves.

use crate::error::{VaultError, VaultResult, VenueError};
use crate::ledger;
use crate::state::{TickRange, VaultState};
use crate::unwind;
use crate::venues::{IdleSettlement, SwapDelta, Venues};
use primitive_types::U256;
use range_vault_domain::error::MathError;
use range_vault_domain::math::concentrated_liquidity::{
    amounts_for_liquidity, liquidity_for_amounts, single_sided_liquidity_a,
    single_sided_liquidity_b, sqrt_lower_for_amount_b, sqrt_upper_for_amount_a,
};
use range_vault_domain::math::full_math::{Rounding, mul_div_u128};
use range_vault_domain::math::tick_math::{
    MAX_SQRT_RATIO, MIN_SQRT_RATIO, round_to_spacing, tick_at_sqrt_ratio, usable_tick_bounds,
};
use range_vault_domain::token::{Asset, SwapDirection, TokenPair};
use range_vault_domain::value_objects::SqrtPrice;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The current tick must sit at least `width / RANGE_SANITY_DIVISOR` away from each global bound.
pub const RANGE_SANITY_DIVISOR: i32 = 8;

/// Outcome of a completed rebalance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub previous_range: TickRange,
    pub range: TickRange,
    /// Liquidity deployed to `range`.
    pub liquidity: u128,
    /// Amounts paid into the range position.
    pub deployed: TokenPair,
    pub swap: Option<SwapDelta>,
    /// Amounts redeemed from the reserves to cover shortfalls.
    pub reserve_withdrawals: TokenPair,
    /// Amounts swept into the reserves.
    pub reserve_deposits: TokenPair,
    /// Protocol fee accrued on the gains realized by the unwind.
    pub fee: TokenPair,
}

/// Range and amounts chosen for the AMM allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePlan {
    pub range: TickRange,
    /// Amounts meant for the range position.
    pub target: TokenPair,
}

pub(crate) fn rebalance(
    state: &mut VaultState,
    venues: &mut Venues,
    amm_share: u8,
) -> VaultResult<RebalanceReport> {
    if amm_share > 100 {
        return Err(VaultError::InvalidAmmShare(amm_share));
    }
    let previous_range = state.range;
    let mut withdrawals = TokenPair::ZERO;

    let fee = unwind_all(state, venues, &mut withdrawals)?;
    let swap = balance_value(state, venues, &mut withdrawals)?;

    let price = venues.pool.current_price()?;
    let available = available(state, venues)?;
    let plan = plan_range(
        price,
        available,
        amm_share,
        venues.pool.tick_spacing(),
        venues.pool.tick_bounds(),
    )?;

    let (liquidity, deployed) = match plan {
        Some(plan) => deploy(state, venues, price, plan, &mut withdrawals)?,
        None => {
            debug!(amm_share, "No range allocation, keeping previous range empty");
            (0, TokenPair::ZERO)
        }
    };

    let reserve_deposits = sweep_to_reserves(state, venues)?;

    info!(
        previous_lower = previous_range.lower,
        previous_upper = previous_range.upper,
        lower = state.range.lower,
        upper = state.range.upper,
        liquidity,
        deployed_a = deployed.a,
        deployed_b = deployed.b,
        swapped = swap.is_some(),
        "Rebalance completed"
    );

    Ok(RebalanceReport {
        previous_range,
        range: state.range,
        liquidity,
        deployed,
        swap,
        reserve_withdrawals: withdrawals,
        reserve_deposits,
        fee,
    })
}

/// Closes the range, charges the fee on every gain, and re-bases reserve principal.
fn unwind_all(
    state: &mut VaultState,
    venues: &mut Venues,
    withdrawals: &mut TokenPair,
) -> VaultResult<TokenPair> {
    let amm = unwind::close_range(state, venues)?;

    let values = unwind::reserve_values(state, venues)?;
    let reserve_gain = TokenPair::new(
        ledger::realized_gain(values.a, state.reserve_deposited.a),
        ledger::realized_gain(values.b, state.reserve_deposited.b),
    );

    let gain = amm
        .gain
        .checked_add(reserve_gain)
        .ok_or(MathError::Overflow)?;
    let fee_before = state.accrued_fee;
    ledger::accrue_fee(state, gain)?;
    let fee = state.accrued_fee - fee_before;

    for asset in [Asset::A, Asset::B] {
        // Accrued fees must be held idle.
        let shortfall = state
            .accrued_fee
            .get(asset)
            .saturating_sub(state.idle.get(asset));
        if shortfall > 0 {
            *withdrawals.get_mut(asset) += unwind::redeem_amount(state, venues, asset, shortfall)?;
        }
        if reserve_gain.get(asset) > 0 {
            *state.reserve_deposited.get_mut(asset) =
                unwind::reserve_values(state, venues)?.get(asset);
        }
    }

    Ok(fee)
}

/// Idle net of fees plus what the reserves would return.
fn available(state: &VaultState, venues: &Venues) -> VaultResult<TokenPair> {
    let available = state
        .idle_net()
        .checked_add(unwind::reserve_values(state, venues)?)
        .ok_or(MathError::Overflow)?;
    Ok(available)
}

/// Swaps once from the heavier asset when the value imbalance exceeds the band.
fn balance_value(
    state: &mut VaultState,
    venues: &mut Venues,
    withdrawals: &mut TokenPair,
) -> VaultResult<Option<SwapDelta>> {
    let price = venues.pool.current_price()?;
    let available = available(state, venues)?;

    let value_a = price.quote_a_in_b(available.a, Rounding::Floor)?;
    let value_b = available.b;
    let total = value_a.checked_add(value_b).ok_or(MathError::Overflow)?;
    let band = state.config.excess_ignore_band.apply(total, Rounding::Floor)?;

    let (heavy, excess) = if value_a > value_b {
        (Asset::A, value_a - value_b)
    } else {
        (Asset::B, value_b - value_a)
    };
    if excess == 0 || excess <= band {
        debug!(excess, band, "Value imbalance inside band");
        return Ok(None);
    }

    let excess_units = match heavy {
        Asset::A => price.quote_b_in_a(excess, Rounding::Floor)?,
        Asset::B => excess,
    };
    let amount = (venues
        .pool
        .fee_rate()
        .divide_by_complement(excess_units, Rounding::Floor)?
        / 2)
    .min(available.get(heavy));
    if amount == 0 {
        return Ok(None);
    }

    let idle = state.idle_net().get(heavy);
    if idle < amount {
        let pull = with_buffer(state, amount - idle)?;
        *withdrawals.get_mut(heavy) += unwind::redeem_amount(state, venues, heavy, pull)?;
    }
    let amount = amount.min(state.idle_net().get(heavy));
    debug!(asset = %heavy, excess, amount, "Swapping toward equal value");

    let direction = SwapDirection::selling(heavy);
    let limit = match direction {
        SwapDirection::AToB => SqrtPrice::new(MIN_SQRT_RATIO + U256::one())?,
        SwapDirection::BToA => SqrtPrice::new(MAX_SQRT_RATIO - U256::one())?,
    };

    let reserved = state.accrued_fee;
    let mut payer = IdleSettlement::new(&mut state.idle, reserved);
    let delta = venues.pool.swap(direction, amount, limit, &mut payer)?;
    if payer.paid().get(direction.input()) != delta.amount_in {
        return Err(VenueError::Unsettled {
            asset: direction.input(),
            expected: delta.amount_in,
        }
        .into());
    }
    state.credit_idle_asset(direction.output(), delta.amount_out)?;

    info!(
        direction = ?direction,
        amount_in = delta.amount_in,
        amount_out = delta.amount_out,
        "Rebalance swap executed"
    );
    Ok(Some(delta))
}

/// `shortfall` plus the configured withdrawal buffer.
fn with_buffer(state: &VaultState, shortfall: u128) -> VaultResult<u128> {
    let buffer = state
        .config
        .withdrawal_buffer
        .apply(shortfall, Rounding::Ceiling)?;
    Ok(shortfall.saturating_add(buffer))
}

/// Sizes a range around `price` that takes `amm_share` percent of `available`.
///
/// The range is the one a single liquidity value spread over both sides would span when
/// consuming exactly the target amounts. Returns `None` when there is nothing to deploy.
pub fn plan_range(
    price: SqrtPrice,
    available: TokenPair,
    amm_share: u8,
    spacing: i32,
    bounds: (i32, i32),
) -> VaultResult<Option<RangePlan>> {
    if amm_share > 100 {
        return Err(VaultError::InvalidAmmShare(amm_share));
    }
    let share = u128::from(amm_share);
    let target = TokenPair::new(
        mul_div_u128(available.a, share, 100, Rounding::Floor)?,
        mul_div_u128(available.b, share, 100, Rounding::Floor)?,
    );
    if target.a == 0 || target.b == 0 {
        return Ok(None);
    }

    let sqrt_price = price.x96();
    let liquidity = single_sided_liquidity_a(sqrt_price, available.a)?
        .min(single_sided_liquidity_b(sqrt_price, available.b)?);
    if liquidity == 0 {
        return Ok(None);
    }

    let (min_usable, max_usable) = usable_tick_bounds(spacing, bounds);
    let upper = match sqrt_upper_for_amount_a(sqrt_price, liquidity, target.a)? {
        Some(sqrt_upper) => {
            round_to_spacing(tick_at_sqrt_ratio(sqrt_upper)?, spacing).min(max_usable)
        }
        None => max_usable,
    };
    let lower = match sqrt_lower_for_amount_b(sqrt_price, liquidity, target.b)? {
        Some(sqrt_lower) => {
            round_to_spacing(tick_at_sqrt_ratio(sqrt_lower)?, spacing).max(min_usable)
        }
        None => min_usable,
    };

    let range = TickRange::new(lower, upper);
    range.validate(spacing, bounds)?;

    let tick = price.tick()?;
    let margin = range.width() / RANGE_SANITY_DIVISOR;
    if tick - bounds.0 < margin || bounds.1 - tick < margin {
        return Err(VaultError::InvalidRange {
            lower,
            upper,
            reason: "current tick too close to a global bound",
        });
    }

    debug!(lower, upper, liquidity, "Planned range");
    Ok(Some(RangePlan { range, target }))
}

/// Moves the vault to `plan.range` and opens as much liquidity as the target amounts fund.
fn deploy(
    state: &mut VaultState,
    venues: &mut Venues,
    price: SqrtPrice,
    plan: RangePlan,
    withdrawals: &mut TokenPair,
) -> VaultResult<(u128, TokenPair)> {
    let range = plan.range;
    state.range = range;

    let (sqrt_lower, sqrt_upper) = range.sqrt_bounds()?;
    let liquidity = liquidity_for_amounts(
        price.x96(),
        sqrt_lower,
        sqrt_upper,
        plan.target.a,
        plan.target.b,
    )?;
    if liquidity == 0 {
        return Ok((0, TokenPair::ZERO));
    }
    let required = amounts_for_liquidity(
        price.x96(),
        sqrt_lower,
        sqrt_upper,
        liquidity,
        Rounding::Ceiling,
    )?;

    for asset in [Asset::A, Asset::B] {
        let shortfall = required
            .get(asset)
            .saturating_sub(state.idle_net().get(asset));
        if shortfall > 0 {
            let pull = with_buffer(state, shortfall)?;
            *withdrawals.get_mut(asset) += unwind::redeem_amount(state, venues, asset, pull)?;
        }
    }

    let reserved = state.accrued_fee;
    let mut payer = IdleSettlement::new(&mut state.idle, reserved);
    let paid = venues
        .pool
        .open_position(range.lower, range.upper, liquidity, &mut payer)?;
    for asset in [Asset::A, Asset::B] {
        if payer.paid().get(asset) != paid.get(asset) {
            return Err(VenueError::Unsettled {
                asset,
                expected: paid.get(asset),
            }
            .into());
        }
    }

    debug!(liquidity, paid_a = paid.a, paid_b = paid.b, "Opened range position");
    Ok((liquidity, paid))
}

/// Deposits idle balances above the threshold into the reserves.
fn sweep_to_reserves(state: &mut VaultState, venues: &mut Venues) -> VaultResult<TokenPair> {
    let mut deposits = TokenPair::ZERO;
    for asset in [Asset::A, Asset::B] {
        let free = state.idle_net().get(asset);
        if free == 0 || free <= state.config.reserve_deposit_threshold.get(asset) {
            continue;
        }
        venues.reserve_mut(asset).deposit(&state.address, free)?;
        state.debit_idle(asset, free)?;

        let principal = state.reserve_deposited.get_mut(asset);
        *principal = principal.checked_add(free).ok_or(MathError::Overflow)?;
        *deposits.get_mut(asset) = free;
        debug!(asset = %asset, amount = free, "Swept idle balance into reserve");
    }
    Ok(deposits)
}
