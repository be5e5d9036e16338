use super::{check_minimums, check_recipient};
use crate::error::{VaultError, VaultResult};
use crate::state::VaultState;
use crate::valuation;
use crate::venues::Venues;
use primitive_types::U256;
use range_vault_domain::error::MathError;
use range_vault_domain::math::full_math::{Rounding, div_rounding_up, mul_div, to_u128};
use range_vault_domain::token::{Address, Asset, TokenPair};
use range_vault_domain::value_objects::SqrtPrice;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Shares a deposit would mint and the amounts it would take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositQuote {
    pub shares: u128,
    pub taken: TokenPair,
}

/// Result of a completed deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub shares: u128,
    pub taken: TokenPair,
    pub total_supply: u128,
}

/// Prices a deposit of up to `desired` against the vault's `totals` and share `supply`.
///
/// The first deposit is split toward equal value at `price`. Later deposits keep the vault's
/// current asset ratio; if one side of the vault is empty the deposit is taken in the other.
pub fn quote_deposit(
    desired: TokenPair,
    totals: TokenPair,
    supply: u128,
    price: SqrtPrice,
) -> VaultResult<DepositQuote> {
    if desired.is_zero() {
        return Err(VaultError::ZeroAmount);
    }

    let quote = if supply == 0 {
        first_deposit(desired, price)?
    } else if totals.is_zero() {
        return Err(VaultError::TotalValueZero { supply });
    } else if totals.a == 0 {
        single_sided(Asset::B, desired, totals, supply)?
    } else if totals.b == 0 {
        single_sided(Asset::A, desired, totals, supply)?
    } else {
        proportional(desired, totals, supply)?
    };

    if quote.shares == 0 {
        return Err(VaultError::ZeroShares);
    }
    Ok(quote)
}

fn first_deposit(desired: TokenPair, price: SqrtPrice) -> VaultResult<DepositQuote> {
    let a_in_b = price.quote_a_in_b(desired.a, Rounding::Floor)?;

    let taken = if a_in_b > desired.b {
        let a = price.quote_b_in_a(desired.b, Rounding::Ceiling)?;
        TokenPair::new(a.min(desired.a), desired.b)
    } else {
        let b = price.quote_a_in_b(desired.a, Rounding::Ceiling)?;
        TokenPair::new(desired.a, b.min(desired.b))
    };

    Ok(DepositQuote {
        shares: taken.a.max(taken.b),
        taken,
    })
}

fn single_sided(
    asset: Asset,
    desired: TokenPair,
    totals: TokenPair,
    supply: u128,
) -> VaultResult<DepositQuote> {
    let amount = desired.get(asset);
    let shares = mul_div(
        U256::from(amount),
        U256::from(supply),
        U256::from(totals.get(asset)),
        Rounding::Floor,
    )?;

    let mut taken = TokenPair::ZERO;
    *taken.get_mut(asset) = amount;
    Ok(DepositQuote {
        shares: to_u128(shares)?,
        taken,
    })
}

fn proportional(desired: TokenPair, totals: TokenPair, supply: u128) -> VaultResult<DepositQuote> {
    let total_a = U256::from(totals.a);
    let total_b = U256::from(totals.b);
    let cross = (U256::from(desired.a) * total_b).min(U256::from(desired.b) * total_a);
    if cross.is_zero() {
        return Err(VaultError::ZeroAmount);
    }

    let taken = TokenPair::new(
        to_u128(div_rounding_up(cross, total_b)?)?,
        to_u128(div_rounding_up(cross, total_a)?)?,
    );
    let shares = mul_div(cross, U256::from(supply), total_a, Rounding::Floor)? / total_b;

    Ok(DepositQuote {
        shares: to_u128(shares)?,
        taken,
    })
}

pub(crate) fn deposit(
    state: &mut VaultState,
    venues: &mut Venues,
    caller: &Address,
    desired: TokenPair,
    minimum: TokenPair,
    recipient: &Address,
) -> VaultResult<DepositReceipt> {
    if desired.is_zero() {
        return Err(VaultError::ZeroAmount);
    }
    check_recipient(state, recipient)?;

    valuation::poke(state, venues.pool.as_mut())?;
    let totals = valuation::total_value(state, venues)?;
    let supply = venues.shares.total_supply();
    let price = venues.pool.current_price()?;
    debug!(total_a = totals.a, total_b = totals.b, supply, "Pricing deposit");

    let quote = quote_deposit(desired, totals, supply, price)?;
    check_minimums(quote.taken, minimum)?;

    let total_supply = supply
        .checked_add(quote.shares)
        .ok_or(MathError::Overflow)?;
    if total_supply > state.config.max_total_supply {
        return Err(VaultError::SupplyCapExceeded {
            requested: total_supply,
            cap: state.config.max_total_supply,
        });
    }

    for asset in [Asset::A, Asset::B] {
        let amount = quote.taken.get(asset);
        if amount > 0 {
            venues.transfers.pull(asset, caller, amount)?;
        }
    }
    state.credit_idle(quote.taken)?;
    venues.shares.mint(recipient, quote.shares)?;

    info!(
        sender = %caller,
        recipient = %recipient,
        shares = quote.shares,
        taken_a = quote.taken.a,
        taken_b = quote.taken.b,
        "Deposit completed"
    );

    Ok(DepositReceipt {
        shares: quote.shares,
        taken: quote.taken,
        total_supply,
    })
}
