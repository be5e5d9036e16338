//! Interfaces of the external collaborators the vault drives.
//!
//! The vault never implements a pool, reserve or ledger itself; it consumes these traits.
//! Every venue is [`Transactional`] so a failed vault operation can be rolled back at the
//! venues as well as in vault state.

mod settlement;

pub use settlement::IdleSettlement;

use crate::error::VenueResult;
use range_vault_domain::math::tick_math::{MAX_TICK, MIN_TICK};
use range_vault_domain::token::{Address, Asset, SwapDirection, TokenPair};
use range_vault_domain::value_objects::{Percentage, SqrtPrice};
use serde::{Deserialize, Serialize};

/// Journal hooks invoked around each vault operation.
pub trait Transactional {
    /// Starts recording changes.
    fn begin(&mut self);
    /// Keeps everything since [`Transactional::begin`].
    fn commit(&mut self);
    /// Discards everything since [`Transactional::begin`].
    fn rollback(&mut self);
}

/// Settlement hook the pool calls while opening a position or swapping.
///
/// The implementation must hand over exactly `amount` of `asset` before returning, or fail.
pub trait SettlementCallback {
    fn settle(&mut self, asset: Asset, amount: u128) -> VenueResult<()>;
}

/// Range position held by the vault at the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub liquidity: u128,
    /// Owed amounts not yet collected: trading fees plus any closed principal.
    pub owed: TokenPair,
}

/// Outcome of a pool swap from the vault's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapDelta {
    pub direction: SwapDirection,
    pub amount_in: u128,
    pub amount_out: u128,
}

/// Concentrated-liquidity AMM pool.
pub trait AmmPool: Transactional + Send {
    fn tick_spacing(&self) -> i32;

    /// Global tick bounds of the pool.
    fn tick_bounds(&self) -> (i32, i32) {
        (MIN_TICK, MAX_TICK)
    }

    /// Swap fee charged on the input amount.
    fn fee_rate(&self) -> Percentage;

    fn current_price(&self) -> VenueResult<SqrtPrice>;

    fn position(&self, lower: i32, upper: i32) -> VenueResult<PositionInfo>;

    /// Adds `liquidity` to the range; the pool pulls the required amounts through `payer`.
    fn open_position(
        &mut self,
        lower: i32,
        upper: i32,
        liquidity: u128,
        payer: &mut dyn SettlementCallback,
    ) -> VenueResult<TokenPair>;

    /// Removes `liquidity` from the range and credits the principal to the owed amounts.
    /// A zero-liquidity close only refreshes the owed fees.
    fn close_position(&mut self, lower: i32, upper: i32, liquidity: u128)
    -> VenueResult<TokenPair>;

    /// Transfers up to `max` of the owed amounts to the vault.
    fn collect_owed(&mut self, lower: i32, upper: i32, max: TokenPair) -> VenueResult<TokenPair>;

    fn swap(
        &mut self,
        direction: SwapDirection,
        amount_in: u128,
        price_limit: SqrtPrice,
        payer: &mut dyn SettlementCallback,
    ) -> VenueResult<SwapDelta>;
}

/// Yield-bearing reserve for a single asset.
pub trait YieldReserve: Transactional + Send {
    /// Deposits `amount` from the vault; shares are credited to `holder`.
    fn deposit(&mut self, holder: &Address, amount: u128) -> VenueResult<()>;

    /// Redeems `shares` of `holder`, returning the asset amount paid out.
    fn withdraw(&mut self, holder: &Address, shares: u128) -> VenueResult<u128>;

    fn balance_of_shares(&self, holder: &Address) -> u128;

    /// Asset per share, scaled by `10^decimals()`.
    fn exchange_rate(&self) -> u128;

    fn decimals(&self) -> u8;
}

/// Fungible vault share bookkeeping.
pub trait ShareLedger: Transactional + Send {
    fn mint(&mut self, to: &Address, amount: u128) -> VenueResult<()>;
    fn burn(&mut self, from: &Address, amount: u128) -> VenueResult<()>;
    fn total_supply(&self) -> u128;
    fn balance_of(&self, holder: &Address) -> u128;
}

/// Asset movements between users and the vault.
pub trait AssetTransfer: Transactional + Send {
    /// Moves `amount` of `asset` from `from` into vault custody.
    fn pull(&mut self, asset: Asset, from: &Address, amount: u128) -> VenueResult<()>;
    /// Moves `amount` of `asset` out of vault custody to `to`.
    fn push(&mut self, asset: Asset, to: &Address, amount: u128) -> VenueResult<()>;
}

/// Venue addressed by an emergency unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Venue {
    Amm,
    Reserve(Asset),
}

/// Every collaborator the vault drives, owned for the vault's lifetime.
pub struct Venues {
    pub pool: Box<dyn AmmPool>,
    pub reserve_a: Box<dyn YieldReserve>,
    pub reserve_b: Box<dyn YieldReserve>,
    pub shares: Box<dyn ShareLedger>,
    pub transfers: Box<dyn AssetTransfer>,
}

impl Venues {
    pub fn reserve(&self, asset: Asset) -> &dyn YieldReserve {
        match asset {
            Asset::A => self.reserve_a.as_ref(),
            Asset::B => self.reserve_b.as_ref(),
        }
    }

    pub fn reserve_mut(&mut self, asset: Asset) -> &mut dyn YieldReserve {
        match asset {
            Asset::A => self.reserve_a.as_mut(),
            Asset::B => self.reserve_b.as_mut(),
        }
    }
}

impl Transactional for Venues {
    fn begin(&mut self) {
        self.pool.begin();
        self.reserve_a.begin();
        self.reserve_b.begin();
        self.shares.begin();
        self.transfers.begin();
    }

    fn commit(&mut self) {
        self.pool.commit();
        self.reserve_a.commit();
        self.reserve_b.commit();
        self.shares.commit();
        self.transfers.commit();
    }

    fn rollback(&mut self) {
        self.pool.rollback();
        self.reserve_a.rollback();
        self.reserve_b.rollback();
        self.shares.rollback();
        self.transfers.rollback();
    }
}
