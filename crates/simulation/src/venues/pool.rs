//! In-memory concentrated-liquidity pool.
//!
//! Swaps run at constant active liquidity and never cross a tick: the active liquidity is
//! whatever covers the price when the swap starts. Swap fees go to the in-range positions
//! pro rata and only become owed once a position is touched, as on a real pool.

use crate::journal::Shared;
use primitive_types::U256;
use range_vault_domain::error::MathError;
use range_vault_domain::math::concentrated_liquidity::{
    amount_a_delta, amount_b_delta, amounts_for_liquidity,
};
use range_vault_domain::math::full_math::{Rounding, mul_div, mul_div_u128};
use range_vault_domain::math::tick_math::{MAX_TICK, MIN_TICK, Q96, sqrt_ratio_at_tick};
use range_vault_domain::token::{Asset, SwapDirection, TokenPair};
use range_vault_domain::value_objects::{Percentage, SqrtPrice};
use range_vault_engine::error::{VenueError, VenueResult};
use range_vault_engine::venues::{
    AmmPool, PositionInfo, SettlementCallback, SwapDelta, Transactional,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const VENUE: &str = "pool";

type OpenHook = Box<dyn FnMut() + Send>;

fn math(err: MathError) -> VenueError {
    VenueError::rejected(VENUE, err.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
struct RangePosition {
    liquidity: u128,
    owed: TokenPair,
    /// Fees earned but not yet credited to `owed`.
    pending_fees: TokenPair,
}

#[derive(Debug, Clone)]
struct PoolState {
    price: SqrtPrice,
    fee_rate: Percentage,
    tick_spacing: i32,
    /// Full-range liquidity of other providers.
    base_liquidity: u128,
    positions: HashMap<(i32, i32), RangePosition>,
    halted: bool,
}

struct SwapStep {
    next: SqrtPrice,
    amount_in: u128,
    amount_out: u128,
    fee: u128,
}

impl PoolState {
    fn check_live(&self) -> VenueResult<()> {
        if self.halted {
            return Err(VenueError::rejected(VENUE, "pool is halted"));
        }
        Ok(())
    }

    fn check_range(&self, lower: i32, upper: i32) -> VenueResult<()> {
        let on_grid = lower % self.tick_spacing == 0 && upper % self.tick_spacing == 0;
        if lower >= upper || lower < MIN_TICK || upper > MAX_TICK || !on_grid {
            return Err(VenueError::rejected(
                VENUE,
                format!("invalid range [{lower}, {upper}]"),
            ));
        }
        Ok(())
    }

    fn in_range(&self, tick: i32, (lower, upper): (i32, i32)) -> bool {
        lower <= tick && tick < upper
    }

    fn active_liquidity(&self) -> VenueResult<u128> {
        let tick = self.price.tick().map_err(math)?;
        self.positions
            .iter()
            .filter(|(range, _)| self.in_range(tick, **range))
            .try_fold(self.base_liquidity, |total, (_, position)| {
                total.checked_add(position.liquidity)
            })
            .ok_or_else(|| math(MathError::Overflow))
    }

    fn amounts(&self, lower: i32, upper: i32, liquidity: u128, rounding: Rounding) -> VenueResult<TokenPair> {
        let sqrt_lower = sqrt_ratio_at_tick(lower).map_err(math)?;
        let sqrt_upper = sqrt_ratio_at_tick(upper).map_err(math)?;
        amounts_for_liquidity(self.price.x96(), sqrt_lower, sqrt_upper, liquidity, rounding)
            .map_err(math)
    }

    /// Prices an exact-input swap, stopping early at `limit`.
    fn quote_swap(
        &self,
        direction: SwapDirection,
        amount_in: u128,
        limit: SqrtPrice,
    ) -> VenueResult<SwapStep> {
        let liquidity = self.active_liquidity()?;
        if liquidity == 0 {
            return Err(VenueError::rejected(VENUE, "no active liquidity"));
        }
        let current = self.price.x96();
        let fee = self.fee_rate.apply(amount_in, Rounding::Ceiling).map_err(math)?;
        let net = amount_in - fee;

        let target = match direction {
            SwapDirection::AToB => {
                if limit.x96() >= current {
                    return Err(VenueError::rejected(VENUE, "price limit above current price"));
                }
                // sqrt' = L * s / (L + amount * s)
                let numerator = U256::from(liquidity) << 96;
                let denominator = U256::from(net)
                    .checked_mul(current)
                    .and_then(|product| product.checked_add(numerator))
                    .ok_or_else(|| math(MathError::Overflow))?;
                mul_div(numerator, current, denominator, Rounding::Ceiling)
                    .map_err(math)?
                    .max(limit.x96())
            }
            SwapDirection::BToA => {
                if limit.x96() <= current {
                    return Err(VenueError::rejected(VENUE, "price limit below current price"));
                }
                // sqrt' = s + amount / L
                let rise = mul_div(U256::from(net), Q96, U256::from(liquidity), Rounding::Floor)
                    .map_err(math)?;
                current
                    .checked_add(rise)
                    .ok_or_else(|| math(MathError::Overflow))?
                    .min(limit.x96())
            }
        };
        let next = SqrtPrice::new(target).map_err(math)?;

        let (consumed, amount_out) = match direction {
            SwapDirection::AToB => (
                amount_a_delta(target, current, liquidity, Rounding::Ceiling),
                amount_b_delta(target, current, liquidity, Rounding::Floor),
            ),
            SwapDirection::BToA => (
                amount_b_delta(current, target, liquidity, Rounding::Ceiling),
                amount_a_delta(current, target, liquidity, Rounding::Floor),
            ),
        };
        let consumed = consumed.map_err(math)?.min(net);
        let amount_out = amount_out.map_err(math)?;

        // A swap cut short by the limit only pays for what it used.
        let (amount_in, fee) = if consumed < net {
            let gross = self
                .fee_rate
                .divide_by_complement(consumed, Rounding::Ceiling)
                .map_err(math)?
                .min(amount_in);
            (gross, gross - consumed)
        } else {
            (amount_in, fee)
        };

        Ok(SwapStep {
            next,
            amount_in,
            amount_out,
            fee,
        })
    }

    fn distribute_fee(&mut self, asset: Asset, fee: u128) -> VenueResult<()> {
        let total = self.active_liquidity()?;
        let tick = self.price.tick().map_err(math)?;
        let in_range: Vec<(i32, i32)> = self
            .positions
            .keys()
            .copied()
            .filter(|range| self.in_range(tick, *range))
            .collect();

        for range in in_range {
            if let Some(position) = self.positions.get_mut(&range) {
                let share =
                    mul_div_u128(fee, position.liquidity, total, Rounding::Floor).map_err(math)?;
                *position.pending_fees.get_mut(asset) += share;
            }
        }
        Ok(())
    }

    fn swap(
        &mut self,
        direction: SwapDirection,
        amount_in: u128,
        limit: SqrtPrice,
        payer: &mut dyn SettlementCallback,
    ) -> VenueResult<SwapDelta> {
        self.check_live()?;
        if amount_in == 0 {
            return Err(VenueError::rejected(VENUE, "zero swap amount"));
        }
        let step = self.quote_swap(direction, amount_in, limit)?;

        payer.settle(direction.input(), step.amount_in)?;
        self.distribute_fee(direction.input(), step.fee)?;
        self.price = step.next;

        Ok(SwapDelta {
            direction,
            amount_in: step.amount_in,
            amount_out: step.amount_out,
        })
    }
}

/// Pays for external trades out of thin air.
struct Faucet;

impl SettlementCallback for Faucet {
    fn settle(&mut self, _asset: Asset, _amount: u128) -> VenueResult<()> {
        Ok(())
    }
}

/// Handle to a simulated pool. Clones share the same pool.
#[derive(Clone)]
pub struct SimulatedPool {
    state: Shared<PoolState>,
    open_hook: Arc<Mutex<Option<OpenHook>>>,
}

impl SimulatedPool {
    /// Creates a pool at `price` with `base_liquidity` of full-range outside liquidity.
    pub fn new(
        price: SqrtPrice,
        fee_rate: Percentage,
        tick_spacing: i32,
        base_liquidity: u128,
    ) -> Self {
        Self {
            state: Shared::new(PoolState {
                price,
                fee_rate,
                tick_spacing,
                base_liquidity,
                positions: HashMap::new(),
                halted: false,
            }),
            open_hook: Arc::new(Mutex::new(None)),
        }
    }

    pub fn price(&self) -> SqrtPrice {
        self.state.lock().price
    }

    /// Moves the price without trading, as an external arbitrage would.
    pub fn set_price(&self, price: SqrtPrice) {
        self.state.lock().price = price;
    }

    /// Trades against the pool until the price reaches `target`, paying fees to the positions.
    pub fn trade_to(&self, target: SqrtPrice) -> VenueResult<Option<SwapDelta>> {
        let mut state = self.state.lock();
        let current = state.price.x96();
        if target.x96() == current {
            return Ok(None);
        }
        let liquidity = state.active_liquidity()?;
        let (direction, net) = if target.x96() < current {
            (
                SwapDirection::AToB,
                amount_a_delta(target.x96(), current, liquidity, Rounding::Ceiling),
            )
        } else {
            (
                SwapDirection::BToA,
                amount_b_delta(current, target.x96(), liquidity, Rounding::Ceiling),
            )
        };
        let net = net.map_err(math)?;
        if net == 0 {
            return Ok(None);
        }
        // One unit of slack so fee rounding never leaves the price short of `target`.
        let gross = state
            .fee_rate
            .divide_by_complement(net, Rounding::Ceiling)
            .map_err(math)?
            .saturating_add(1);
        state.swap(direction, gross, target, &mut Faucet).map(Some)
    }

    /// Credits trading fees straight to a position's pending fees.
    pub fn accrue_fees(&self, lower: i32, upper: i32, fees: TokenPair) -> VenueResult<()> {
        let mut state = self.state.lock();
        let position = state
            .positions
            .get_mut(&(lower, upper))
            .ok_or_else(|| VenueError::rejected(VENUE, "no such position"))?;
        position.pending_fees = position
            .pending_fees
            .checked_add(fees)
            .ok_or_else(|| math(MathError::Overflow))?;
        Ok(())
    }

    /// Fees earned by a position that a poke would make owed.
    pub fn pending_fees(&self, lower: i32, upper: i32) -> TokenPair {
        self.state
            .lock()
            .positions
            .get(&(lower, upper))
            .map(|position| position.pending_fees)
            .unwrap_or_default()
    }

    /// Makes every state-changing call fail while set.
    pub fn set_halted(&self, halted: bool) {
        self.state.lock().halted = halted;
    }

    /// Runs `hook` at the start of every `open_position`, before the pool is locked.
    pub fn set_open_hook(&self, hook: impl FnMut() + Send + 'static) {
        *self
            .open_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
    }

    fn run_open_hook(&self) {
        let mut hook = self.open_hook.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hook) = hook.as_mut() {
            hook();
        }
    }
}

impl Transactional for SimulatedPool {
    fn begin(&mut self) {
        self.state.lock().begin();
    }

    fn commit(&mut self) {
        self.state.lock().commit();
    }

    fn rollback(&mut self) {
        self.state.lock().rollback();
    }
}

impl AmmPool for SimulatedPool {
    fn tick_spacing(&self) -> i32 {
        self.state.lock().tick_spacing
    }

    fn fee_rate(&self) -> Percentage {
        self.state.lock().fee_rate
    }

    fn current_price(&self) -> VenueResult<SqrtPrice> {
        Ok(self.price())
    }

    fn position(&self, lower: i32, upper: i32) -> VenueResult<PositionInfo> {
        let state = self.state.lock();
        Ok(state
            .positions
            .get(&(lower, upper))
            .map(|position| PositionInfo {
                liquidity: position.liquidity,
                owed: position.owed,
            })
            .unwrap_or_default())
    }

    fn open_position(
        &mut self,
        lower: i32,
        upper: i32,
        liquidity: u128,
        payer: &mut dyn SettlementCallback,
    ) -> VenueResult<TokenPair> {
        self.run_open_hook();

        let mut state = self.state.lock();
        state.check_live()?;
        state.check_range(lower, upper)?;
        if liquidity == 0 {
            return Err(VenueError::rejected(VENUE, "zero liquidity"));
        }

        let amounts = state.amounts(lower, upper, liquidity, Rounding::Ceiling)?;
        for asset in [Asset::A, Asset::B] {
            if amounts.get(asset) > 0 {
                payer.settle(asset, amounts.get(asset))?;
            }
        }

        let position = state.positions.entry((lower, upper)).or_default();
        position.liquidity = position
            .liquidity
            .checked_add(liquidity)
            .ok_or_else(|| math(MathError::Overflow))?;
        Ok(amounts)
    }

    fn close_position(
        &mut self,
        lower: i32,
        upper: i32,
        liquidity: u128,
    ) -> VenueResult<TokenPair> {
        let mut state = self.state.lock();
        state.check_live()?;
        let held = state
            .positions
            .get(&(lower, upper))
            .map(|position| position.liquidity)
            .ok_or_else(|| VenueError::rejected(VENUE, "no such position"))?;
        if liquidity > held {
            return Err(VenueError::rejected(
                VENUE,
                format!("closing {liquidity} liquidity of {held}"),
            ));
        }

        let amounts = state.amounts(lower, upper, liquidity, Rounding::Floor)?;
        let position = state
            .positions
            .get_mut(&(lower, upper))
            .ok_or_else(|| VenueError::rejected(VENUE, "no such position"))?;
        position.liquidity -= liquidity;
        position.owed = position
            .owed
            .checked_add(amounts)
            .and_then(|owed| owed.checked_add(position.pending_fees))
            .ok_or_else(|| math(MathError::Overflow))?;
        position.pending_fees = TokenPair::ZERO;
        Ok(amounts)
    }

    fn collect_owed(&mut self, lower: i32, upper: i32, max: TokenPair) -> VenueResult<TokenPair> {
        let mut state = self.state.lock();
        let Some(position) = state.positions.get_mut(&(lower, upper)) else {
            return Ok(TokenPair::ZERO);
        };
        let collected = TokenPair::new(position.owed.a.min(max.a), position.owed.b.min(max.b));
        position.owed = position.owed - collected;
        Ok(collected)
    }

    fn swap(
        &mut self,
        direction: SwapDirection,
        amount_in: u128,
        price_limit: SqrtPrice,
        payer: &mut dyn SettlementCallback,
    ) -> VenueResult<SwapDelta> {
        self.state
            .lock()
            .swap(direction, amount_in, price_limit, payer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pool() -> SimulatedPool {
        SimulatedPool::new(
            SqrtPrice::parity(),
            Percentage::new(dec!(0.003)).unwrap(),
            60,
            1_000_000_000,
        )
    }

    struct Wallet(TokenPair);

    impl SettlementCallback for Wallet {
        fn settle(&mut self, asset: Asset, amount: u128) -> VenueResult<()> {
            *self.0.get_mut(asset) += amount;
            Ok(())
        }
    }

    #[test]
    fn test_open_and_close_round_trip() {
        let mut pool = pool();
        let mut paid = Wallet(TokenPair::ZERO);
        let amounts = pool.open_position(-600, 600, 1_000_000, &mut paid).unwrap();
        assert_eq!(amounts, paid.0);
        assert!(amounts.a > 0 && amounts.b > 0);

        let principal = pool.close_position(-600, 600, 1_000_000).unwrap();
        assert!(principal.a <= amounts.a && principal.a + 1 >= amounts.a);

        let collected = pool
            .collect_owed(-600, 600, TokenPair::new(u128::MAX, u128::MAX))
            .unwrap();
        assert_eq!(collected, principal);
        assert_eq!(pool.position(-600, 600).unwrap(), PositionInfo::default());
    }

    #[test]
    fn test_fees_become_owed_on_poke() {
        let mut pool = pool();
        pool.open_position(-600, 600, 1_000_000_000, &mut Wallet(TokenPair::ZERO))
            .unwrap();

        let target = SqrtPrice::from_tick(-120).unwrap();
        let delta = pool.trade_to(target).unwrap().unwrap();
        assert_eq!(delta.direction, SwapDirection::AToB);
        assert_eq!(pool.price(), target);

        let pending = pool.pending_fees(-600, 600);
        assert!(pending.a > 0);
        assert_eq!(pool.position(-600, 600).unwrap().owed, TokenPair::ZERO);

        pool.close_position(-600, 600, 0).unwrap();
        assert_eq!(pool.position(-600, 600).unwrap().owed, pending);
    }

    #[test]
    fn test_swap_stops_at_limit() {
        let mut pool = pool();
        let limit = SqrtPrice::from_tick(60).unwrap();
        let delta = pool
            .swap(
                SwapDirection::BToA,
                1_000_000_000_000,
                limit,
                &mut Wallet(TokenPair::ZERO),
            )
            .unwrap();
        assert_eq!(pool.price(), limit);
        assert!(delta.amount_in < 1_000_000_000_000);
        assert!(delta.amount_out > 0);
    }

    #[test]
    fn test_halted_pool_rejects_calls() {
        let mut pool = pool();
        pool.set_halted(true);
        let err = pool
            .open_position(-60, 60, 1, &mut Wallet(TokenPair::ZERO))
            .unwrap_err();
        assert!(matches!(err, VenueError::Rejected { .. }));
    }

    #[test]
    fn test_rollback_discards_position() {
        let mut pool = pool();
        pool.begin();
        pool.open_position(-60, 60, 1_000, &mut Wallet(TokenPair::ZERO))
            .unwrap();
        pool.rollback();
        assert_eq!(pool.position(-60, 60).unwrap().liquidity, 0);
    }
}
