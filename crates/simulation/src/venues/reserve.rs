//! In-memory yield reserve priced by a single exchange rate.

use crate::journal::Shared;
use range_vault_domain::error::MathError;
use range_vault_domain::math::full_math::{Rounding, mul_div_u128};
use range_vault_domain::token::{Address, Asset};
use range_vault_domain::value_objects::Percentage;
use range_vault_engine::error::{VenueError, VenueResult};
use range_vault_engine::venues::{Transactional, YieldReserve};
use std::collections::HashMap;

const VENUE: &str = "reserve";

#[derive(Debug, Clone)]
struct ReserveState {
    asset: Asset,
    decimals: u8,
    /// Asset per share, scaled by `10^decimals`.
    exchange_rate: u128,
    shares: HashMap<Address, u128>,
    halted: bool,
}

impl ReserveState {
    fn scale(&self) -> VenueResult<u128> {
        10u128
            .checked_pow(u32::from(self.decimals))
            .ok_or_else(|| VenueError::rejected(VENUE, MathError::Overflow.to_string()))
    }

    fn check_live(&self) -> VenueResult<()> {
        if self.halted {
            return Err(VenueError::rejected(VENUE, "reserve is halted"));
        }
        Ok(())
    }
}

/// Handle to a simulated reserve. Clones share the same reserve.
#[derive(Debug, Clone)]
pub struct SimulatedReserve {
    state: Shared<ReserveState>,
}

impl SimulatedReserve {
    /// Creates a reserve for `asset` with one share worth one unit.
    pub fn new(asset: Asset, decimals: u8) -> Self {
        let exchange_rate = 10u128.saturating_pow(u32::from(decimals));
        Self {
            state: Shared::new(ReserveState {
                asset,
                decimals,
                exchange_rate,
                shares: HashMap::new(),
                halted: false,
            }),
        }
    }

    pub fn set_exchange_rate(&self, exchange_rate: u128) {
        self.state.lock().exchange_rate = exchange_rate;
    }

    /// Raises the exchange rate by `yield_rate`, rounded down.
    pub fn accrue_yield(&self, yield_rate: Percentage) -> VenueResult<()> {
        let mut state = self.state.lock();
        let growth = yield_rate
            .apply(state.exchange_rate, Rounding::Floor)
            .map_err(|err| VenueError::rejected(VENUE, err.to_string()))?;
        state.exchange_rate = state.exchange_rate.saturating_add(growth);
        Ok(())
    }

    pub fn set_halted(&self, halted: bool) {
        self.state.lock().halted = halted;
    }
}

impl Transactional for SimulatedReserve {
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

impl YieldReserve for SimulatedReserve {
    fn deposit(&mut self, holder: &Address, amount: u128) -> VenueResult<()> {
        let mut state = self.state.lock();
        state.check_live()?;
        let scale = state.scale()?;
        let minted = mul_div_u128(amount, scale, state.exchange_rate, Rounding::Floor)
            .map_err(|err| VenueError::rejected(VENUE, err.to_string()))?;
        *state.shares.entry(holder.clone()).or_default() += minted;
        Ok(())
    }

    fn withdraw(&mut self, holder: &Address, shares: u128) -> VenueResult<u128> {
        let mut state = self.state.lock();
        state.check_live()?;
        let held = state.shares.get(holder).copied().unwrap_or_default();
        if shares > held {
            return Err(VenueError::rejected(
                VENUE,
                format!("redeeming {shares} {} shares of {held}", state.asset),
            ));
        }
        let scale = state.scale()?;
        let returned = mul_div_u128(shares, state.exchange_rate, scale, Rounding::Floor)
            .map_err(|err| VenueError::rejected(VENUE, err.to_string()))?;
        state.shares.insert(holder.clone(), held - shares);
        Ok(returned)
    }

    fn balance_of_shares(&self, holder: &Address) -> u128 {
        self.state
            .lock()
            .shares
            .get(holder)
            .copied()
            .unwrap_or_default()
    }

    fn exchange_rate(&self) -> u128 {
        self.state.lock().exchange_rate
    }

    fn decimals(&self) -> u8 {
        self.state.lock().decimals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_yield_grows_redeemable_value() {
        let mut reserve = SimulatedReserve::new(Asset::A, 6);
        let vault = Address::from("vault");
        reserve.deposit(&vault, 1_000).unwrap();
        assert_eq!(reserve.balance_of_shares(&vault), 1_000);

        reserve.accrue_yield(Percentage::new(dec!(0.1)).unwrap()).unwrap();
        assert_eq!(reserve.exchange_rate(), 1_100_000);
        assert_eq!(reserve.withdraw(&vault, 500).unwrap(), 550);
        assert_eq!(reserve.balance_of_shares(&vault), 500);
    }

    #[test]
    fn test_over_redeem_rejected() {
        let mut reserve = SimulatedReserve::new(Asset::B, 6);
        let vault = Address::from("vault");
        reserve.deposit(&vault, 10).unwrap();
        assert!(reserve.withdraw(&vault, 11).is_err());
    }

    #[test]
    fn test_rollback_restores_shares() {
        let mut reserve = SimulatedReserve::new(Asset::A, 6);
        let vault = Address::from("vault");
        reserve.begin();
        reserve.deposit(&vault, 10).unwrap();
        reserve.rollback();
        assert_eq!(reserve.balance_of_shares(&vault), 0);
    }
}
