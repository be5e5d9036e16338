//! In-memory fungible share ledger.

use crate::journal::Shared;
use range_vault_domain::token::Address;
use range_vault_engine::error::{VenueError, VenueResult};
use range_vault_engine::venues::{ShareLedger, Transactional};
use std::collections::HashMap;

const VENUE: &str = "share ledger";

#[derive(Debug, Clone, Default)]
struct LedgerState {
    total_supply: u128,
    balances: HashMap<Address, u128>,
}

/// Handle to a simulated share ledger. Clones share the same ledger.
#[derive(Debug, Clone, Default)]
pub struct SimulatedShareLedger {
    state: Shared<LedgerState>,
}

impl SimulatedShareLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transactional for SimulatedShareLedger {
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

impl ShareLedger for SimulatedShareLedger {
    fn mint(&mut self, to: &Address, amount: u128) -> VenueResult<()> {
        let mut state = self.state.lock();
        state.total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| VenueError::rejected(VENUE, "supply overflow"))?;
        *state.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }

    fn burn(&mut self, from: &Address, amount: u128) -> VenueResult<()> {
        let mut state = self.state.lock();
        let balance = state.balances.get(from).copied().unwrap_or_default();
        if amount > balance {
            return Err(VenueError::rejected(
                VENUE,
                format!("burning {amount} shares of {balance}"),
            ));
        }
        state.balances.insert(from.clone(), balance - amount);
        state.total_supply -= amount;
        Ok(())
    }

    fn total_supply(&self) -> u128 {
        self.state.lock().total_supply
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.state
            .lock()
            .balances
            .get(holder)
            .copied()
            .unwrap_or_default()
    }
}
