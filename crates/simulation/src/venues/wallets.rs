//! In-memory user wallets for asset transfers.

use crate::journal::Shared;
use range_vault_domain::token::{Address, Asset, TokenPair};
use range_vault_engine::error::{VenueError, VenueResult};
use range_vault_engine::venues::{AssetTransfer, Transactional};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct WalletState {
    balances: HashMap<Address, TokenPair>,
}

/// Handle to simulated wallets. Clones share the same balances.
#[derive(Debug, Clone, Default)]
pub struct SimulatedWallets {
    state: Shared<WalletState>,
}

impl SimulatedWallets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amounts` to `owner` out of thin air.
    pub fn fund(&self, owner: &Address, amounts: TokenPair) {
        let mut state = self.state.lock();
        let balance = state.balances.entry(owner.clone()).or_default();
        balance.a = balance.a.saturating_add(amounts.a);
        balance.b = balance.b.saturating_add(amounts.b);
    }

    pub fn balance(&self, owner: &Address) -> TokenPair {
        self.state
            .lock()
            .balances
            .get(owner)
            .copied()
            .unwrap_or_default()
    }
}

impl Transactional for SimulatedWallets {
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

impl AssetTransfer for SimulatedWallets {
    fn pull(&mut self, asset: Asset, from: &Address, amount: u128) -> VenueResult<()> {
        let mut state = self.state.lock();
        let balance = state.balances.entry(from.clone()).or_default();
        let available = balance.get(asset);
        if amount > available {
            return Err(VenueError::InsufficientBalance {
                asset,
                requested: amount,
                available,
            });
        }
        *balance.get_mut(asset) -= amount;
        Ok(())
    }

    fn push(&mut self, asset: Asset, to: &Address, amount: u128) -> VenueResult<()> {
        let mut state = self.state.lock();
        let balance = state.balances.entry(to.clone()).or_default();
        let credited = balance.get_mut(asset);
        *credited = credited
            .checked_add(amount)
            .ok_or_else(|| VenueError::rejected("wallets", "balance overflow"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_requires_funds() {
        let mut wallets = SimulatedWallets::new();
        let alice = Address::from("alice");
        wallets.fund(&alice, TokenPair::new(100, 0));

        wallets.pull(Asset::A, &alice, 60).unwrap();
        assert_eq!(wallets.balance(&alice), TokenPair::new(40, 0));

        let err = wallets.pull(Asset::B, &alice, 1).unwrap_err();
        assert!(matches!(err, VenueError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_push_credits_recipient() {
        let mut wallets = SimulatedWallets::new();
        let bob = Address::from("bob");
        wallets.push(Asset::B, &bob, 25).unwrap();
        assert_eq!(wallets.balance(&bob), TokenPair::new(0, 25));
    }
}
