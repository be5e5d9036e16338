use super::SettlementCallback;
use crate::error::{VenueError, VenueResult};
use range_vault_domain::token::{Asset, TokenPair};
use tracing::debug;

/// Pays the pool out of the vault's idle balances.
///
/// Balances backing accrued protocol fees are never spent.
pub struct IdleSettlement<'a> {
    idle: &'a mut TokenPair,
    reserved: TokenPair,
    paid: TokenPair,
}

impl<'a> IdleSettlement<'a> {
    pub fn new(idle: &'a mut TokenPair, reserved: TokenPair) -> Self {
        Self {
            idle,
            reserved,
            paid: TokenPair::ZERO,
        }
    }

    /// Total handed to the pool so far.
    pub fn paid(&self) -> TokenPair {
        self.paid
    }
}

impl SettlementCallback for IdleSettlement<'_> {
    fn settle(&mut self, asset: Asset, amount: u128) -> VenueResult<()> {
        let available = self.idle.get(asset).saturating_sub(self.reserved.get(asset));
        if amount > available {
            return Err(VenueError::InsufficientBalance {
                asset,
                requested: amount,
                available,
            });
        }
        *self.idle.get_mut(asset) -= amount;
        *self.paid.get_mut(asset) += amount;
        debug!(asset = %asset, amount, "Settled pool payment");
        Ok(())
    }
}
