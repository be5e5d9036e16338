//! Reentry detection and pause gating for vault operations.

use crate::error::{VaultError, VaultResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};
use tracing::info;

/// Records which thread is inside a vault operation.
///
/// Other threads wait on the vault lock instead; only a call nested inside an operation
/// on the same thread is rejected, since it would otherwise deadlock or see half-applied state.
#[derive(Debug, Default)]
pub struct EntryFlag(Mutex<Option<ThreadId>>);

impl EntryFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with [`VaultError::Reentrant`] when the calling thread is already inside an
    /// operation. Must be called before taking the vault lock.
    pub fn check(&self) -> VaultResult<()> {
        if *self.owner() == Some(thread::current().id()) {
            return Err(VaultError::Reentrant);
        }
        Ok(())
    }

    /// Marks the calling thread as inside an operation until the guard drops.
    /// Must be called while holding the vault lock.
    pub fn claim(&self) -> EntryGuard<'_> {
        *self.owner() = Some(thread::current().id());
        EntryGuard(self)
    }

    pub fn is_entered(&self) -> bool {
        self.owner().is_some()
    }

    fn owner(&self) -> std::sync::MutexGuard<'_, Option<ThreadId>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the owner on drop, including on early return.
#[derive(Debug)]
pub struct EntryGuard<'a>(&'a EntryFlag);

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        let mut owner = self.0.owner();
        if *owner == Some(thread::current().id()) {
            *owner = None;
        }
    }
}

/// Independent pause switches for inflows and rebalancing. Withdrawals are never paused.
#[derive(Debug, Default)]
pub struct PauseGate {
    deposits: AtomicBool,
    rebalance: AtomicBool,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_deposits_paused(&self, paused: bool) {
        self.deposits.store(paused, Ordering::SeqCst);
        info!(paused, "Deposit gate changed");
    }

    pub fn set_rebalance_paused(&self, paused: bool) {
        self.rebalance.store(paused, Ordering::SeqCst);
        info!(paused, "Rebalance gate changed");
    }

    pub fn deposits_paused(&self) -> bool {
        self.deposits.load(Ordering::SeqCst)
    }

    pub fn rebalance_paused(&self) -> bool {
        self.rebalance.load(Ordering::SeqCst)
    }

    pub fn check_deposits(&self) -> VaultResult<()> {
        if self.deposits_paused() {
            return Err(VaultError::Paused("deposit"));
        }
        Ok(())
    }

    pub fn check_rebalance(&self) -> VaultResult<()> {
        if self.rebalance_paused() {
            return Err(VaultError::Paused("rebalance"));
        }
        Ok(())
    }
}
