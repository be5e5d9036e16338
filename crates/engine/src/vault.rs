//! The vault facade: the only way state and venues are touched.
//!
//! Every operation holds the state lock for its whole duration; concurrent callers wait for
//! it, while a call nested inside a running operation is rejected. Venue
//! journals are opened before the first call and rolled back together with vault state on
//! any error, so a failed operation leaves nothing behind.

use crate::accounting::{self, DepositQuote, DepositReceipt, WithdrawReceipt};
use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::events::{
    ConfigChangedData, DepositData, EmergencyUnwindData, EventData, FeesSweptData, RebalanceData,
    VaultEvent, WithdrawData,
};
use crate::guard::{EntryFlag, PauseGate};
use crate::ledger;
use crate::rebalance::{self, RebalanceReport};
use crate::state::{TickRange, VaultState};
use crate::unwind::{self, UnwindReport};
use crate::valuation::{self, Valuation};
use crate::venues::{Transactional, Venue, Venues};
use range_vault_domain::token::{Address, Token, TokenPair};
use range_vault_domain::value_objects::Percentage;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

/// Construction parameters of a vault.
#[derive(Debug, Clone)]
pub struct VaultSetup {
    pub token_a: Token,
    pub token_b: Token,
    /// Holder address of the vault at the venues.
    pub address: Address,
    pub governance: Address,
    pub rebalancer: Address,
    /// Initial range; it holds no liquidity until the first rebalance.
    pub range: TickRange,
    pub config: VaultConfig,
}

struct VaultCore {
    state: VaultState,
    venues: Venues,
    events: Vec<VaultEvent>,
}

/// A two-asset vault spread across an AMM range position, two reserves and idle balances.
pub struct Vault {
    entry: EntryFlag,
    gate: PauseGate,
    core: Mutex<VaultCore>,
}

impl Vault {
    /// Creates a vault over `venues`.
    pub fn new(setup: VaultSetup, venues: Venues) -> VaultResult<Self> {
        setup.config.validate()?;
        if setup.address.is_empty() {
            return Err(VaultError::InvalidConfig(
                "vault address must not be empty".to_string(),
            ));
        }
        setup
            .range
            .validate(venues.pool.tick_spacing(), venues.pool.tick_bounds())?;

        let state = VaultState {
            token_a: setup.token_a,
            token_b: setup.token_b,
            address: setup.address,
            governance: setup.governance,
            rebalancer: setup.rebalancer,
            range: setup.range,
            reserve_deposited: TokenPair::ZERO,
            accrued_fee: TokenPair::ZERO,
            idle: TokenPair::ZERO,
            config: setup.config,
        };

        info!(
            vault = %state.address,
            token_a = %state.token_a.symbol,
            token_b = %state.token_b.symbol,
            lower = state.range.lower,
            upper = state.range.upper,
            "Vault created"
        );

        Ok(Self {
            entry: EntryFlag::new(),
            gate: PauseGate::new(),
            core: Mutex::new(VaultCore {
                state,
                venues,
                events: Vec::new(),
            }),
        })
    }

    /// Deposits up to `desired` from `caller` and mints shares to `recipient`.
    pub fn deposit(
        &self,
        caller: &Address,
        desired: TokenPair,
        minimum: TokenPair,
        recipient: &Address,
    ) -> VaultResult<DepositReceipt> {
        self.transact("deposit", |core| {
            self.gate.check_deposits()?;
            let receipt = accounting::deposit(
                &mut core.state,
                &mut core.venues,
                caller,
                desired,
                minimum,
                recipient,
            )?;
            core.events.push(VaultEvent::new(EventData::Deposit(DepositData {
                sender: caller.clone(),
                recipient: recipient.clone(),
                shares: receipt.shares,
                amounts: receipt.taken,
                total_supply: receipt.total_supply,
            })));
            Ok(receipt)
        })
    }

    /// Burns `shares` of `caller` and sends the matching assets to `recipient`.
    ///
    /// Available while the vault is paused.
    pub fn withdraw(
        &self,
        caller: &Address,
        shares: u128,
        minimum: TokenPair,
        recipient: &Address,
    ) -> VaultResult<WithdrawReceipt> {
        self.transact("withdraw", |core| {
            let receipt = accounting::withdraw(
                &mut core.state,
                &mut core.venues,
                caller,
                shares,
                minimum,
                recipient,
            )?;
            core.events.push(VaultEvent::new(EventData::Withdraw(WithdrawData {
                owner: caller.clone(),
                recipient: recipient.clone(),
                shares: receipt.shares,
                amounts: receipt.amounts,
                fee: receipt.fee,
                total_supply: receipt.total_supply,
            })));
            Ok(receipt)
        })
    }

    /// Redistributes holdings, putting `amm_share` percent of them in a fresh range.
    pub fn rebalance(&self, caller: &Address, amm_share: u8) -> VaultResult<RebalanceReport> {
        self.transact("rebalance", |core| {
            if *caller != core.state.rebalancer {
                return Err(VaultError::Unauthorized(caller.clone()));
            }
            self.gate.check_rebalance()?;

            let report = rebalance::rebalance(&mut core.state, &mut core.venues, amm_share)?;
            let price = core.venues.pool.current_price()?.to_decimal()?;
            core.events.push(VaultEvent::new(EventData::Rebalance(RebalanceData {
                previous_range: report.previous_range,
                range: report.range,
                liquidity: report.liquidity,
                deployed: report.deployed,
                swap: report.swap,
                reserve_withdrawals: report.reserve_withdrawals,
                reserve_deposits: report.reserve_deposits,
                fee: report.fee,
                accrued_fee: core.state.accrued_fee,
                price,
            })));
            Ok(report)
        })
    }

    /// Shares and amounts a deposit of `desired` would get right now, without refreshing fees.
    pub fn preview_deposit(&self, desired: TokenPair) -> VaultResult<DepositQuote> {
        self.read(|core| {
            let totals = valuation::total_value(&core.state, &core.venues)?;
            let supply = core.venues.shares.total_supply();
            let price = core.venues.pool.current_price()?;
            accounting::quote_deposit(desired, totals, supply, price)
        })
    }

    /// Total value per asset, excluding everything owed to the protocol.
    pub fn total_value(&self) -> VaultResult<TokenPair> {
        self.read(|core| valuation::total_value(&core.state, &core.venues))
    }

    pub fn valuation(&self) -> VaultResult<Valuation> {
        self.read(|core| valuation::value(&core.state, &core.venues))
    }

    /// Snapshot of the vault state.
    pub fn state(&self) -> VaultResult<VaultState> {
        self.read(|core| Ok(core.state.clone()))
    }

    pub fn total_supply(&self) -> VaultResult<u128> {
        self.read(|core| Ok(core.venues.shares.total_supply()))
    }

    pub fn balance_of(&self, holder: &Address) -> VaultResult<u128> {
        self.read(|core| Ok(core.venues.shares.balance_of(holder)))
    }

    pub fn deposits_paused(&self) -> bool {
        self.gate.deposits_paused()
    }

    pub fn rebalance_paused(&self) -> bool {
        self.gate.rebalance_paused()
    }

    /// Drains the recorded events.
    pub fn take_events(&self) -> VaultResult<Vec<VaultEvent>> {
        let mut core = self.lock()?;
        Ok(std::mem::take(&mut core.events))
    }

    pub fn set_protocol_fee_rate(&self, caller: &Address, rate: Percentage) -> VaultResult<()> {
        self.configure(caller, "protocol_fee_rate", rate.value(), |config| {
            config.protocol_fee_rate = rate;
        })
    }

    pub fn set_max_total_supply(&self, caller: &Address, max_total_supply: u128) -> VaultResult<()> {
        self.configure(caller, "max_total_supply", max_total_supply, |config| {
            config.max_total_supply = max_total_supply;
        })
    }

    pub fn set_excess_ignore_band(&self, caller: &Address, band: Percentage) -> VaultResult<()> {
        self.configure(caller, "excess_ignore_band", band.value(), |config| {
            config.excess_ignore_band = band;
        })
    }

    pub fn set_reserve_thresholds(&self, caller: &Address, thresholds: TokenPair) -> VaultResult<()> {
        self.configure(caller, "reserve_deposit_threshold", thresholds, |config| {
            config.reserve_deposit_threshold = thresholds;
        })
    }

    pub fn set_withdrawal_buffer(&self, caller: &Address, buffer: Percentage) -> VaultResult<()> {
        self.configure(caller, "withdrawal_buffer", buffer.value(), |config| {
            config.withdrawal_buffer = buffer;
        })
    }

    pub fn set_rebalancer(&self, caller: &Address, rebalancer: Address) -> VaultResult<()> {
        self.govern(caller, "rebalancer", &rebalancer, |core| {
            core.state.rebalancer = rebalancer.clone();
            Ok(())
        })
    }

    pub fn pause_deposits(&self, caller: &Address) -> VaultResult<()> {
        self.govern(caller, "deposits_paused", true, |_| {
            self.gate.set_deposits_paused(true);
            Ok(())
        })
    }

    pub fn resume_deposits(&self, caller: &Address) -> VaultResult<()> {
        self.govern(caller, "deposits_paused", false, |_| {
            self.gate.set_deposits_paused(false);
            Ok(())
        })
    }

    pub fn pause_rebalance(&self, caller: &Address) -> VaultResult<()> {
        self.govern(caller, "rebalance_paused", true, |_| {
            self.gate.set_rebalance_paused(true);
            Ok(())
        })
    }

    pub fn resume_rebalance(&self, caller: &Address) -> VaultResult<()> {
        self.govern(caller, "rebalance_paused", false, |_| {
            self.gate.set_rebalance_paused(false);
            Ok(())
        })
    }

    /// Pays all accrued protocol fees to `to`.
    pub fn sweep_fees(&self, caller: &Address, to: &Address) -> VaultResult<TokenPair> {
        self.transact("sweep_fees", |core| {
            Self::check_governance(&core.state, caller)?;
            accounting::check_recipient(&core.state, to)?;

            let amounts = ledger::sweep_fees(&mut core.state, core.venues.transfers.as_mut(), to)?;
            core.events.push(VaultEvent::new(EventData::FeesSwept(FeesSweptData {
                to: to.clone(),
                amounts,
            })));
            Ok(amounts)
        })
    }

    /// Pulls everything out of one venue into idle.
    pub fn emergency_unwind(&self, caller: &Address, venue: Venue) -> VaultResult<UnwindReport> {
        self.transact("emergency_unwind", |core| {
            Self::check_governance(&core.state, caller)?;

            let report = unwind::emergency_unwind(&mut core.state, &mut core.venues, venue)?;
            core.events
                .push(VaultEvent::new(EventData::EmergencyUnwind(EmergencyUnwindData {
                    venue: report.venue,
                    recovered: report.recovered,
                    fee: report.fee,
                })));
            Ok(report)
        })
    }

    fn configure(
        &self,
        caller: &Address,
        field: &'static str,
        value: impl Display,
        apply: impl FnOnce(&mut VaultConfig),
    ) -> VaultResult<()> {
        self.govern(caller, field, value, |core| {
            apply(&mut core.state.config);
            core.state.config.validate()
        })
    }

    fn govern(
        &self,
        caller: &Address,
        field: &'static str,
        value: impl Display,
        apply: impl FnOnce(&mut VaultCore) -> VaultResult<()>,
    ) -> VaultResult<()> {
        self.transact(field, |core| {
            Self::check_governance(&core.state, caller)?;
            apply(core)?;

            let value = value.to_string();
            info!(field, value = %value, "Vault setting changed");
            core.events
                .push(VaultEvent::new(EventData::ConfigChanged(ConfigChangedData {
                    field: field.to_string(),
                    value,
                })));
            Ok(())
        })
    }

    fn check_governance(state: &VaultState, caller: &Address) -> VaultResult<()> {
        if *caller != state.governance {
            return Err(VaultError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    fn lock(&self) -> VaultResult<MutexGuard<'_, VaultCore>> {
        self.core.lock().map_err(|_| VaultError::Poisoned)
    }

    /// Runs a read-only view under the entry flag.
    fn read<T>(&self, view: impl FnOnce(&VaultCore) -> VaultResult<T>) -> VaultResult<T> {
        self.entry.check()?;
        let core = self.lock()?;
        let _entry = self.entry.claim();
        view(&*core)
    }

    /// Runs `operation` atomically across vault state and every venue.
    fn transact<T>(
        &self,
        name: &'static str,
        operation: impl FnOnce(&mut VaultCore) -> VaultResult<T>,
    ) -> VaultResult<T> {
        self.entry.check()?;
        let mut core = self.lock()?;
        let _entry = self.entry.claim();

        let snapshot = core.state.clone();
        let events = core.events.len();
        core.venues.begin();

        match operation(&mut *core) {
            Ok(value) => {
                core.venues.commit();
                Ok(value)
            }
            Err(err) => {
                core.venues.rollback();
                core.state = snapshot;
                core.events.truncate(events);
                warn!(operation = name, error = %err, "Vault operation reverted");
                Err(err)
            }
        }
    }
}
