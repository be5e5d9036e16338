//! Events emitted by completed vault operations.

use crate::state::TickRange;
use crate::venues::{SwapDelta, Venue};
use range_vault_domain::token::{Address, TokenPair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Type of vault event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEventType {
    /// Assets were deposited for shares.
    Deposit,
    /// Shares were redeemed for assets.
    Withdraw,
    /// Holdings were redistributed across the venues.
    Rebalance,
    /// Accrued protocol fees were paid out.
    FeesSwept,
    /// A single venue was drained by governance.
    EmergencyUnwind,
    /// A configuration value or gate changed.
    ConfigChanged,
}

/// An event recorded by the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    pub event_type: VaultEventType,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl VaultEvent {
    /// Creates a new event stamped with a fresh id and the current time.
    pub fn new(data: EventData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: data.event_type(),
            timestamp: chrono::Utc::now(),
            data,
        }
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventData {
    Deposit(DepositData),
    Withdraw(WithdrawData),
    Rebalance(RebalanceData),
    FeesSwept(FeesSweptData),
    EmergencyUnwind(EmergencyUnwindData),
    ConfigChanged(ConfigChangedData),
}

impl EventData {
    pub fn event_type(&self) -> VaultEventType {
        match self {
            EventData::Deposit(_) => VaultEventType::Deposit,
            EventData::Withdraw(_) => VaultEventType::Withdraw,
            EventData::Rebalance(_) => VaultEventType::Rebalance,
            EventData::FeesSwept(_) => VaultEventType::FeesSwept,
            EventData::EmergencyUnwind(_) => VaultEventType::EmergencyUnwind,
            EventData::ConfigChanged(_) => VaultEventType::ConfigChanged,
        }
    }
}

/// Data for deposit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositData {
    /// Account the assets were pulled from.
    pub sender: Address,
    /// Account the shares were minted to.
    pub recipient: Address,
    /// Shares minted.
    pub shares: u128,
    /// Amounts taken.
    pub amounts: TokenPair,
    /// Share supply after the deposit.
    pub total_supply: u128,
}

/// Data for withdraw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawData {
    /// Account the shares were burned from.
    pub owner: Address,
    /// Account the assets were sent to.
    pub recipient: Address,
    /// Shares burned.
    pub shares: u128,
    /// Amounts sent.
    pub amounts: TokenPair,
    /// Protocol fee accrued while withdrawing.
    pub fee: TokenPair,
    /// Share supply after the withdrawal.
    pub total_supply: u128,
}

/// Data for rebalance event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceData {
    /// Range before the rebalance.
    pub previous_range: TickRange,
    /// Range after the rebalance.
    pub range: TickRange,
    /// Liquidity deployed to the new range.
    pub liquidity: u128,
    /// Amounts deployed to the AMM.
    pub deployed: TokenPair,
    /// Swap executed while balancing value, if any.
    pub swap: Option<SwapDelta>,
    /// Amounts redeemed from the reserves.
    pub reserve_withdrawals: TokenPair,
    /// Amounts swept into the reserves.
    pub reserve_deposits: TokenPair,
    /// Protocol fee accrued during the rebalance.
    pub fee: TokenPair,
    /// Total protocol fee owed after the rebalance.
    pub accrued_fee: TokenPair,
    /// Pool price after the rebalance.
    pub price: Decimal,
}

/// Data for fees swept event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesSweptData {
    /// Fee recipient.
    pub to: Address,
    /// Amounts paid out.
    pub amounts: TokenPair,
}

/// Data for emergency unwind event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyUnwindData {
    /// Venue drained.
    pub venue: Venue,
    /// Amounts recovered into idle.
    pub recovered: TokenPair,
    /// Protocol fee accrued on the recovered gain.
    pub fee: TokenPair,
}

/// Data for config change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChangedData {
    /// Name of the changed setting.
    pub field: String,
    /// New value, rendered for display.
    pub value: String,
}
