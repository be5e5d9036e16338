//! Prelude module for convenient imports.
//!
//! ```rust
//! use range_vault_engine::prelude::*;
//! ```

// Accounting
pub use crate::accounting::{DepositQuote, DepositReceipt, WithdrawReceipt, quote_deposit};

// Configuration and state
pub use crate::config::VaultConfig;
pub use crate::state::{TickRange, VaultState};

// Errors
pub use crate::error::{VaultError, VaultResult, VenueError, VenueResult};

// Events
pub use crate::events::{EventData, VaultEvent, VaultEventType};

// Rebalance and unwind
pub use crate::rebalance::{RangePlan, RebalanceReport, plan_range};
pub use crate::unwind::UnwindReport;

// Valuation
pub use crate::valuation::Valuation;

// Vault
pub use crate::vault::{Vault, VaultSetup};

// Venues
pub use crate::venues::{
    AmmPool, AssetTransfer, IdleSettlement, PositionInfo, SettlementCallback, ShareLedger,
    SwapDelta, Transactional, Venue, Venues, YieldReserve,
};
