//! Share accounting: converting deposits into shares and shares back into assets.
//!
//! Shares are always rounded down and amounts taken from a depositor are rounded up, so no
//! operation can dilute existing holders.

mod deposit;
mod withdraw;

pub use deposit::{DepositQuote, DepositReceipt, quote_deposit};
pub use withdraw::WithdrawReceipt;

pub(crate) use deposit::deposit;
pub(crate) use withdraw::withdraw;

use crate::error::{VaultError, VaultResult};
use crate::state::VaultState;
use range_vault_domain::token::{Address, Asset, TokenPair};

pub(crate) fn check_recipient(state: &VaultState, recipient: &Address) -> VaultResult<()> {
    if recipient.is_empty() || *recipient == state.address {
        return Err(VaultError::InvalidRecipient(recipient.clone()));
    }
    Ok(())
}

pub(crate) fn check_minimums(actual: TokenPair, minimum: TokenPair) -> VaultResult<()> {
    for asset in [Asset::A, Asset::B] {
        if actual.get(asset) < minimum.get(asset) {
            return Err(VaultError::Slippage {
                asset,
                actual: actual.get(asset),
                minimum: minimum.get(asset),
            });
        }
    }
    Ok(())
}
