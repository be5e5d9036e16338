use range_vault_domain::error::MathError;
use range_vault_domain::token::{Address, Asset};
use thiserror::Error;

/// Failure reported by an external venue (pool, reserve, share ledger, transfers).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VenueError {
    #[error("{venue} rejected the call: {reason}")]
    Rejected { venue: &'static str, reason: String },

    #[error("insufficient {asset} balance: requested {requested}, available {available}")]
    InsufficientBalance {
        asset: Asset,
        requested: u128,
        available: u128,
    },

    #[error("pool settlement missing: expected {expected} of {asset}")]
    Unsettled { asset: Asset, expected: u128 },
}

impl VenueError {
    pub fn rejected(venue: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            venue,
            reason: reason.into(),
        }
    }
}

pub type VenueResult<T> = Result<T, VenueError>;

/// Errors surfaced by vault operations.
///
/// Every error aborts the whole operation; no partial state change is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("invalid recipient: {0}")]
    InvalidRecipient(Address),

    #[error("slippage bound not met for {asset}: got {actual}, minimum {minimum}")]
    Slippage {
        asset: Asset,
        actual: u128,
        minimum: u128,
    },

    #[error("share supply cap exceeded: {requested} > {cap}")]
    SupplyCapExceeded { requested: u128, cap: u128 },

    #[error("deposit would mint zero shares")]
    ZeroShares,

    #[error("insufficient shares: requested {requested}, balance {balance}")]
    InsufficientShares { requested: u128, balance: u128 },

    #[error("caller {0} is not authorized")]
    Unauthorized(Address),

    #[error("{0} is paused")]
    Paused(&'static str),

    #[error("vault called from inside one of its own operations")]
    Reentrant,

    #[error("invalid AMM share {0}, expected 0..=100")]
    InvalidAmmShare(u8),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("total value is zero while {supply} shares are outstanding")]
    TotalValueZero { supply: u128 },

    #[error("invalid tick range [{lower}, {upper}]: {reason}")]
    InvalidRange {
        lower: i32,
        upper: i32,
        reason: &'static str,
    },

    #[error("math error: {0}")]
    Math(#[from] MathError),

    #[error("vault state lock poisoned")]
    Poisoned,

    #[error("venue failure: {0}")]
    Venue(#[from] VenueError),
}

impl VaultError {
    /// Rejected caller input. Nothing was attempted at any venue.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            VaultError::ZeroAmount
                | VaultError::InvalidRecipient(_)
                | VaultError::Slippage { .. }
                | VaultError::SupplyCapExceeded { .. }
                | VaultError::ZeroShares
                | VaultError::InsufficientShares { .. }
                | VaultError::Unauthorized(_)
                | VaultError::Paused(_)
                | VaultError::Reentrant
                | VaultError::InvalidAmmShare(_)
                | VaultError::InvalidConfig(_)
        )
    }

    /// Broken internal invariant; treated as a defect rather than bad input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            VaultError::TotalValueZero { .. }
                | VaultError::InvalidRange { .. }
                | VaultError::Math(_)
                | VaultError::Poisoned
        )
    }
}

pub type VaultResult<T> = Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(VaultError::ZeroAmount.is_input_error());
        assert!(!VaultError::ZeroAmount.is_invariant_violation());
        assert!(VaultError::TotalValueZero { supply: 1 }.is_invariant_violation());
        assert!(VaultError::Math(MathError::Overflow).is_invariant_violation());

        let venue = VaultError::from(VenueError::rejected("pool", "halted"));
        assert!(!venue.is_input_error());
        assert!(!venue.is_invariant_violation());
    }

    #[test]
    fn test_error_messages() {
        let err = VaultError::Slippage {
            asset: Asset::B,
            actual: 5,
            minimum: 6,
        };
        assert_eq!(
            err.to_string(),
            "slippage bound not met for B: got 5, minimum 6"
        );
    }
}
