use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Identity of a managed asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    pub name: String,
}

impl Token {
    pub fn new(
        address: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        name: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            symbol: symbol.into(),
            decimals,
            name: name.into(),
        }
    }
}

/// Holder address at a venue or share ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One side of the managed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    A,
    B,
}

impl Asset {
    pub fn other(self) -> Self {
        match self {
            Asset::A => Asset::B,
            Asset::B => Asset::A,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::A => write!(f, "A"),
            Asset::B => write!(f, "B"),
        }
    }
}

/// Direction of a pool swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Sell A for B; pushes the price down.
    AToB,
    /// Sell B for A; pushes the price up.
    BToA,
}

impl SwapDirection {
    /// Direction that sells `asset`.
    pub fn selling(asset: Asset) -> Self {
        match asset {
            Asset::A => SwapDirection::AToB,
            Asset::B => SwapDirection::BToA,
        }
    }

    pub fn input(self) -> Asset {
        match self {
            SwapDirection::AToB => Asset::A,
            SwapDirection::BToA => Asset::B,
        }
    }

    pub fn output(self) -> Asset {
        self.input().other()
    }
}

/// A pair of raw token amounts, one per managed asset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TokenPair {
    pub a: u128,
    pub b: u128,
}

impl TokenPair {
    pub const ZERO: TokenPair = TokenPair { a: 0, b: 0 };

    pub fn new(a: u128, b: u128) -> Self {
        Self { a, b }
    }

    pub fn get(&self, asset: Asset) -> u128 {
        match asset {
            Asset::A => self.a,
            Asset::B => self.b,
        }
    }

    pub fn get_mut(&mut self, asset: Asset) -> &mut u128 {
        match asset {
            Asset::A => &mut self.a,
            Asset::B => &mut self.b,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.a == 0 && self.b == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        Some(Self {
            a: self.a.checked_add(other.a)?,
            b: self.b.checked_add(other.b)?,
        })
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self {
            a: self.a.saturating_sub(other.a),
            b: self.b.saturating_sub(other.b),
        }
    }
}

impl Add for TokenPair {
    type Output = TokenPair;

    fn add(self, other: Self) -> Self {
        Self {
            a: self.a + other.a,
            b: self.b + other.b,
        }
    }
}

impl Sub for TokenPair {
    type Output = TokenPair;

    fn sub(self, other: Self) -> Self {
        Self {
            a: self.a - other.a,
            b: self.b - other.b,
        }
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pair_access() {
        let mut pair = TokenPair::new(10, 20);
        assert_eq!(pair.get(Asset::A), 10);
        *pair.get_mut(Asset::B) += 5;
        assert_eq!(pair, TokenPair::new(10, 25));
    }

    #[test]
    fn test_token_pair_saturating_sub() {
        let pair = TokenPair::new(10, 20).saturating_sub(TokenPair::new(15, 5));
        assert_eq!(pair, TokenPair::new(0, 15));
    }

    #[test]
    fn test_swap_direction_assets() {
        assert_eq!(SwapDirection::selling(Asset::A), SwapDirection::AToB);
        assert_eq!(SwapDirection::BToA.input(), Asset::B);
        assert_eq!(SwapDirection::BToA.output(), Asset::A);
    }

    #[test]
    fn test_address_empty() {
        assert!(Address::new("  ").is_empty());
        assert!(!Address::from("vault").is_empty());
    }
}
