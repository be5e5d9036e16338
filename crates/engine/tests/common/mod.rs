#![allow(dead_code)]

use range_vault_domain::token::{Address, Token, TokenPair};
use range_vault_engine::config::VaultConfig;
use range_vault_engine::state::TickRange;
use range_vault_engine::vault::{Vault, VaultSetup};
use range_vault_simulation::market::{MarketConfig, SimulatedMarket};
use std::sync::Arc;

pub const DEPOSIT: u128 = 1_000_000_000_000;
pub const INITIAL_RANGE: TickRange = TickRange {
    lower: -600,
    upper: 600,
};

pub struct Harness {
    pub vault: Arc<Vault>,
    pub market: SimulatedMarket,
    pub governance: Address,
    pub keeper: Address,
    pub alice: Address,
    pub bob: Address,
    pub treasury: Address,
}

pub fn harness(config: VaultConfig) -> Harness {
    harness_with_market(config, MarketConfig::default())
}

pub fn harness_with_market(config: VaultConfig, market_config: MarketConfig) -> Harness {
    let market = SimulatedMarket::new(&market_config).unwrap();
    let setup = VaultSetup {
        token_a: Token::new("mint-a", "AAA", 6, "Asset A"),
        token_b: Token::new("mint-b", "BBB", 6, "Asset B"),
        address: Address::from("vault"),
        governance: Address::from("governance"),
        rebalancer: Address::from("keeper"),
        range: INITIAL_RANGE,
        config,
    };
    let vault = Arc::new(Vault::new(setup, market.venues()).unwrap());

    let alice = Address::from("alice");
    let bob = Address::from("bob");
    market
        .wallets
        .fund(&alice, TokenPair::new(10 * DEPOSIT, 10 * DEPOSIT));
    market
        .wallets
        .fund(&bob, TokenPair::new(10 * DEPOSIT, 10 * DEPOSIT));

    Harness {
        vault,
        market,
        governance: Address::from("governance"),
        keeper: Address::from("keeper"),
        alice,
        bob,
        treasury: Address::from("treasury"),
    }
}

impl Harness {
    pub fn deposit(&self, who: &Address, amounts: TokenPair) -> u128 {
        self.vault
            .deposit(who, amounts, TokenPair::ZERO, who)
            .unwrap()
            .shares
    }

    pub fn withdraw_all(&self, who: &Address) -> TokenPair {
        let shares = self.vault.balance_of(who).unwrap();
        self.vault
            .withdraw(who, shares, TokenPair::ZERO, who)
            .unwrap()
            .amounts
    }

    pub fn liquidity(&self) -> u128 {
        use range_vault_engine::venues::AmmPool;
        let range = self.vault.state().unwrap().range;
        self.market
            .pool
            .position(range.lower, range.upper)
            .unwrap()
            .liquidity
    }
}

pub fn within(actual: u128, expected: u128, tolerance: u128) -> bool {
    actual.abs_diff(expected) <= tolerance
}
