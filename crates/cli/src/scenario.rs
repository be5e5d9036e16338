//! Scenario file for a simulated vault run.

use anyhow::{Context, Result, bail};
use range_vault_domain::token::{Token, TokenPair};
use range_vault_engine::config::VaultConfig;
use range_vault_simulation::market::MarketConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the scenario file when `--config` is absent.
pub const CONFIG_ENV: &str = "VAULT_CONFIG";

/// A depositor seeded before the first round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositorConfig {
    pub name: String,
    pub amount_a: u128,
    pub amount_b: u128,
}

impl DepositorConfig {
    pub fn amounts(&self) -> TokenPair {
        TokenPair::new(self.amount_a, self.amount_b)
    }
}

/// Geometric Brownian motion driving external trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricePathConfig {
    pub drift: f64,
    pub volatility: f64,
    /// Years per round.
    pub time_step: f64,
    pub seed: u64,
}

impl Default for PricePathConfig {
    fn default() -> Self {
        Self {
            drift: 0.0,
            volatility: 0.6,
            time_step: 1.0 / 365.0,
            seed: 42,
        }
    }
}

/// Everything a `simulate` run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub token_a: Token,
    pub token_b: Token,
    pub vault: VaultConfig,
    pub market: MarketConfig,
    pub price_path: PricePathConfig,
    pub depositors: Vec<DepositorConfig>,
    /// Percent of holdings placed in the range at each rebalance.
    pub amm_share: u8,
    /// Reserve yield per round in basis points.
    pub reserve_yield_bps: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            token_a: Token::new("mint-a", "AAA", 6, "Asset A"),
            token_b: Token::new("mint-b", "BBB", 6, "Asset B"),
            vault: VaultConfig::default(),
            market: MarketConfig::default(),
            price_path: PricePathConfig::default(),
            depositors: vec![
                DepositorConfig {
                    name: "alice".to_string(),
                    amount_a: 1_000_000_000_000,
                    amount_b: 1_000_000_000_000,
                },
                DepositorConfig {
                    name: "bob".to_string(),
                    amount_a: 250_000_000_000,
                    amount_b: 400_000_000_000,
                },
            ],
            amm_share: 50,
            reserve_yield_bps: 1,
        }
    }
}

impl ScenarioConfig {
    /// Resolves the scenario from `path`, then `VAULT_CONFIG`, then the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from));
        let config = match path {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("reading scenario {}", path.display()))?;
                Self::from_json(&raw)
                    .with_context(|| format!("parsing scenario {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.vault.validate()?;
        if self.amm_share > 100 {
            bail!("amm_share must be within 0..=100, got {}", self.amm_share);
        }
        if self.depositors.is_empty() {
            bail!("scenario needs at least one depositor");
        }
        if self.depositors.iter().any(|d| d.name.trim().is_empty()) {
            bail!("depositor names must not be empty");
        }
        Ok(())
    }
}
