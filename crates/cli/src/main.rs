//! Command Line Interface for the range vault simulator.
mod scenario;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use range_vault_domain::math::full_math::Rounding;
use range_vault_domain::token::{Address, TokenPair};
use range_vault_domain::value_objects::{Percentage, SqrtPrice};
use range_vault_engine::state::TickRange;
use range_vault_engine::vault::{Vault, VaultSetup};
use range_vault_engine::venues::YieldReserve;
use range_vault_simulation::market::SimulatedMarket;
use range_vault_simulation::price_path::{GeometricBrownianMotion, PricePathGenerator};
use scenario::ScenarioConfig;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const VAULT: &str = "vault";
const GOVERNANCE: &str = "governance";
const KEEPER: &str = "keeper";
const TREASURY: &str = "treasury";

#[derive(Parser)]
#[command(name = "range-vault")]
#[command(about = "Multi-venue range vault simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated vault through a random price path
    Simulate {
        /// Scenario file (JSON); falls back to VAULT_CONFIG, then built-in defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of trading rounds
        #[arg(short, long, default_value_t = 30)]
        rounds: usize,

        /// Delay between rounds in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },
    /// Print the resolved scenario as JSON
    ShowConfig {
        /// Scenario file (JSON); falls back to VAULT_CONFIG, then built-in defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            rounds,
            interval_ms,
        } => {
            let scenario = ScenarioConfig::load(config.as_deref())?;
            simulate(&scenario, rounds, interval_ms).await?;
        }
        Commands::ShowConfig { config } => {
            let scenario = ScenarioConfig::load(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&scenario)?);
        }
    }

    Ok(())
}

struct Outcome {
    name: String,
    deposited: TokenPair,
    withdrawn: TokenPair,
}

async fn simulate(scenario: &ScenarioConfig, rounds: usize, interval_ms: u64) -> Result<()> {
    println!("📡 Building simulated market...");
    let market = SimulatedMarket::new(&scenario.market).context("building market")?;
    let spacing = scenario.market.tick_spacing;
    let initial = scenario.market.initial_tick.div_euclid(spacing) * spacing;

    let vault = Vault::new(
        VaultSetup {
            token_a: scenario.token_a.clone(),
            token_b: scenario.token_b.clone(),
            address: Address::from(VAULT),
            governance: Address::from(GOVERNANCE),
            rebalancer: Address::from(KEEPER),
            range: TickRange::new(initial - spacing, initial + spacing),
            config: scenario.vault.clone(),
        },
        market.venues(),
    )?;
    let keeper = Address::from(KEEPER);

    let mut outcomes = Vec::with_capacity(scenario.depositors.len());
    for depositor in &scenario.depositors {
        let who = Address::new(depositor.name.as_str());
        market.wallets.fund(&who, depositor.amounts());
        let receipt = vault
            .deposit(&who, depositor.amounts(), TokenPair::ZERO, &who)
            .with_context(|| format!("deposit of {}", depositor.name))?;
        info!(
            depositor = %who,
            shares = receipt.shares,
            taken_a = receipt.taken.a,
            taken_b = receipt.taken.b,
            "Depositor seeded"
        );
        outcomes.push(Outcome {
            name: depositor.name.clone(),
            deposited: receipt.taken,
            withdrawn: TokenPair::ZERO,
        });
    }
    vault.rebalance(&keeper, scenario.amm_share)?;

    let path = &scenario.price_path;
    let ticks = GeometricBrownianMotion::new(
        scenario.market.initial_tick,
        path.drift,
        path.volatility,
        path.time_step,
        path.seed,
    )
    .generate(rounds);
    let reserve_yield = Percentage::from_bps(scenario.reserve_yield_bps)?;

    println!("🚀 Running {rounds} rounds...");
    let mut ticker = interval(Duration::from_millis(interval_ms.max(1)));
    let mut failed = 0usize;
    for (round, tick) in ticks.into_iter().skip(1).enumerate() {
        ticker.tick().await;

        market.pool.trade_to(SqrtPrice::from_tick(tick)?)?;
        market.reserve_a.accrue_yield(reserve_yield)?;
        market.reserve_b.accrue_yield(reserve_yield)?;

        match vault.rebalance(&keeper, scenario.amm_share) {
            Ok(report) => info!(
                round,
                tick,
                lower = report.range.lower,
                upper = report.range.upper,
                fee_a = report.fee.a,
                fee_b = report.fee.b,
                "Round completed"
            ),
            Err(err) => {
                failed += 1;
                warn!(round, tick, error = %err, "Rebalance failed");
            }
        }
    }

    for outcome in &mut outcomes {
        let who = Address::new(outcome.name.as_str());
        let shares = vault.balance_of(&who)?;
        if shares == 0 {
            continue;
        }
        outcome.withdrawn = vault
            .withdraw(&who, shares, TokenPair::ZERO, &who)
            .with_context(|| format!("withdrawal of {}", outcome.name))?
            .amounts;
    }
    let fees = vault.sweep_fees(&Address::from(GOVERNANCE), &Address::from(TREASURY))?;
    let price = market.pool.price();
    let vault_address = Address::from(VAULT);
    let leftover = (
        market.reserve_a.balance_of_shares(&vault_address),
        market.reserve_b.balance_of_shares(&vault_address),
    );

    println!("\n📊 Simulation Results");
    println!("════════════════════════════════════");
    println!("Rounds:           {rounds} ({failed} failed rebalances)");
    println!("Final Price:      {:.6}", price.to_decimal()?);
    println!(
        "Protocol Fees:    {} {} / {} {}",
        fees.a, scenario.token_a.symbol, fees.b, scenario.token_b.symbol
    );
    for outcome in &outcomes {
        println!(
            "{:<17} in {} -> out {} (value change {:.4}%)",
            format!("{}:", outcome.name),
            outcome.deposited,
            outcome.withdrawn,
            value_change(outcome, price)?
        );
    }
    println!("Reserve dust:     {} / {} shares", leftover.0, leftover.1);
    println!("════════════════════════════════════");

    Ok(())
}

/// Percent change of the withdrawn value over the deposited value, both priced in B.
fn value_change(outcome: &Outcome, price: SqrtPrice) -> Result<f64> {
    let value = |amounts: TokenPair| -> Result<f64> {
        let a_in_b = price.quote_a_in_b(amounts.a, Rounding::Floor)?;
        Ok(a_in_b as f64 + amounts.b as f64)
    };
    let deposited = value(outcome.deposited)?;
    if deposited == 0.0 {
        return Ok(0.0);
    }
    Ok((value(outcome.withdrawn)? - deposited) / deposited * 100.0)
}
