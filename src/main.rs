//! CLI entry point for the swapmaker planner.
//!
//! The live engine is driven as a library by whatever hosts the venue
//! connection; the CLI covers offline work — validating configuration and
//! allocations, and planning against a market snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use swapmaker_venue::Address;

use swapmaker::allocation::AllocationSpec;
use swapmaker::config::Config;
use swapmaker::error::{Error, Result};
use swapmaker::planner::{self, PlanReport, RightsCheck, RIGHTS_PER_INTENT};
use swapmaker::portfolio::PortfolioSnapshot;

#[derive(Parser)]
#[command(name = "swapmaker")]
#[command(about = "Portfolio rebalancing and market making for p2p token swaps")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the rebalance plan for an allocation against a market snapshot
    Plan {
        /// Path to allocation.json
        allocation: PathBuf,

        /// Path to a market snapshot JSON (balances, USD prices, rights)
        snapshot: PathBuf,
    },

    /// Validate config and allocation without planning
    Check {
        /// Path to allocation.json
        allocation: PathBuf,
    },
}

/// Offline market snapshot: raw balances by token address, USD prices by
/// symbol, and the staked trading-rights balance.
#[derive(Debug, Deserialize)]
struct MarketSnapshot {
    balances: HashMap<Address, u128>,
    usd_prices: HashMap<String, f64>,
    #[serde(default)]
    rights_balance: u64,
}

impl MarketSnapshot {
    fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Snapshot(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Snapshot(format!("failed to parse {}: {e}", path.display())))
    }
}

fn run_plan(config: &Config, allocation: &AllocationSpec, market: &MarketSnapshot) -> Result<()> {
    let registry = config.registry();

    let mut usd_prices = FxHashMap::default();
    for token in registry.tokens() {
        if let Some(&price) = market.usd_prices.get(&registry.symbol(token)) {
            usd_prices.insert(token, price);
        }
    }
    if let Some(&eth_price) = usd_prices.get(&registry.eth()) {
        usd_prices.insert(registry.weth(), eth_price);
    }
    let balances: FxHashMap<Address, u128> =
        market.balances.iter().map(|(&a, &b)| (a, b)).collect();

    let snapshot = PortfolioSnapshot::compute(balances, usd_prices, &registry);
    println!("Portfolio value: ${:.2}", snapshot.total_value_usd);

    let plan = planner::compute_plan(
        &snapshot,
        &allocation.fractions(),
        &registry,
        config.engine.fraction_tolerance,
    )?;
    let rights = RightsCheck {
        required: RIGHTS_PER_INTENT * plan.needed_intents as u64,
        available: market.rights_balance,
    };

    print!("{}", PlanReport::new(&plan, &registry, Some(rights)));

    if !rights.enough() {
        return Err(Error::InsufficientTradingRights {
            required: rights.required,
            available: rights.available,
            missing: rights.missing(),
        });
    }
    Ok(())
}

fn run_check(config: &Config, allocation: &AllocationSpec) -> Result<()> {
    let registry = config.registry();

    for target in &allocation.targets {
        if registry.props(target.address).is_none() {
            return Err(Error::Allocation(format!(
                "token {} is not in the config registry",
                target.address
            )));
        }
    }

    let deviation = (allocation.sum() - 1.0).abs();
    if deviation > config.engine.fraction_tolerance {
        return Err(Error::FractionSum { deviation });
    }

    println!(
        "OK: {} targets, fractions sum to {:.4}",
        allocation.targets.len(),
        allocation.sum()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Plan {
            allocation,
            snapshot,
        } => load_allocation(&allocation).and_then(|spec| {
            let market = MarketSnapshot::load(&snapshot)?;
            run_plan(&config, &spec, &market)
        }),
        Command::Check { allocation } => {
            load_allocation(&allocation).and_then(|spec| run_check(&config, &spec))
        }
    };

    if let Err(e) = result {
        match &e {
            Error::FractionSum { .. } | Error::InsufficientTradingRights { .. } => {
                eprintln!("\nNot executable: {e}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}

fn load_allocation(path: &Path) -> Result<AllocationSpec> {
    AllocationSpec::load(path)
}
