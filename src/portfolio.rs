//! Portfolio state tracking: balances, USD prices, value, and fractions.

use log::debug;
use rustc_hash::FxHashMap;
use swapmaker_venue::{Address, Venue};

use crate::error::Result;
use crate::token::TokenRegistry;

/// A consistent snapshot of balances, prices, and derived portfolio state.
///
/// Wrapped and native ETH are one allocation bucket to the operator but
/// distinct on-chain balances: `balances` keeps them separate, `fractions`
/// folds WETH into the ETH entry.
#[derive(Debug, Clone, Default)]
pub struct PortfolioSnapshot {
    /// Raw integer units per token.
    pub balances: FxHashMap<Address, u128>,
    /// USD price per human unit, by token. WETH carries ETH's price.
    pub usd_prices: FxHashMap<Address, f64>,
    /// Total portfolio value in USD.
    pub total_value_usd: f64,
    /// Share of portfolio value per token, WETH folded into ETH.
    pub fractions: FxHashMap<Address, f64>,
}

impl PortfolioSnapshot {
    /// Derive total value and fractions from balances and prices.
    pub fn compute(
        balances: FxHashMap<Address, u128>,
        usd_prices: FxHashMap<Address, f64>,
        registry: &TokenRegistry,
    ) -> Self {
        let mut total = 0.0;
        for (token, &balance) in &balances {
            if let (Some(props), Some(&usd)) = (registry.props(*token), usd_prices.get(token)) {
                total += balance as f64 / props.scale() * usd;
            }
        }

        let mut fractions = FxHashMap::default();
        fractions.insert(registry.eth(), 0.0);
        if total > 0.0 {
            for (token, &balance) in &balances {
                if let (Some(props), Some(&usd)) = (registry.props(*token), usd_prices.get(token))
                {
                    let fraction = balance as f64 / props.scale() * usd / total;
                    *fractions.entry(*token).or_insert(0.0) += fraction;
                }
            }
            // Wrapped ETH counts toward the ETH bucket.
            if let Some(weth_fraction) = fractions.remove(&registry.weth()) {
                *fractions.entry(registry.eth()).or_insert(0.0) += weth_fraction;
            }
        }

        PortfolioSnapshot {
            balances,
            usd_prices,
            total_value_usd: total,
            fractions,
        }
    }

    pub fn balance(&self, token: Address) -> u128 {
        self.balances.get(&token).copied().unwrap_or(0)
    }

    pub fn usd_price(&self, token: Address) -> Option<f64> {
        self.usd_prices.get(&token).copied()
    }

    pub fn fraction(&self, token: Address) -> f64 {
        self.fractions.get(&token).copied().unwrap_or(0.0)
    }

    /// Reference exchange rate for a pair in raw units: how many raw taker
    /// units one raw maker unit is worth, from USD valuations and decimal
    /// scaling.
    pub fn reference_price(
        &self,
        registry: &TokenRegistry,
        maker: Address,
        taker: Address,
    ) -> Option<f64> {
        let maker_props = registry.props(maker)?;
        let taker_props = registry.props(taker)?;
        let maker_usd = self.usd_price(maker)?;
        let taker_usd = self.usd_price(taker)?;
        if taker_usd <= 0.0 {
            return None;
        }
        Some(maker_usd / taker_usd * taker_props.scale() / maker_props.scale())
    }
}

/// Fetch USD prices and balances for every registered token and compute a
/// fresh snapshot.
///
/// Venue failures propagate as transient errors; no retry happens here.
pub async fn refresh(
    venue: &dyn Venue,
    registry: &TokenRegistry,
    owner: Address,
) -> Result<PortfolioSnapshot> {
    let mut tokens: Vec<Address> = registry.tokens().collect();
    tokens.sort();

    let mut symbols: Vec<String> = tokens.iter().map(|t| registry.symbol(*t)).collect();
    symbols.sort();
    symbols.dedup();
    let by_symbol = venue.usd_prices(&symbols).await?;

    let mut usd_prices = FxHashMap::default();
    for &token in &tokens {
        if let Some(&price) = by_symbol.get(&registry.symbol(token)) {
            usd_prices.insert(token, price);
        }
    }
    // Price feeds do not quote wrapped ETH; it trades at the ETH price.
    if let Some(&eth_price) = usd_prices.get(&registry.eth()) {
        usd_prices.insert(registry.weth(), eth_price);
    }

    let mut balances = FxHashMap::default();
    for &token in &tokens {
        let balance = venue.token_balance(token, owner).await?;
        balances.insert(token, balance);
    }

    let snapshot = PortfolioSnapshot::compute(balances, usd_prices, registry);
    debug!(
        "portfolio refreshed: {} tokens, total value ${:.2}",
        tokens.len(),
        snapshot.total_value_usd
    );
    Ok(snapshot)
}
