//! GOAL→DELTA rebalance planning.
//!
//! Converts goal fractions into goal/delta balances and the set of intents
//! that must be opened. The diff itself is pure; the trading-rights
//! sufficiency check is the one asynchronous lookup.

use log::debug;
use rustc_hash::FxHashMap;
use swapmaker_venue::{Address, Intent, Venue};

use crate::error::{Error, Result};
use crate::portfolio::PortfolioSnapshot;
use crate::token::TokenRegistry;

/// Trading-rights tokens staked per published intent.
pub const RIGHTS_PER_INTENT: u64 = 250;

/// A computed rebalance plan.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Goal balance per token in raw units, before flooring.
    pub goal_balances: FxHashMap<Address, f64>,
    /// floor(goal − current) per token; positive = acquire, negative =
    /// dispose. ETH's delta has the current WETH balance subtracted.
    pub deltas: FxHashMap<Address, i128>,
    /// Raw 18-decimal WETH still needed to fund all buy-side deltas;
    /// negative means the current WETH balance already covers them.
    pub needed_weth: i128,
    /// Number of distinct trading pairs that must be opened.
    pub needed_intents: usize,
}

impl Plan {
    pub fn delta(&self, token: Address) -> i128 {
        self.deltas.get(&token).copied().unwrap_or(0)
    }

    /// Derive the intent list: buys trade WETH for the token, sells trade
    /// the token for ETH. Sorted for deterministic publication order.
    pub fn intents(&self, registry: &TokenRegistry) -> Vec<Intent> {
        let mut intents: Vec<Intent> = self
            .deltas
            .iter()
            .filter(|(token, delta)| !registry.is_eth_family(**token) && **delta != 0)
            .map(|(&token, &delta)| {
                if delta > 0 {
                    Intent::new(registry.weth(), token)
                } else {
                    Intent::new(token, registry.eth())
                }
            })
            .collect();
        intents.sort();
        intents
    }
}

/// Compute a rebalance plan from a fresh snapshot and goal fractions.
///
/// Fails with a configuration error when the fractions do not sum to 1
/// within `tolerance`; no partial plan is produced in that case.
pub fn compute_plan(
    snapshot: &PortfolioSnapshot,
    goals: &FxHashMap<Address, f64>,
    registry: &TokenRegistry,
    tolerance: f64,
) -> Result<Plan> {
    let sum: f64 = goals.values().sum();
    let deviation = (sum - 1.0).abs();
    if deviation > tolerance {
        return Err(Error::FractionSum { deviation });
    }

    let mut goal_balances = FxHashMap::default();
    let mut deltas = FxHashMap::default();

    for (&token, &fraction) in goals {
        if token == registry.weth() {
            // WETH is part of the ETH bucket; it has no goal of its own.
            continue;
        }
        let Some(props) = registry.props(token) else {
            continue;
        };
        let Some(usd) = snapshot.usd_price(token) else {
            continue;
        };
        if usd <= 0.0 {
            continue;
        }
        let goal = snapshot.total_value_usd * fraction / usd * props.scale();
        let delta = (goal - snapshot.balance(token) as f64).floor() as i128;
        goal_balances.insert(token, goal);
        deltas.insert(token, delta);
    }

    // Inbound WETH counts as already-acquired ETH exposure: receiving more
    // ETH always works, and reducing ETH requires a manual wrap anyway.
    if snapshot.balances.contains_key(&registry.weth()) {
        let weth_balance = snapshot.balance(registry.weth());
        *deltas.entry(registry.eth()).or_insert(0) -= weth_balance as i128;
    }

    let needed_weth = compute_needed_weth(snapshot, &deltas, registry);
    let needed_intents = deltas
        .iter()
        .filter(|(token, delta)| !registry.is_eth_family(**token) && **delta != 0)
        .count();

    debug!(
        "plan: {} intents, needed WETH {needed_weth} raw units",
        needed_intents
    );

    Ok(Plan {
        goal_balances,
        deltas,
        needed_weth,
        needed_intents,
    })
}

/// WETH required to fund every buy-side delta, in raw 18-decimal units,
/// net of the WETH already held.
fn compute_needed_weth(
    snapshot: &PortfolioSnapshot,
    deltas: &FxHashMap<Address, i128>,
    registry: &TokenRegistry,
) -> i128 {
    let Some(eth_usd) = snapshot.usd_price(registry.eth()) else {
        return 0;
    };
    if eth_usd <= 0.0 {
        return 0;
    }

    let mut selling_eth = 0.0; // human ETH units
    for (&token, &delta) in deltas {
        if registry.is_eth_family(token) || delta <= 0 {
            continue;
        }
        let Some(props) = registry.props(token) else {
            continue;
        };
        let Some(usd) = snapshot.usd_price(token) else {
            continue;
        };
        selling_eth += delta as f64 / props.scale() * usd / eth_usd;
    }

    let weth_balance = snapshot.balance(registry.weth());
    (selling_eth * 1e18 - weth_balance as f64) as i128
}

/// Result of the trading-rights sufficiency check.
#[derive(Debug, Clone, Copy)]
pub struct RightsCheck {
    pub required: u64,
    pub available: u64,
}

impl RightsCheck {
    pub fn enough(&self) -> bool {
        self.available >= self.required
    }

    /// Exact shortfall; zero when sufficient.
    pub fn missing(&self) -> u64 {
        self.required.saturating_sub(self.available)
    }
}

/// Check the staked trading-rights balance against the plan's intent count.
///
/// The lookup may fail transiently; until it succeeds the plan is not
/// executable.
pub async fn check_trading_rights(
    venue: &dyn Venue,
    owner: Address,
    needed_intents: usize,
) -> Result<RightsCheck> {
    let available = venue.trading_rights_balance(owner).await?;
    let required = RIGHTS_PER_INTENT * needed_intents as u64;
    Ok(RightsCheck {
        required,
        available,
    })
}

/// Human-readable plan summary for the CLI.
#[derive(Debug, Clone)]
pub struct PlanReport {
    entries: Vec<PlanEntry>,
    needed_weth: f64,
    needed_intents: usize,
    rights: Option<RightsCheck>,
}

#[derive(Debug, Clone)]
struct PlanEntry {
    symbol: String,
    delta_raw: i128,
    delta_human: f64,
}

impl PlanReport {
    pub fn new(plan: &Plan, registry: &TokenRegistry, rights: Option<RightsCheck>) -> Self {
        let mut entries: Vec<PlanEntry> = plan
            .deltas
            .iter()
            .map(|(&token, &delta)| {
                let scale = registry.props(token).map(|p| p.scale()).unwrap_or(1.0);
                PlanEntry {
                    symbol: registry.symbol(token),
                    delta_raw: delta,
                    delta_human: delta as f64 / scale,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        PlanReport {
            entries,
            needed_weth: plan.needed_weth as f64 / 1e18,
            needed_intents: plan.needed_intents,
            rights,
        }
    }
}

impl std::fmt::Display for PlanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "REBALANCE PLAN:")?;
        writeln!(f, "  {:8} {:>10} {:>24}  {}", "Token", "Action", "Raw units", "Amount")?;
        for e in &self.entries {
            let action = if e.delta_raw > 0 {
                "ACQUIRE"
            } else if e.delta_raw < 0 {
                "DISPOSE"
            } else {
                "HOLD"
            };
            writeln!(
                f,
                "  {:8} {:>10} {:>24}  {:.4}",
                e.symbol,
                action,
                e.delta_raw.abs(),
                e.delta_human.abs(),
            )?;
        }
        writeln!(f, "\n  Intents to open: {}", self.needed_intents)?;
        if self.needed_weth > 0.0 {
            writeln!(f, "  WETH to wrap first: {:.6}", self.needed_weth)?;
        }
        if let Some(rights) = &self.rights {
            if rights.enough() {
                writeln!(
                    f,
                    "  Trading rights: {} available >= {} required",
                    rights.available, rights.required
                )?;
            } else {
                writeln!(
                    f,
                    "  Trading rights: {} available < {} required (missing {})",
                    rights.available,
                    rights.required,
                    rights.missing()
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenProps;
    use swapmaker_venue::mock::MockVenue;

    fn weth() -> Address {
        "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().unwrap()
    }
    fn token_a() -> Address {
        "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap()
    }
    fn token_b() -> Address {
        "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".parse().unwrap()
    }
    fn maker() -> Address {
        "0x1111111111111111111111111111111111111111".parse().unwrap()
    }

    fn registry() -> TokenRegistry {
        let mut r = TokenRegistry::new(weth());
        r.insert(weth(), TokenProps::new("WETH", 18));
        r.insert(token_a(), TokenProps::new("AAA", 18));
        r.insert(token_b(), TokenProps::new("BBB", 18));
        r
    }

    /// $1000 portfolio, half in A ($2) and half in B ($4).
    fn snapshot() -> PortfolioSnapshot {
        let mut balances = FxHashMap::default();
        balances.insert(token_a(), 250_000_000_000_000_000_000u128); // 250 AAA
        balances.insert(token_b(), 125_000_000_000_000_000_000u128); // 125 BBB
        balances.insert(weth(), 0u128);
        balances.insert(Address::ETH, 0u128);

        let mut usd_prices = FxHashMap::default();
        usd_prices.insert(token_a(), 2.0);
        usd_prices.insert(token_b(), 4.0);
        usd_prices.insert(weth(), 2000.0);
        usd_prices.insert(Address::ETH, 2000.0);

        PortfolioSnapshot::compute(balances, usd_prices, &registry())
    }

    fn goals_60_40() -> FxHashMap<Address, f64> {
        let mut goals = FxHashMap::default();
        goals.insert(token_a(), 0.6);
        goals.insert(token_b(), 0.4);
        goals
    }

    #[test]
    fn worked_example_60_40() {
        let plan = compute_plan(&snapshot(), &goals_60_40(), &registry(), 0.001).unwrap();

        // Goal A = $600 / $2 = 300 AAA → delta +50; goal B = $400 / $4 = 100 BBB → delta −25.
        assert_eq!(plan.delta(token_a()), 50_000_000_000_000_000_000);
        assert_eq!(plan.delta(token_b()), -25_000_000_000_000_000_000);
        assert_eq!(plan.needed_intents, 2);

        let intents = plan.intents(&registry());
        assert_eq!(intents.len(), 2);
        // Buy A with WETH, sell B for ETH.
        assert!(intents.contains(&Intent::new(weth(), token_a())));
        assert!(intents.contains(&Intent::new(token_b(), Address::ETH)));
    }

    #[test]
    fn needed_weth_covers_buy_side() {
        let plan = compute_plan(&snapshot(), &goals_60_40(), &registry(), 0.001).unwrap();
        // Buying 50 AAA at $2 costs $100 = 0.05 ETH = 5e16 raw, no WETH held.
        let expected = 50_000_000_000_000_000i128;
        assert!((plan.needed_weth - expected).abs() < 1_000);
    }

    #[test]
    fn held_weth_reduces_needed_weth() {
        let mut snap = snapshot();
        snap.balances.insert(weth(), 20_000_000_000_000_000u128); // 0.02 WETH
        let plan = compute_plan(&snap, &goals_60_40(), &registry(), 0.001).unwrap();
        let expected = 30_000_000_000_000_000i128;
        assert!((plan.needed_weth - expected).abs() < 1_000);
    }

    #[test]
    fn fraction_sum_gate() {
        let mut goals = goals_60_40();
        goals.insert(token_b(), 0.3); // sums to 0.9
        let err = compute_plan(&snapshot(), &goals, &registry(), 0.001).unwrap_err();
        match err {
            Error::FractionSum { deviation } => assert!((deviation - 0.1).abs() < 1e-9),
            other => panic!("expected FractionSum, got {other}"),
        }
    }

    #[test]
    fn fraction_sum_within_tolerance_passes() {
        let mut goals = FxHashMap::default();
        goals.insert(token_a(), 0.6004);
        goals.insert(token_b(), 0.4001);
        assert!(compute_plan(&snapshot(), &goals, &registry(), 0.001).is_ok());
    }

    #[test]
    fn eth_delta_subtracts_weth_balance() {
        let registry = registry();
        let mut balances = FxHashMap::default();
        balances.insert(Address::ETH, 1_000_000_000_000_000_000u128); // 1 ETH
        balances.insert(weth(), 500_000_000_000_000_000u128); // 0.5 WETH
        let mut usd_prices = FxHashMap::default();
        usd_prices.insert(Address::ETH, 2000.0);
        usd_prices.insert(weth(), 2000.0);
        let snap = PortfolioSnapshot::compute(balances, usd_prices, &registry);

        let mut goals = FxHashMap::default();
        goals.insert(Address::ETH, 1.0);
        let plan = compute_plan(&snap, &goals, &registry, 0.001).unwrap();

        // Goal 1.5 ETH, holding 1 ETH + 0.5 WETH → nothing to do.
        assert_eq!(plan.delta(Address::ETH), 0);
        assert_eq!(plan.needed_intents, 0);
    }

    #[test]
    fn weth_goal_entry_is_ignored() {
        let mut goals = goals_60_40();
        goals.remove(&token_b());
        goals.insert(weth(), 0.4);
        let plan = compute_plan(&snapshot(), &goals, &registry(), 0.001).unwrap();
        assert!(!plan.goal_balances.contains_key(&weth()));
    }

    #[test]
    fn unknown_token_is_skipped() {
        let unknown: Address = "0x4444444444444444444444444444444444444444".parse().unwrap();
        let mut goals = FxHashMap::default();
        goals.insert(token_a(), 0.5);
        goals.insert(unknown, 0.5);
        let plan = compute_plan(&snapshot(), &goals, &registry(), 0.001).unwrap();
        assert!(!plan.deltas.contains_key(&unknown));
        assert_eq!(plan.needed_intents, 1);
    }

    #[tokio::test]
    async fn rights_check_shortfall() {
        let venue = MockVenue::builder().with_rights(600).build();
        let rights = check_trading_rights(&venue, maker(), 3).await.unwrap();
        assert_eq!(rights.required, 750);
        assert!(!rights.enough());
        assert_eq!(rights.missing(), 150);
    }

    #[tokio::test]
    async fn rights_check_sufficient() {
        let venue = MockVenue::builder().with_rights(500).build();
        let rights = check_trading_rights(&venue, maker(), 2).await.unwrap();
        assert!(rights.enough());
        assert_eq!(rights.missing(), 0);
    }

    #[tokio::test]
    async fn rights_lookup_failure_propagates() {
        let venue = MockVenue::builder().build();
        venue.fail_rights(true);
        assert!(check_trading_rights(&venue, maker(), 1).await.is_err());
    }

    #[test]
    fn report_lists_actions() {
        let plan = compute_plan(&snapshot(), &goals_60_40(), &registry(), 0.001).unwrap();
        let report = PlanReport::new(
            &plan,
            &registry(),
            Some(RightsCheck {
                required: 500,
                available: 1000,
            }),
        );
        let s = format!("{report}");
        assert!(s.contains("AAA"));
        assert!(s.contains("ACQUIRE"));
        assert!(s.contains("DISPOSE"));
        assert!(s.contains("Intents to open: 2"));
    }
}
