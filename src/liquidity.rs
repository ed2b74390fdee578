//! Per-pair tradable liquidity accounting.
//!
//! The liquidity book is the single source of truth for how much of a maker
//! token can still be promised in new quotes, net of outstanding open-order
//! commitments. It must be recomputed after every balance refresh, limit
//! change, and order lifecycle event.

use rustc_hash::FxHashMap;
use swapmaker_venue::Address;

use crate::token::Pair;

/// Per-pair limit amounts and derived liquidity.
///
/// Absent entries mean "unset" — a pair with no configured limit or no known
/// maker balance has no liquidity entry at all, which is different from a
/// pair whose liquidity is currently zero.
#[derive(Debug, Clone, Default)]
pub struct LiquidityBook {
    limits: FxHashMap<Pair, u128>,
    liquidity: FxHashMap<Pair, i128>,
}

impl LiquidityBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum maker-side quantity quotable on a pair.
    pub fn set_limit(&mut self, pair: Pair, amount: u128) {
        self.limits.insert(pair, amount);
    }

    pub fn limit(&self, pair: Pair) -> Option<u128> {
        self.limits.get(&pair).copied()
    }

    pub fn remove_limit(&mut self, pair: Pair) {
        self.limits.remove(&pair);
        self.liquidity.remove(&pair);
    }

    pub fn clear(&mut self) {
        self.limits.clear();
        self.liquidity.clear();
    }

    /// Current liquidity for a pair; `None` when unset.
    pub fn liquidity(&self, pair: Pair) -> Option<i128> {
        self.liquidity.get(&pair).copied()
    }

    /// Recompute every pair's liquidity:
    /// min(limit, maker balance) − Σ maker amounts of open orders on the pair.
    pub fn recompute(
        &mut self,
        balances: &FxHashMap<Address, u128>,
        open_orders: impl IntoIterator<Item = (Pair, u128)>,
    ) {
        let mut committed: FxHashMap<Pair, u128> = FxHashMap::default();
        for (pair, maker_amount) in open_orders {
            *committed.entry(pair).or_insert(0) += maker_amount;
        }

        let mut liquidity = FxHashMap::default();
        for (&pair, &limit) in &self.limits {
            let Some(&balance) = balances.get(&pair.maker) else {
                continue;
            };
            let available = limit.min(balance) as i128;
            let reserved = committed.get(&pair).copied().unwrap_or(0) as i128;
            liquidity.insert(pair, available - reserved);
        }
        self.liquidity = liquidity;
    }
}
