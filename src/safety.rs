//! Price drift detection: the circuit breaker guarding against stale or
//! manipulated pricing.
//!
//! Two independent baselines per pair: the immutable price captured when the
//! algorithm started, and a rolling average of recently quoted prices. A
//! price that drifts too far from either halts the algorithm before it is
//! published.

use std::collections::VecDeque;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::token::Pair;

/// Rolling window length for the per-pair price tracker.
pub const PRICE_TRACKER_WINDOW: usize = 10;

/// Which baseline a drifting price violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    Relative,
    Average,
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftKind::Relative => write!(f, "relative"),
            DriftKind::Average => write!(f, "average"),
        }
    }
}

/// A tripped drift check.
#[derive(Debug, Clone, Copy)]
pub struct DriftTrip {
    pub pair: Pair,
    pub kind: DriftKind,
    pub ratio: f64,
}

/// Bounded sequence of recently quoted prices for one pair.
#[derive(Debug, Clone, Default)]
pub struct PriceTracker {
    samples: VecDeque<f64>,
}

impl PriceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, price: f64) {
        if self.samples.len() == PRICE_TRACKER_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(price);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of the window.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

/// Per-run drift monitor over all active pairs.
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    relative_limit: f64,
    average_limit: f64,
    initial: FxHashMap<Pair, f64>,
    trackers: FxHashMap<Pair, PriceTracker>,
}

impl SafetyMonitor {
    pub fn new(relative_limit: f64, average_limit: f64) -> Self {
        SafetyMonitor {
            relative_limit,
            average_limit,
            initial: FxHashMap::default(),
            trackers: FxHashMap::default(),
        }
    }

    /// Capture the initial-price baseline for a run. The snapshot is taken
    /// once here and never aliased with live prices; trackers start empty.
    pub fn arm(&mut self, initial: FxHashMap<Pair, f64>) {
        self.trackers = initial.keys().map(|&p| (p, PriceTracker::new())).collect();
        self.initial = initial;
    }

    /// Drop all baselines and trackers (run stopped).
    pub fn reset(&mut self) {
        self.initial.clear();
        self.trackers.clear();
    }

    pub fn initial_price(&self, pair: Pair) -> Option<f64> {
        self.initial.get(&pair).copied()
    }

    pub fn tracker_len(&self, pair: Pair) -> usize {
        self.trackers.get(&pair).map(|t| t.len()).unwrap_or(0)
    }

    /// Gate a live price before it may be published.
    ///
    /// The relative check compares against the initial baseline without
    /// recording the sample; the average check records the sample first and
    /// then compares against the window mean.
    pub fn admit(&mut self, pair: Pair, live: f64) -> Result<(), DriftTrip> {
        if let Some(&initial) = self.initial.get(&pair) {
            if initial > 0.0 {
                let ratio = live / initial;
                if ratio > 1.0 + self.relative_limit || ratio < 1.0 - self.relative_limit {
                    return Err(DriftTrip {
                        pair,
                        kind: DriftKind::Relative,
                        ratio,
                    });
                }
            }
        }

        if let Some(tracker) = self.trackers.get_mut(&pair) {
            tracker.push(live);
            if let Some(mean) = tracker.mean() {
                if mean > 0.0 {
                    let ratio = live / mean;
                    if ratio > 1.0 + self.average_limit || ratio < 1.0 - self.average_limit {
                        return Err(DriftTrip {
                            pair,
                            kind: DriftKind::Average,
                            ratio,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
