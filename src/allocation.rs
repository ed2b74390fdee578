//! Goal allocation (allocation.json) loading and validation.

use std::path::Path;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use swapmaker_venue::Address;

use crate::error::{Error, Result};

/// A goal allocation from the operator: target fractions of portfolio value
/// per token.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationSpec {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub targets: Vec<AllocationTarget>,
}

/// A single target: token address + fraction of portfolio value.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationTarget {
    pub address: Address,
    pub fraction: f64,
}

impl AllocationSpec {
    /// Load and validate an allocation.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::AllocationRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let spec: AllocationSpec = serde_json::from_str(&contents)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: AllocationSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Structural validation. The fraction-sum tolerance gate belongs to the
    /// planner, which re-checks it on every plan.
    fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(Error::Allocation("targets list is empty".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for t in &self.targets {
            if !seen.insert(t.address) {
                return Err(Error::Allocation(format!(
                    "duplicate token: {}",
                    t.address
                )));
            }
        }

        for t in &self.targets {
            if !(t.fraction > 0.0 && t.fraction <= 1.0) {
                return Err(Error::Allocation(format!(
                    "fraction for {} ({}) must be in (0.0, 1.0] — omit the token instead",
                    t.address, t.fraction
                )));
            }
        }

        Ok(())
    }

    /// Goal fractions keyed by token address, for the planner.
    pub fn fractions(&self) -> FxHashMap<Address, f64> {
        self.targets
            .iter()
            .map(|t| (t.address, t.fraction))
            .collect()
    }

    /// Sum of all goal fractions.
    pub fn sum(&self) -> f64 {
        self.targets.iter().map(|t| t.fraction).sum()
    }
}
