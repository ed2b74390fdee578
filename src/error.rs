//! Error types for the swapmaker engine.

use std::path::PathBuf;

use crate::safety::DriftKind;

/// All errors that can occur during engine operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("allocation file error: {0}")]
    Allocation(String),

    #[error("failed to read allocation file {path}: {source}")]
    AllocationRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse allocation JSON: {0}")]
    AllocationParse(#[from] serde_json::Error),

    #[error("snapshot file error: {0}")]
    Snapshot(String),

    /// Goal fractions do not sum to 1 within the configured tolerance.
    #[error("goal fractions sum deviates from 1 by {deviation:.6}")]
    FractionSum { deviation: f64 },

    /// Not enough staked trading rights to publish the planned intents.
    #[error(
        "insufficient trading rights: need {required}, have {available} (missing {missing})"
    )]
    InsufficientTradingRights {
        required: u64,
        available: u64,
        missing: u64,
    },

    /// A live price drifted too far from its baseline.
    #[error("{kind} price drift on {pair}: ratio {ratio:.4}")]
    PriceDrift {
        pair: String,
        kind: DriftKind,
        ratio: f64,
    },

    /// A rebalancing run is already active.
    #[error("rebalancing algorithm is already active")]
    AlreadyActive,

    /// Posted intents were not confirmed when read back from the venue.
    #[error("intent round-trip failed: {0}")]
    IntentRoundTrip(String),

    #[error("venue error: {0}")]
    Venue(#[from] swapmaker_venue::VenueError),
}

pub type Result<T> = std::result::Result<T, Error>;
