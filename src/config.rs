//! TOML configuration loading and validation.

use std::path::Path;

use serde::Deserialize;
use swapmaker_venue::Address;

use crate::error::{Error, Result};
use crate::token::{TokenProps, TokenRegistry};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub maker: MakerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
    /// Requester addresses whose order requests are ignored.
    #[serde(default)]
    pub blacklist: Vec<Address>,
}

/// The maker wallet and the wrapped-ETH contract it trades through.
#[derive(Debug, Clone, Deserialize)]
pub struct MakerConfig {
    pub address: Address,
    pub weth: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_expiration")]
    pub expiration_secs: u64,
    #[serde(default = "default_tolerance")]
    pub fraction_tolerance: f64,
}

fn default_poll_interval() -> u64 {
    30_000
}
fn default_expiration() -> u64 {
    300
}
fn default_tolerance() -> f64 {
    0.001
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            poll_interval_ms: default_poll_interval(),
            expiration_secs: default_expiration(),
            fraction_tolerance: default_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_relative_limit")]
    pub relative_change_limit: f64,
    #[serde(default = "default_average_limit")]
    pub average_change_limit: f64,
    #[serde(default = "default_true")]
    pub continuous_price_updates: bool,
    #[serde(default = "default_modifier")]
    pub price_modifier: f64,
}

fn default_relative_limit() -> f64 {
    0.20
}
fn default_average_limit() -> f64 {
    0.10
}
fn default_true() -> bool {
    true
}
fn default_modifier() -> f64 {
    1.0
}

impl Default for SafetyConfig {
    fn default() -> Self {
        SafetyConfig {
            relative_change_limit: default_relative_limit(),
            average_change_limit: default_average_limit(),
            continuous_price_updates: default_true(),
            price_modifier: default_modifier(),
        }
    }
}

/// One `[[tokens]]` registry entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string (useful for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.maker.address.is_eth() {
            return Err(Error::Config("maker address must not be the zero address".into()));
        }
        if self.maker.weth.is_eth() {
            return Err(Error::Config("weth address must not be the zero address".into()));
        }
        if self.engine.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be > 0".into()));
        }
        if self.engine.expiration_secs == 0 {
            return Err(Error::Config("expiration_secs must be > 0".into()));
        }
        if self.engine.fraction_tolerance <= 0.0 || self.engine.fraction_tolerance > 0.1 {
            return Err(Error::Config(
                "fraction_tolerance must be in (0.0, 0.1]".into(),
            ));
        }
        if self.safety.relative_change_limit <= 0.0 || self.safety.relative_change_limit >= 1.0 {
            return Err(Error::Config(
                "relative_change_limit must be in (0.0, 1.0)".into(),
            ));
        }
        if self.safety.average_change_limit <= 0.0 || self.safety.average_change_limit >= 1.0 {
            return Err(Error::Config(
                "average_change_limit must be in (0.0, 1.0)".into(),
            ));
        }
        if self.safety.price_modifier <= 0.0 {
            return Err(Error::Config("price_modifier must be > 0".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.tokens {
            if !seen.insert(entry.address) {
                return Err(Error::Config(format!(
                    "duplicate token address: {}",
                    entry.address
                )));
            }
            if entry.symbol.is_empty() {
                return Err(Error::Config(format!(
                    "empty symbol for token {}",
                    entry.address
                )));
            }
        }
        if !self.tokens.iter().any(|t| t.address == self.maker.weth) {
            return Err(Error::Config(
                "weth address must appear in the token registry".into(),
            ));
        }
        Ok(())
    }

    /// Build the token registry from the `[[tokens]]` entries.
    pub fn registry(&self) -> TokenRegistry {
        let mut registry = TokenRegistry::new(self.maker.weth);
        for entry in &self.tokens {
            registry.insert(entry.address, TokenProps::new(&entry.symbol, entry.decimals));
        }
        registry
    }
}
