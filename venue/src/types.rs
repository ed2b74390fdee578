//! Shared venue types: addresses, intents, order requests, signed orders.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 20-byte on-chain address, used for both tokens and counterparty wallets.
///
/// The zero address denotes native ETH.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Native ETH sentinel (the zero address).
    pub const ETH: Address = Address([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_eth(&self) -> bool {
        *self == Self::ETH
    }
}

/// Error parsing an address from its hex form.
#[derive(Debug, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct ParseAddressError(String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_part).map_err(|_| ParseAddressError(s.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ParseAddressError(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Addresses serialize as their `0x`-prefixed hex form.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e: ParseAddressError| D::Error::custom(e))
    }
}

/// A declared willingness to trade a (maker, taker) pair.
///
/// The maker token is what the engine sells, the taker token is what it
/// receives in return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Intent {
    pub maker_token: Address,
    pub taker_token: Address,
}

impl Intent {
    pub fn new(maker_token: Address, taker_token: Address) -> Self {
        Intent {
            maker_token,
            taker_token,
        }
    }
}

/// An inbound swap request from a counterparty.
///
/// Exactly one of `maker_amount` / `taker_amount` should be set; the engine
/// fills in the other side from its limit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Transport-level request id, echoed back in the response.
    pub id: u64,
    /// Wallet of the requesting counterparty.
    pub taker_address: Address,
    pub maker_token: Address,
    pub taker_token: Address,
    pub maker_amount: Option<u128>,
    pub taker_amount: Option<u128>,
}

/// The fields of an order prior to signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFields {
    pub maker_address: Address,
    pub maker_amount: u128,
    pub maker_token: Address,
    pub taker_address: Address,
    pub taker_amount: u128,
    pub taker_token: Address,
    /// Absolute expiration, unix seconds.
    pub expiration: u64,
    pub nonce: String,
}

/// Opaque order signature; unique per signed order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(pub String);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signed, outstanding offer as returned to the counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
    #[serde(flatten)]
    pub fields: OrderFields,
    pub signature: Signature,
}
