//! Venue trait and collaborator interfaces for swapmaker.
//!
//! The engine talks to the outside world through the narrow interfaces here:
//! a price/balance source, the trading-rights ledger, the order transport,
//! and a fire-and-forget notification sink. All of them are treated as
//! unreliable; retry policy belongs to the caller, never to the engine core.

pub mod error;
pub mod mock;
pub mod types;

pub use error::VenueError;
pub use types::*;

use std::collections::HashMap;

use async_trait::async_trait;

/// A venue connection: price/balance source, trading-rights ledger, and
/// order transport in one collaborator.
#[async_trait]
pub trait Venue: Send + Sync {
    /// Fetch USD prices for a set of token symbols.
    ///
    /// Symbols missing from the result are treated as unpriced, not as an
    /// error.
    async fn usd_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>, VenueError>;

    /// Current raw-unit balance of `token` held by `holder`.
    async fn token_balance(&self, token: Address, holder: Address) -> Result<u128, VenueError>;

    /// Staked trading-rights token balance of `holder`.
    async fn trading_rights_balance(&self, holder: Address) -> Result<u64, VenueError>;

    /// Publish the set of trading pairs the engine is willing to quote.
    async fn post_intents(&self, intents: &[Intent]) -> Result<(), VenueError>;

    /// Read back the currently published intents.
    async fn intents(&self) -> Result<Vec<Intent>, VenueError>;

    /// Sign an order on behalf of the maker wallet.
    async fn sign_order(&self, fields: OrderFields) -> Result<SignedOrder, VenueError>;

    /// Deliver a signed order to the counterparty that requested it.
    async fn send_response(
        &self,
        to: Address,
        request_id: u64,
        order: &SignedOrder,
    ) -> Result<(), VenueError>;
}

/// Fire-and-forget notification sink.
///
/// The engine never awaits or interprets a result; a sink that drops
/// messages is acceptable.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that forwards messages to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("{message}");
    }
}
