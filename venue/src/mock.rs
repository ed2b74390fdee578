//! Mock venue for testing — implements the `Venue` trait with configurable
//! state, recorded calls, and per-call failure injection.
//!
//! ```ignore
//! use swapmaker_venue::mock::MockVenue;
//!
//! let venue = MockVenue::builder()
//!     .with_usd_price("AST", 0.25)
//!     .with_balance(ast, maker, 4_000_0000)
//!     .with_rights(1000)
//!     .build();
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::VenueError;
use crate::types::*;
use crate::{Notifier, Venue};

/// Builder for `MockVenue`.
pub struct MockVenueBuilder {
    usd_prices: HashMap<String, f64>,
    balances: HashMap<(Address, Address), u128>,
    rights: u64,
}

impl MockVenueBuilder {
    pub fn with_usd_price(mut self, symbol: &str, price: f64) -> Self {
        self.usd_prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_balance(mut self, token: Address, holder: Address, amount: u128) -> Self {
        self.balances.insert((token, holder), amount);
        self
    }

    pub fn with_rights(mut self, rights: u64) -> Self {
        self.rights = rights;
        self
    }

    pub fn build(self) -> MockVenue {
        MockVenue {
            usd_prices: Mutex::new(self.usd_prices),
            balances: Mutex::new(self.balances),
            rights: AtomicU64::new(self.rights),
            published: Mutex::new(Vec::new()),
            responses: Mutex::new(Vec::new()),
            sign_counter: AtomicU64::new(0),
            price_fetches: AtomicU64::new(0),
            balance_fetches: AtomicU64::new(0),
            fail_prices: AtomicBool::new(false),
            fail_balances: AtomicBool::new(false),
            fail_rights: AtomicBool::new(false),
            fail_post: AtomicBool::new(false),
            fail_sign: AtomicBool::new(false),
            swallow_intents: AtomicBool::new(false),
        }
    }
}

/// A mock venue with interior mutability so tests can reshape the market
/// while the engine is running.
pub struct MockVenue {
    usd_prices: Mutex<HashMap<String, f64>>,
    balances: Mutex<HashMap<(Address, Address), u128>>,
    rights: AtomicU64,
    published: Mutex<Vec<Intent>>,
    responses: Mutex<Vec<(Address, u64, SignedOrder)>>,
    sign_counter: AtomicU64,
    price_fetches: AtomicU64,
    balance_fetches: AtomicU64,
    fail_prices: AtomicBool,
    fail_balances: AtomicBool,
    fail_rights: AtomicBool,
    fail_post: AtomicBool,
    fail_sign: AtomicBool,
    swallow_intents: AtomicBool,
}

impl MockVenue {
    pub fn builder() -> MockVenueBuilder {
        MockVenueBuilder {
            usd_prices: HashMap::new(),
            balances: HashMap::new(),
            rights: 0,
        }
    }

    pub fn set_usd_price(&self, symbol: &str, price: f64) {
        self.usd_prices
            .lock()
            .unwrap()
            .insert(symbol.to_string(), price);
    }

    pub fn set_balance(&self, token: Address, holder: Address, amount: u128) {
        self.balances.lock().unwrap().insert((token, holder), amount);
    }

    pub fn set_rights(&self, rights: u64) {
        self.rights.store(rights, Ordering::SeqCst);
    }

    pub fn fail_prices(&self, fail: bool) {
        self.fail_prices.store(fail, Ordering::SeqCst);
    }

    pub fn fail_balances(&self, fail: bool) {
        self.fail_balances.store(fail, Ordering::SeqCst);
    }

    pub fn fail_rights(&self, fail: bool) {
        self.fail_rights.store(fail, Ordering::SeqCst);
    }

    pub fn fail_post(&self, fail: bool) {
        self.fail_post.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sign(&self, fail: bool) {
        self.fail_sign.store(fail, Ordering::SeqCst);
    }

    /// Accept posted intents but never return them from `intents()`,
    /// simulating a venue that drops the publication.
    pub fn swallow_intents(&self, swallow: bool) {
        self.swallow_intents.store(swallow, Ordering::SeqCst);
    }

    /// Intents most recently published via `post_intents`.
    pub fn published_intents(&self) -> Vec<Intent> {
        self.published.lock().unwrap().clone()
    }

    /// All responses sent to counterparties (for assertion in tests).
    pub fn sent_responses(&self) -> Vec<(Address, u64, SignedOrder)> {
        self.responses.lock().unwrap().clone()
    }

    /// Number of `usd_prices` calls served so far.
    pub fn price_fetch_count(&self) -> u64 {
        self.price_fetches.load(Ordering::SeqCst)
    }

    /// Number of `token_balance` calls served so far.
    pub fn balance_fetch_count(&self) -> u64 {
        self.balance_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Venue for MockVenue {
    async fn usd_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>, VenueError> {
        if self.fail_prices.load(Ordering::SeqCst) {
            return Err(VenueError::PriceFeed("mock: price feed down".into()));
        }
        self.price_fetches.fetch_add(1, Ordering::SeqCst);
        let prices = self.usd_prices.lock().unwrap();
        Ok(symbols
            .iter()
            .filter_map(|s| prices.get(s).map(|p| (s.clone(), *p)))
            .collect())
    }

    async fn token_balance(&self, token: Address, holder: Address) -> Result<u128, VenueError> {
        if self.fail_balances.load(Ordering::SeqCst) {
            return Err(VenueError::Balance("mock: balance lookup failed".into()));
        }
        self.balance_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(token, holder))
            .copied()
            .unwrap_or(0))
    }

    async fn trading_rights_balance(&self, _holder: Address) -> Result<u64, VenueError> {
        if self.fail_rights.load(Ordering::SeqCst) {
            return Err(VenueError::Rights("mock: rights lookup failed".into()));
        }
        Ok(self.rights.load(Ordering::SeqCst))
    }

    async fn post_intents(&self, intents: &[Intent]) -> Result<(), VenueError> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(VenueError::Transport("mock: post rejected".into()));
        }
        *self.published.lock().unwrap() = intents.to_vec();
        Ok(())
    }

    async fn intents(&self) -> Result<Vec<Intent>, VenueError> {
        if self.swallow_intents.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self.published.lock().unwrap().clone())
    }

    async fn sign_order(&self, fields: OrderFields) -> Result<SignedOrder, VenueError> {
        if self.fail_sign.load(Ordering::SeqCst) {
            return Err(VenueError::Signing("mock: signer unavailable".into()));
        }
        let n = self.sign_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SignedOrder {
            fields,
            signature: Signature(format!("0xmocksig{n:04}")),
        })
    }

    async fn send_response(
        &self,
        to: Address,
        request_id: u64,
        order: &SignedOrder,
    ) -> Result<(), VenueError> {
        self.responses
            .lock()
            .unwrap()
            .push((to, request_id, order.clone()));
        Ok(())
    }
}

/// Notifier that records every message for assertion in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[tokio::test]
    async fn builder_and_lookups() {
        let venue = MockVenue::builder()
            .with_usd_price("AST", 0.25)
            .with_balance(addr(1), addr(9), 500)
            .with_rights(1000)
            .build();

        let prices = venue.usd_prices(&["AST".into(), "UNKNOWN".into()]).await.unwrap();
        assert_eq!(prices.get("AST"), Some(&0.25));
        assert!(!prices.contains_key("UNKNOWN"));

        assert_eq!(venue.token_balance(addr(1), addr(9)).await.unwrap(), 500);
        assert_eq!(venue.token_balance(addr(2), addr(9)).await.unwrap(), 0);
        assert_eq!(venue.trading_rights_balance(addr(9)).await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn failure_injection() {
        let venue = MockVenue::builder().with_usd_price("AST", 0.25).build();
        venue.fail_prices(true);
        assert!(venue.usd_prices(&["AST".into()]).await.is_err());
        venue.fail_prices(false);
        assert!(venue.usd_prices(&["AST".into()]).await.is_ok());
    }

    #[tokio::test]
    async fn intents_round_trip() {
        let venue = MockVenue::builder().build();
        let intents = vec![Intent::new(addr(1), addr(2))];
        venue.post_intents(&intents).await.unwrap();
        assert_eq!(venue.intents().await.unwrap(), intents);

        venue.swallow_intents(true);
        assert!(venue.intents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn signatures_are_unique() {
        let venue = MockVenue::builder().build();
        let fields = OrderFields {
            maker_address: addr(1),
            maker_amount: 1,
            maker_token: addr(2),
            taker_address: addr(3),
            taker_amount: 2,
            taker_token: addr(4),
            expiration: 0,
            nonce: "1".into(),
        };
        let a = venue.sign_order(fields.clone()).await.unwrap();
        let b = venue.sign_order(fields).await.unwrap();
        assert_ne!(a.signature, b.signature);
    }

    #[tokio::test]
    async fn responses_are_recorded() {
        let venue = MockVenue::builder().build();
        let fields = OrderFields {
            maker_address: addr(1),
            maker_amount: 1,
            maker_token: addr(2),
            taker_address: addr(3),
            taker_amount: 2,
            taker_token: addr(4),
            expiration: 0,
            nonce: "1".into(),
        };
        let order = venue.sign_order(fields).await.unwrap();
        venue.send_response(addr(3), 7, &order).await.unwrap();

        let sent = venue.sent_responses();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, addr(3));
        assert_eq!(sent[0].1, 7);
    }

    #[test]
    fn recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify("hello");
        assert_eq!(notifier.messages(), vec!["hello".to_string()]);
    }
}
