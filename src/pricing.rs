//! Market-making pricing engine: quote maps, inbound order handling, and
//! open-order lifecycle.
//!
//! The engine owns all shared mutable state (balances snapshot, limit
//! prices, liquidity, open orders) behind one short-critical-section lock.
//! The lock is never held across an await; request handlers re-validate
//! against current state after every suspension point, which keeps them
//! safe under interleaving.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use swapmaker_venue::{Address, OrderFields, OrderRequest, Signature, SignedOrder, Venue};

use crate::config::Config;
use crate::error::Result;
use crate::liquidity::LiquidityBook;
use crate::portfolio::{self, PortfolioSnapshot};
use crate::token::{Pair, TokenRegistry};

/// A signed, outstanding offer and its expiry deadline.
#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub order: SignedOrder,
    pub deadline: Instant,
}

impl OpenOrder {
    pub fn pair(&self) -> Pair {
        Pair::new(self.order.fields.maker_token, self.order.fields.taker_token)
    }
}

/// All engine-owned mutable state, guarded by one lock.
#[derive(Default)]
struct Books {
    snapshot: PortfolioSnapshot,
    limit_prices: FxHashMap<Pair, f64>,
    liquidity: LiquidityBook,
    open_orders: FxHashMap<Signature, OpenOrder>,
    blacklist: FxHashSet<Address>,
}

impl Books {
    fn recompute_liquidity(&mut self) {
        let commitments: Vec<(Pair, u128)> = self
            .open_orders
            .values()
            .map(|o| (o.pair(), o.order.fields.maker_amount))
            .collect();
        self.liquidity.recompute(&self.snapshot.balances, commitments);
    }
}

struct Inner {
    registry: TokenRegistry,
    owner: Address,
    expiration_secs: u64,
    venue: Arc<dyn Venue>,
    books: Mutex<Books>,
    watches: Mutex<FxHashMap<Signature, JoinHandle<()>>>,
    algorithm_active: AtomicBool,
    update_signal: Arc<Notify>,
    expiry_notifications: AtomicU64,
}

/// The pricing engine: explicitly constructed, shared as a cheap clonable
/// handle. No ambient globals.
#[derive(Clone)]
pub struct PricingEngine {
    inner: Arc<Inner>,
}

impl PricingEngine {
    pub fn new(
        registry: TokenRegistry,
        owner: Address,
        expiration_secs: u64,
        venue: Arc<dyn Venue>,
        blacklist: Vec<Address>,
    ) -> Self {
        let books = Books {
            blacklist: blacklist.into_iter().collect(),
            ..Books::default()
        };
        PricingEngine {
            inner: Arc::new(Inner {
                registry,
                owner,
                expiration_secs,
                venue,
                books: Mutex::new(books),
                watches: Mutex::new(FxHashMap::default()),
                algorithm_active: AtomicBool::new(false),
                update_signal: Arc::new(Notify::new()),
                expiry_notifications: AtomicU64::new(0),
            }),
        }
    }

    /// Build an engine from loaded configuration.
    pub fn from_config(config: &Config, venue: Arc<dyn Venue>) -> Self {
        PricingEngine::new(
            config.registry(),
            config.maker.address,
            config.engine.expiration_secs,
            venue,
            config.blacklist.clone(),
        )
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.inner.registry
    }

    pub fn owner(&self) -> Address {
        self.inner.owner
    }

    /// Signal fired when an expired order freed or consumed liquidity while
    /// the algorithm was active.
    pub fn update_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.inner.update_signal)
    }

    /// Number of expiry notifications emitted so far.
    pub fn expiry_notification_count(&self) -> u64 {
        self.inner.expiry_notifications.load(Ordering::SeqCst)
    }

    pub fn set_algorithm_active(&self, active: bool) {
        self.inner.algorithm_active.store(active, Ordering::SeqCst);
    }

    pub fn algorithm_active(&self) -> bool {
        self.inner.algorithm_active.load(Ordering::SeqCst)
    }

    // === Quote maps ===

    /// Set the maker→taker exchange rate for a pair. Non-positive (or
    /// non-finite) prices are silently ignored.
    pub fn set_price(&self, maker: Address, taker: Address, price: f64) {
        if price > 0.0 && price.is_finite() {
            self.inner
                .books
                .lock()
                .limit_prices
                .insert(Pair::new(maker, taker), price);
        }
    }

    pub fn get_price(&self, maker: Address, taker: Address) -> Option<f64> {
        self.inner
            .books
            .lock()
            .limit_prices
            .get(&Pair::new(maker, taker))
            .copied()
    }

    /// Stop answering requests for a pair.
    pub fn remove_price_offer(&self, maker: Address, taker: Address) {
        self.inner
            .books
            .lock()
            .limit_prices
            .remove(&Pair::new(maker, taker));
    }

    /// Drop every published price. Limits stay; without a price no pair is
    /// quotable.
    pub fn clear_price_offers(&self) {
        self.inner.books.lock().limit_prices.clear();
    }

    /// Set the maximum maker-side quantity for a pair and recompute
    /// liquidity.
    pub fn set_limit_amount(&self, maker: Address, taker: Address, amount: u128) {
        let mut books = self.inner.books.lock();
        books.liquidity.set_limit(Pair::new(maker, taker), amount);
        books.recompute_liquidity();
    }

    pub fn get_limit_amount(&self, maker: Address, taker: Address) -> Option<u128> {
        self.inner.books.lock().liquidity.limit(Pair::new(maker, taker))
    }

    pub fn liquidity(&self, pair: Pair) -> Option<i128> {
        self.inner.books.lock().liquidity.liquidity(pair)
    }

    // === State updates ===

    /// Install a fresh balance/price snapshot and recompute liquidity.
    pub fn apply_snapshot(&self, snapshot: PortfolioSnapshot) {
        let mut books = self.inner.books.lock();
        books.snapshot = snapshot;
        books.recompute_liquidity();
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.inner.books.lock().snapshot.clone()
    }

    pub fn recompute_liquidity(&self) {
        self.inner.books.lock().recompute_liquidity();
    }

    pub fn add_blacklist(&self, address: Address) {
        self.inner.books.lock().blacklist.insert(address);
    }

    // === Open orders ===

    pub fn open_order_count(&self) -> usize {
        self.inner.books.lock().open_orders.len()
    }

    pub fn open_order(&self, signature: &Signature) -> Option<OpenOrder> {
        self.inner.books.lock().open_orders.get(signature).cloned()
    }

    /// Remove one open order and its expiry watch.
    pub fn cancel_order(&self, signature: &Signature) -> bool {
        if let Some(handle) = self.inner.watches.lock().remove(signature) {
            handle.abort();
        }
        let mut books = self.inner.books.lock();
        let removed = books.open_orders.remove(signature).is_some();
        if removed {
            books.recompute_liquidity();
        }
        removed
    }

    /// Remove every open order and abort every expiry watch.
    pub fn cancel_all_orders(&self) {
        for (_, handle) in self.inner.watches.lock().drain() {
            handle.abort();
        }
        let mut books = self.inner.books.lock();
        books.open_orders.clear();
        books.recompute_liquidity();
    }

    // === Inbound requests ===

    /// Answer an inbound order request.
    ///
    /// Returns `Ok(None)` for every silent rejection (logged, no response
    /// sent); venue failures during balance lookup or signing propagate.
    /// Safe to call concurrently: state is re-validated after each await.
    pub async fn handle_order_request(
        &self,
        request: OrderRequest,
    ) -> Result<Option<SignedOrder>> {
        let pair = Pair::new(request.maker_token, request.taker_token);

        let price = {
            let books = self.inner.books.lock();
            if books.blacklist.contains(&request.taker_address) {
                return Ok(None);
            }
            match (request.maker_amount, request.taker_amount) {
                (None, None) => {
                    debug!("order request without amounts from {}", request.taker_address);
                    return Ok(None);
                }
                (Some(_), Some(_)) => {
                    debug!("two-sided order request from {}", request.taker_address);
                    return Ok(None);
                }
                _ => {}
            }
            if self.inner.registry.props(request.maker_token).is_none()
                || self.inner.registry.props(request.taker_token).is_none()
            {
                debug!("order request for unknown token pair");
                return Ok(None);
            }
            let Some(&price) = books.limit_prices.get(&pair) else {
                debug!("no price set for {}", self.inner.registry.pair_label(pair));
                return Ok(None);
            };
            if books.liquidity.liquidity(pair).is_none() {
                debug!("no liquidity for {}", self.inner.registry.pair_label(pair));
                return Ok(None);
            }
            price
        };

        let label = self.inner.registry.pair_label(pair);
        info!(
            "order request from {} on {label}: maker {:?} / taker {:?}",
            request.taker_address, request.maker_amount, request.taker_amount
        );

        // Requester balances on both sides; other requests may be handled
        // while these lookups are in flight.
        let (requester_maker_balance, requester_taker_balance) = tokio::join!(
            self.inner
                .venue
                .token_balance(request.maker_token, request.taker_address),
            self.inner
                .venue
                .token_balance(request.taker_token, request.taker_address),
        );
        let requester_maker_balance = requester_maker_balance?;
        let requester_taker_balance = requester_taker_balance?;
        debug!(
            "requester {} holds maker {requester_maker_balance} / taker {requester_taker_balance}",
            request.taker_address
        );

        // Fill in the missing side from the limit price.
        let (maker_amount, taker_amount) = match (request.maker_amount, request.taker_amount) {
            (Some(maker_amount), None) => {
                (maker_amount, (price * maker_amount as f64).round() as u128)
            }
            (None, Some(taker_amount)) => {
                ((taker_amount as f64 / price).round() as u128, taker_amount)
            }
            _ => unreachable!("one-sidedness checked above"),
        };

        // Validate against current state (it may have moved during the
        // balance lookups).
        {
            let books = self.inner.books.lock();
            if requester_taker_balance < taker_amount {
                info!(
                    "rejected {label}: counterparty holds {requester_taker_balance}, needs {taker_amount}"
                );
                return Ok(None);
            }
            match books.liquidity.liquidity(pair) {
                Some(liquidity) if liquidity >= maker_amount as i128 => {}
                _ => {
                    info!("rejected {label}: insufficient liquidity for {maker_amount}");
                    return Ok(None);
                }
            }
        }

        let expiration = Utc::now().timestamp() as u64 + self.inner.expiration_secs;
        let nonce = rand::thread_rng().gen_range(0u32..100_000).to_string();
        let fields = OrderFields {
            maker_address: self.inner.owner,
            maker_amount,
            maker_token: request.maker_token,
            taker_address: request.taker_address,
            taker_amount,
            taker_token: request.taker_token,
            expiration,
            nonce,
        };
        let signed = self.inner.venue.sign_order(fields).await?;
        let deadline = Instant::now() + Duration::from_secs(self.inner.expiration_secs);

        // Record before sending so the liquidity reservation is visible to
        // any request that interleaved with the signing await.
        {
            let mut books = self.inner.books.lock();
            match books.liquidity.liquidity(pair) {
                Some(liquidity) if liquidity >= maker_amount as i128 => {}
                _ => {
                    info!("rejected {label}: liquidity consumed while signing");
                    return Ok(None);
                }
            }
            books.open_orders.insert(
                signed.signature.clone(),
                OpenOrder {
                    order: signed.clone(),
                    deadline,
                },
            );
            books.recompute_liquidity();
        }

        self.spawn_expiry_watch(signed.signature.clone(), deadline);
        self.inner
            .venue
            .send_response(request.taker_address, request.id, &signed)
            .await?;
        info!(
            "answered {label}: selling {maker_amount} for {taker_amount}, expires in {}s",
            self.inner.expiration_secs
        );
        Ok(Some(signed))
    }

    // === Expiration ===

    /// Watch one order at 1-second resolution and expire it once its
    /// deadline passes. Fills are detected only by absence of evidence at
    /// expiry; there is no explicit fill confirmation.
    fn spawn_expiry_watch(&self, signature: Signature, deadline: Instant) {
        let engine = self.clone();
        let key = signature.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                if Instant::now() > deadline {
                    engine.expire_order(&key).await;
                    break;
                }
            }
        });
        self.inner.watches.lock().insert(signature, handle);
    }

    async fn expire_order(&self, signature: &Signature) {
        let expired = {
            let mut books = self.inner.books.lock();
            books.open_orders.remove(signature)
        };
        self.inner.watches.lock().remove(signature);
        let Some(open) = expired else {
            return;
        };

        let pair = open.pair();
        info!(
            "order {} on {} expired",
            signature,
            self.inner.registry.pair_label(pair)
        );

        // Best-effort refresh: the order may have been filled, so balances
        // must be re-read before liquidity is recomputed.
        match portfolio::refresh(&*self.inner.venue, &self.inner.registry, self.inner.owner).await
        {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(e) => {
                warn!("balance refresh after expiry failed: {e}");
                self.recompute_liquidity();
            }
        }

        if self.algorithm_active() {
            self.inner.expiry_notifications.fetch_add(1, Ordering::SeqCst);
            self.inner.update_signal.notify_one();
        }
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
    fn ast() -> Address {
        "0x27054b13b1b798b345b591a4d22e6562d47ea75a".parse().unwrap()
    }
    fn maker() -> Address {
        "0x1111111111111111111111111111111111111111".parse().unwrap()
    }
    fn requester() -> Address {
        "0x9999999999999999999999999999999999999999".parse().unwrap()
    }

    fn registry() -> TokenRegistry {
        let mut r = TokenRegistry::new(weth());
        r.insert(weth(), TokenProps::new("WETH", 18));
        r.insert(ast(), TokenProps::new("AST", 4));
        r
    }

    fn engine_with_venue(venue: Arc<MockVenue>) -> PricingEngine {
        PricingEngine::new(registry(), maker(), 300, venue, Vec::new())
    }

    /// Engine quoting AST/ETH at price 2.0 with liquidity 1000.
    fn quoting_engine(venue: Arc<MockVenue>) -> PricingEngine {
        let engine = engine_with_venue(venue);
        let mut balances = FxHashMap::default();
        balances.insert(ast(), 5_000u128);
        let snapshot = PortfolioSnapshot {
            balances,
            ..Default::default()
        };
        engine.apply_snapshot(snapshot);
        engine.set_price(ast(), Address::ETH, 2.0);
        engine.set_limit_amount(ast(), Address::ETH, 1_000);
        engine
    }

    fn request(maker_amount: Option<u128>, taker_amount: Option<u128>) -> OrderRequest {
        OrderRequest {
            id: 1,
            taker_address: requester(),
            maker_token: ast(),
            taker_token: Address::ETH,
            maker_amount,
            taker_amount,
        }
    }

    #[test]
    fn from_config_wires_maker_and_registry() {
        let config = Config::from_toml(
            r#"
blacklist = ["0x9999999999999999999999999999999999999999"]

[maker]
address = "0x1111111111111111111111111111111111111111"
weth = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"

[[tokens]]
address = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
symbol = "WETH"
decimals = 18
"#,
        )
        .unwrap();

        let venue = Arc::new(MockVenue::builder().build());
        let engine = PricingEngine::from_config(&config, venue.clone());
        assert_eq!(engine.owner(), maker());
        assert_eq!(engine.registry().weth(), weth());
        assert!(engine.registry().props(Address::ETH).is_some());
    }

    #[test]
    fn set_price_rejects_non_positive() {
        let engine = engine_with_venue(Arc::new(MockVenue::builder().build()));
        engine.set_price(ast(), Address::ETH, 0.0);
        assert_eq!(engine.get_price(ast(), Address::ETH), None);
        engine.set_price(ast(), Address::ETH, -1.0);
        assert_eq!(engine.get_price(ast(), Address::ETH), None);
        engine.set_price(ast(), Address::ETH, 2.5);
        assert_eq!(engine.get_price(ast(), Address::ETH), Some(2.5));
    }

    #[test]
    fn remove_price_offer_unsets() {
        let engine = engine_with_venue(Arc::new(MockVenue::builder().build()));
        engine.set_price(ast(), Address::ETH, 2.5);
        engine.remove_price_offer(ast(), Address::ETH);
        assert_eq!(engine.get_price(ast(), Address::ETH), None);
    }

    #[tokio::test]
    async fn blacklisted_requester_is_ignored() {
        let venue = Arc::new(MockVenue::builder().build());
        let engine = quoting_engine(Arc::clone(&venue));
        engine.add_blacklist(requester());

        let answer = engine
            .handle_order_request(request(Some(100), None))
            .await
            .unwrap();
        assert!(answer.is_none());
        assert!(venue.sent_responses().is_empty());
    }

    #[tokio::test]
    async fn rejects_two_sided_and_empty_requests() {
        let venue = Arc::new(MockVenue::builder().build());
        let engine = quoting_engine(Arc::clone(&venue));

        assert!(engine
            .handle_order_request(request(Some(1), Some(2)))
            .await
            .unwrap()
            .is_none());
        assert!(engine
            .handle_order_request(request(None, None))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_token() {
        let venue = Arc::new(MockVenue::builder().build());
        let engine = quoting_engine(Arc::clone(&venue));
        let mut req = request(Some(100), None);
        req.maker_token = "0x4444444444444444444444444444444444444444".parse().unwrap();
        assert!(engine.handle_order_request(req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_without_price_or_liquidity() {
        let venue = Arc::new(MockVenue::builder().build());
        let engine = engine_with_venue(Arc::clone(&venue));

        // No price at all.
        assert!(engine
            .handle_order_request(request(Some(100), None))
            .await
            .unwrap()
            .is_none());

        // Price but no liquidity entry.
        engine.set_price(ast(), Address::ETH, 2.0);
        assert!(engine
            .handle_order_request(request(Some(100), None))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn answers_maker_sided_request() {
        let venue = Arc::new(
            MockVenue::builder()
                .with_balance(Address::ETH, requester(), 10_000)
                .build(),
        );
        let engine = quoting_engine(Arc::clone(&venue));

        let answer = engine
            .handle_order_request(request(Some(50), None))
            .await
            .unwrap()
            .expect("request should be answered");

        // taker = price × maker = 2.0 × 50.
        assert_eq!(answer.fields.maker_amount, 50);
        assert_eq!(answer.fields.taker_amount, 100);
        assert_eq!(answer.fields.maker_address, maker());
        assert!(answer.fields.nonce.parse::<u32>().unwrap() < 100_000);

        // Recorded, reserved, and sent back verbatim.
        assert_eq!(engine.open_order_count(), 1);
        assert_eq!(engine.liquidity(Pair::new(ast(), Address::ETH)), Some(950));
        let sent = venue.sent_responses();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2, answer);
    }

    #[tokio::test]
    async fn answers_taker_sided_request() {
        let venue = Arc::new(
            MockVenue::builder()
                .with_balance(Address::ETH, requester(), 10_000)
                .build(),
        );
        let engine = quoting_engine(Arc::clone(&venue));

        let answer = engine
            .handle_order_request(request(None, Some(100)))
            .await
            .unwrap()
            .expect("request should be answered");

        // maker = taker / price = 100 / 2.0.
        assert_eq!(answer.fields.maker_amount, 50);
        assert_eq!(answer.fields.taker_amount, 100);
    }

    #[tokio::test]
    async fn rejects_poor_counterparty() {
        let venue = Arc::new(
            MockVenue::builder()
                .with_balance(Address::ETH, requester(), 99) // needs 100
                .build(),
        );
        let engine = quoting_engine(Arc::clone(&venue));

        let answer = engine
            .handle_order_request(request(Some(50), None))
            .await
            .unwrap();
        assert!(answer.is_none());
        assert!(venue.sent_responses().is_empty());
        assert_eq!(engine.open_order_count(), 0);
    }

    #[tokio::test]
    async fn rejects_beyond_liquidity() {
        let venue = Arc::new(
            MockVenue::builder()
                .with_balance(Address::ETH, requester(), u128::MAX / 2)
                .build(),
        );
        let engine = quoting_engine(Arc::clone(&venue));

        // Liquidity is 1000.
        let answer = engine
            .handle_order_request(request(Some(1_500), None))
            .await
            .unwrap();
        assert!(answer.is_none());
        assert_eq!(engine.open_order_count(), 0);
    }

    #[tokio::test]
    async fn balance_lookup_failure_propagates() {
        let venue = Arc::new(MockVenue::builder().build());
        let engine = quoting_engine(Arc::clone(&venue));
        venue.fail_balances(true);

        let result = engine.handle_order_request(request(Some(50), None)).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn order_expires_and_notifies_active_algorithm() {
        let venue = Arc::new(
            MockVenue::builder()
                .with_balance(Address::ETH, requester(), 10_000)
                .with_balance(ast(), maker(), 5_000)
                .build(),
        );
        let engine = quoting_engine(Arc::clone(&venue));
        engine.set_algorithm_active(true);

        engine
            .handle_order_request(request(Some(50), None))
            .await
            .unwrap()
            .expect("request should be answered");
        assert_eq!(engine.open_order_count(), 1);
        assert_eq!(engine.liquidity(Pair::new(ast(), Address::ETH)), Some(950));

        // Still open at +300, expired by +301.
        tokio::time::sleep(Duration::from_secs(310)).await;
        tokio::task::yield_now().await;

        assert_eq!(engine.open_order_count(), 0);
        assert_eq!(engine.liquidity(Pair::new(ast(), Address::ETH)), Some(1_000));
        assert_eq!(engine.expiry_notification_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_without_active_algorithm_does_not_notify() {
        let venue = Arc::new(
            MockVenue::builder()
                .with_balance(Address::ETH, requester(), 10_000)
                .with_balance(ast(), maker(), 5_000)
                .build(),
        );
        let engine = quoting_engine(Arc::clone(&venue));

        engine
            .handle_order_request(request(Some(50), None))
            .await
            .unwrap()
            .expect("request should be answered");

        tokio::time::sleep(Duration::from_secs(310)).await;
        tokio::task::yield_now().await;

        assert_eq!(engine.open_order_count(), 0);
        assert_eq!(engine.expiry_notification_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_orders_aborts_watches() {
        let venue = Arc::new(
            MockVenue::builder()
                .with_balance(Address::ETH, requester(), 10_000)
                .build(),
        );
        let engine = quoting_engine(Arc::clone(&venue));
        engine.set_algorithm_active(true);

        engine
            .handle_order_request(request(Some(50), None))
            .await
            .unwrap()
            .expect("request should be answered");
        engine.cancel_all_orders();
        assert_eq!(engine.open_order_count(), 0);

        tokio::time::sleep(Duration::from_secs(400)).await;
        tokio::task::yield_now().await;
        assert_eq!(engine.expiry_notification_count(), 0);
    }

    #[tokio::test]
    async fn cancel_single_order() {
        let venue = Arc::new(
            MockVenue::builder()
                .with_balance(Address::ETH, requester(), 10_000)
                .build(),
        );
        let engine = quoting_engine(Arc::clone(&venue));

        let answer = engine
            .handle_order_request(request(Some(50), None))
            .await
            .unwrap()
            .expect("request should be answered");
        assert!(engine.cancel_order(&answer.signature));
        assert_eq!(engine.open_order_count(), 0);
        assert_eq!(engine.liquidity(Pair::new(ast(), Address::ETH)), Some(1_000));
        assert!(!engine.cancel_order(&answer.signature));
    }
}
