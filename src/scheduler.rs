//! Scheduling loop: the Idle/Starting/Running/Stopping state machine that
//! drives periodic recomputation.
//!
//! Background polling and the active run are mutually exclusive: starting
//! the run disables the poller, stopping re-arms it. Each iteration runs
//! inline in its timer task, so a tick can never overlap an iteration that
//! is still in flight; late ticks are skipped.

use std::fmt;
use std::sync::Arc;

use log::{error, info, warn};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use swapmaker_venue::{Address, Intent, Notifier, Venue};

use crate::config::{EngineConfig, SafetyConfig};
use crate::error::{Error, Result};
use crate::planner::{self, Plan};
use crate::portfolio;
use crate::pricing::PricingEngine;
use crate::safety::SafetyMonitor;
use crate::token::Pair;

/// Lifecycle phase of the rebalancing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Starting => write!(f, "starting"),
            Phase::Running => write!(f, "running"),
            Phase::Stopping => write!(f, "stopping"),
        }
    }
}

struct RunState {
    phase: Phase,
    goals: FxHashMap<Address, f64>,
    intents: Vec<Intent>,
    safety: SafetyMonitor,
    last_plan: Option<Plan>,
}

struct Inner {
    engine: PricingEngine,
    venue: Arc<dyn Venue>,
    notifier: Arc<dyn Notifier>,
    engine_cfg: EngineConfig,
    safety_cfg: SafetyConfig,
    state: Mutex<RunState>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    run_task: Mutex<Option<JoinHandle<()>>>,
}

/// The rebalancing algorithm driver, shared as a cheap clonable handle.
#[derive(Clone)]
pub struct Rebalancer {
    inner: Arc<Inner>,
}

impl Rebalancer {
    pub fn new(
        engine: PricingEngine,
        venue: Arc<dyn Venue>,
        notifier: Arc<dyn Notifier>,
        engine_cfg: EngineConfig,
        safety_cfg: SafetyConfig,
    ) -> Self {
        let safety = SafetyMonitor::new(
            safety_cfg.relative_change_limit,
            safety_cfg.average_change_limit,
        );
        Rebalancer {
            inner: Arc::new(Inner {
                engine,
                venue,
                notifier,
                engine_cfg,
                safety_cfg,
                state: Mutex::new(RunState {
                    phase: Phase::Idle,
                    goals: FxHashMap::default(),
                    intents: Vec::new(),
                    safety,
                    last_plan: None,
                }),
                poll_task: Mutex::new(None),
                run_task: Mutex::new(None),
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    pub fn last_plan(&self) -> Option<Plan> {
        self.inner.state.lock().last_plan.clone()
    }

    pub fn active_intents(&self) -> Vec<Intent> {
        self.inner.state.lock().intents.clone()
    }

    /// Set the goal fractions for the next run. Rejected while a run is
    /// active so nothing can interfere with the algorithm flow.
    pub fn set_goal_fractions(&self, goals: FxHashMap<Address, f64>) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.phase != Phase::Idle {
            return Err(Error::AlreadyActive);
        }
        state.goals = goals;
        Ok(())
    }

    // === Background polling (Idle) ===

    /// Arm the background balance/price poller. Idempotent.
    pub fn start_polling(&self) {
        let mut slot = self.inner.poll_task.lock();
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let this = self.clone();
        let interval = Duration::from_millis(self.inner.engine_cfg.poll_interval_ms);
        *slot = Some(tokio::spawn(async move {
            let mut tick = time::interval(interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let engine = &this.inner.engine;
                match portfolio::refresh(&*this.inner.venue, engine.registry(), engine.owner())
                    .await
                {
                    Ok(snapshot) => engine.apply_snapshot(snapshot),
                    Err(e) => warn!("background refresh failed: {e}"),
                }
            }
        }));
    }

    fn stop_polling(&self) {
        if let Some(handle) = self.inner.poll_task.lock().take() {
            handle.abort();
        }
    }

    // === Starting ===

    /// Validate, plan, publish intents, seed prices, and enter Running.
    ///
    /// Any failure rolls everything back to Idle with the poller re-armed;
    /// no partial state survives a failed start.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.phase != Phase::Idle {
                return Err(Error::AlreadyActive);
            }
            state.phase = Phase::Starting;
        }
        match self.start_inner().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.teardown();
                Err(e)
            }
        }
    }

    async fn start_inner(&self) -> Result<()> {
        let engine = &self.inner.engine;
        let goals = self.inner.state.lock().goals.clone();
        if goals.is_empty() {
            return Err(Error::Allocation("no goal fractions set".into()));
        }
        let sum: f64 = goals.values().sum();
        let deviation = (sum - 1.0).abs();
        if deviation > self.inner.engine_cfg.fraction_tolerance {
            return Err(Error::FractionSum { deviation });
        }

        let owner = engine.owner();
        let snapshot = portfolio::refresh(&*self.inner.venue, engine.registry(), owner).await?;
        engine.apply_snapshot(snapshot.clone());

        let plan = planner::compute_plan(
            &snapshot,
            &goals,
            engine.registry(),
            self.inner.engine_cfg.fraction_tolerance,
        )?;
        let rights =
            planner::check_trading_rights(&*self.inner.venue, owner, plan.needed_intents).await?;
        if !rights.enough() {
            return Err(Error::InsufficientTradingRights {
                required: rights.required,
                available: rights.available,
                missing: rights.missing(),
            });
        }

        let intents = plan.intents(engine.registry());
        self.inner.venue.post_intents(&intents).await?;
        // Round-trip: the run may only begin once the venue confirms every
        // posted pair.
        let confirmed = self.inner.venue.intents().await?;
        for intent in &intents {
            if !confirmed.contains(intent) {
                let pair = Pair::new(intent.maker_token, intent.taker_token);
                return Err(Error::IntentRoundTrip(format!(
                    "pair {} not confirmed by venue",
                    engine.registry().pair_label(pair)
                )));
            }
        }

        // The active run and background polling are mutually exclusive.
        self.stop_polling();

        // Re-read prices and balances so the first quotes rest on current
        // state, then seed prices and capture the immutable baseline.
        let snapshot = portfolio::refresh(&*self.inner.venue, engine.registry(), owner).await?;
        engine.apply_snapshot(snapshot.clone());

        let mut initial = FxHashMap::default();
        for intent in &intents {
            let pair = Pair::new(intent.maker_token, intent.taker_token);
            if let Some(reference) =
                snapshot.reference_price(engine.registry(), pair.maker, pair.taker)
            {
                let quoted = self.inner.safety_cfg.price_modifier * reference;
                engine.set_price(pair.maker, pair.taker, quoted);
                initial.insert(pair, quoted);
            }
        }

        {
            let mut state = self.inner.state.lock();
            state.safety.arm(initial);
            state.intents = intents;
            state.last_plan = Some(plan);
            state.phase = Phase::Running;
        }
        engine.set_algorithm_active(true);
        self.spawn_run_task();
        info!("rebalancing algorithm started");
        self.inner.notifier.notify("Rebalancing started.");
        Ok(())
    }

    // === Running ===

    fn spawn_run_task(&self) {
        let this = self.clone();
        let interval = Duration::from_millis(self.inner.engine_cfg.poll_interval_ms);
        let handle = tokio::spawn(async move {
            let signal = this.inner.engine.update_signal();
            let mut tick = time::interval(interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = tick.tick() => {}
                    _ = signal.notified() => {}
                }
                match this.iterate().await {
                    Ok(()) => {}
                    // Transient fetch failures skip the iteration; the next
                    // tick retries naturally.
                    Err(Error::Venue(e)) => {
                        warn!("iteration skipped on transient venue error: {e}");
                    }
                    Err(e) => {
                        this.halt(&e);
                        break;
                    }
                }
            }
        });
        *self.inner.run_task.lock() = Some(handle);
    }

    /// One Running iteration: refresh → plan → guards → quotes → limits.
    async fn iterate(&self) -> Result<()> {
        if self.phase() != Phase::Running {
            return Ok(());
        }

        let engine = &self.inner.engine;
        let registry = engine.registry();
        let owner = engine.owner();
        let snapshot = portfolio::refresh(&*self.inner.venue, registry, owner).await?;
        engine.apply_snapshot(snapshot.clone());

        let goals = self.inner.state.lock().goals.clone();
        let plan = planner::compute_plan(
            &snapshot,
            &goals,
            registry,
            self.inner.engine_cfg.fraction_tolerance,
        )?;
        let rights =
            planner::check_trading_rights(&*self.inner.venue, owner, plan.needed_intents).await?;
        if !rights.enough() {
            return Err(Error::InsufficientTradingRights {
                required: rights.required,
                available: rights.available,
                missing: rights.missing(),
            });
        }

        let intents = self.inner.state.lock().intents.clone();
        for intent in &intents {
            let pair = Pair::new(intent.maker_token, intent.taker_token);
            let Some(reference) = snapshot.reference_price(registry, pair.maker, pair.taker)
            else {
                continue;
            };
            let quoted = self.inner.safety_cfg.price_modifier * reference;

            if self.inner.safety_cfg.continuous_price_updates {
                // Both drift checks gate the price before it is committed; a
                // halted run never publishes the triggering price.
                let admitted = self.inner.state.lock().safety.admit(pair, quoted);
                if let Err(trip) = admitted {
                    return Err(Error::PriceDrift {
                        pair: registry.pair_label(pair),
                        kind: trip.kind,
                        ratio: trip.ratio,
                    });
                }
                engine.set_price(pair.maker, pair.taker, quoted);
            }

            if pair.taker.is_eth() && plan.delta(pair.maker) < 0 {
                // Selling a token for ETH: offer exactly the surplus.
                let limit = (-plan.delta(pair.maker)) as u128;
                engine.set_limit_amount(pair.maker, pair.taker, limit);
            } else if pair.maker == registry.weth() && plan.delta(pair.taker) > 0 {
                // Buying a token with WETH: the quoted price is a raw-unit
                // rate, so the raw taker delta divided by it is the raw
                // WETH limit.
                if let Some(price) = engine.get_price(pair.maker, pair.taker) {
                    let limit = (plan.delta(pair.taker) as f64 / price).floor();
                    if limit >= 0.0 {
                        engine.set_limit_amount(pair.maker, pair.taker, limit as u128);
                    }
                }
            }
        }

        engine.recompute_liquidity();
        self.inner.state.lock().last_plan = Some(plan);
        Ok(())
    }

    // === Stopping ===

    /// Halt from inside the run task (fault detected during an iteration).
    fn halt(&self, err: &Error) {
        error!("rebalancing halted: {err}");
        self.inner.state.lock().phase = Phase::Stopping;
        let message = match err {
            Error::PriceDrift { pair, kind, .. } => {
                format!("Price of {pair} drifted too far from the {kind} baseline. Stopped rebalancing.")
            }
            Error::InsufficientTradingRights { missing, .. } => {
                format!("Not enough trading rights staked (missing {missing}). Stopped rebalancing.")
            }
            other => format!("Rebalancing stopped: {other}"),
        };
        self.inner.notifier.notify(&message);
        self.teardown();
    }

    /// Operator stop: cancel the run synchronously, then reset.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.phase == Phase::Idle {
                return;
            }
            state.phase = Phase::Stopping;
        }
        if let Some(handle) = self.inner.run_task.lock().take() {
            handle.abort();
        }
        self.teardown();
        info!("rebalancing stopped by operator");
        self.inner.notifier.notify("Rebalancing stopped.");
    }

    /// Clear every price offer, open order, expiry watch, and baseline, then
    /// return to Idle with background polling re-armed. No stale quote and
    /// no orphaned timer survives this.
    fn teardown(&self) {
        let engine = &self.inner.engine;
        engine.set_algorithm_active(false);
        engine.cancel_all_orders();
        engine.clear_price_offers();
        {
            let mut state = self.inner.state.lock();
            state.safety.reset();
            state.intents.clear();
            state.phase = Phase::Idle;
        }
        self.start_polling();
    }
}
