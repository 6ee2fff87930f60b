//! Host-facing adapter.
//!
//! The host AMM calls one [`LiquidityHook`] method per lifecycle event. The
//! adapter turns signed balance deltas into ledger magnitudes, picks prices
//! according to [`PriceMode`], stamps the event with its [`Clock`] and drives
//! the ledger and the claim engine. Swap callbacks only bump counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::constants::{LEGACY_ADD_PRICES, LEGACY_REMOVE_PRICES};
use crate::engine::ClaimEngine;
use crate::error::{Error, Result};
use crate::events::HookListener;
use crate::ledger::EventLedger;
use crate::math::{magnitude, U256};
use crate::oracle::{FixedPriceOracle, PriceOracle};
use crate::state::{Claim, LiquidityEvent, PoolKey};
use crate::types::{ClaimInsurance, Eligibility, InsuranceSummary, PoolCounters, RemovalOutcome};

// ─── Clock ────────────────────────────────────────────────────────────────────

/// Source of event timestamps (unix seconds).
pub trait Clock: Send + Sync {
    fn unix_timestamp(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Clock set explicitly by the caller; used for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self { now: AtomicI64::new(now) }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock by `secs`, saturating at the `i64` bounds.
    pub fn advance(&self, secs: i64) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| Some(now.saturating_add(secs)));
    }
}

impl Clock for ManualClock {
    fn unix_timestamp(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn unix_timestamp(&self) -> i64 {
        (**self).unix_timestamp()
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

/// Which prices go into ledger entries and which into claim valuation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    /// Adds recorded at (1, 1), removes recorded at (1, 2), claims valued
    /// with a separate oracle call.
    #[default]
    Legacy,
    /// One oracle call per callback, recorded in the ledger entry and used
    /// for valuation alike.
    Oracle,
}

impl std::str::FromStr for PriceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "oracle" => Ok(Self::Oracle),
            other => Err(Error::Parse {
                input: other.to_string(),
                reason: "expected 'legacy' or 'oracle'".into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub price_mode: PriceMode,
}

// ─── Hook interface ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapPhase {
    Before,
    After,
}

/// One method per host lifecycle event.
///
/// Deltas are the host's signed balance changes for the two pool assets;
/// only their magnitudes are recorded.
pub trait LiquidityHook {
    fn on_add(&mut self, user: Pubkey, pool: &PoolKey, delta_a: i128, delta_b: i128)
        -> Result<LiquidityEvent>;

    fn on_remove(&mut self, user: Pubkey, pool: &PoolKey, delta_a: i128, delta_b: i128)
        -> Result<RemovalOutcome>;

    fn on_swap(&mut self, pool: &PoolKey, phase: SwapPhase);
}

// ─── InsuranceHook ────────────────────────────────────────────────────────────

/// Ledger + claim engine behind the [`LiquidityHook`] interface.
///
/// Every mutating call takes `&mut self` and completes before returning, so a
/// removal always values against a ledger that cannot change underneath it.
#[derive(Debug)]
pub struct InsuranceHook<O = FixedPriceOracle, C = SystemClock> {
    config:   HookConfig,
    oracle:   O,
    clock:    C,
    ledger:   EventLedger,
    engine:   ClaimEngine,
    counters: BTreeMap<Pubkey, PoolCounters>,
}

impl InsuranceHook {
    /// Stub oracle, wall clock, legacy prices.
    pub fn with_defaults() -> Self {
        Self::new(HookConfig::default(), FixedPriceOracle::default(), SystemClock)
    }
}

impl<O: PriceOracle, C: Clock> InsuranceHook<O, C> {
    pub fn new(config: HookConfig, oracle: O, clock: C) -> Self {
        Self {
            config,
            oracle,
            clock,
            ledger:   EventLedger::new(),
            engine:   ClaimEngine::new(),
            counters: BTreeMap::new(),
        }
    }

    /// Register a listener for both ledger and claim notifications.
    pub fn subscribe(&mut self, listener: Arc<dyn HookListener>) {
        self.ledger.subscribe(listener.clone());
        self.engine.subscribe(listener);
    }

    pub fn config(&self) -> HookConfig {
        self.config
    }

    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    pub fn engine(&self) -> &ClaimEngine {
        &self.engine
    }

    fn counters_mut(&mut self, pool: &PoolKey) -> &mut PoolCounters {
        self.counters.entry(pool.id).or_default()
    }

    // ─── Queries ──────────────────────────────────────────────────────────────

    pub fn events(&self, user: &Pubkey) -> &[LiquidityEvent] {
        self.ledger.events(user)
    }

    pub fn claim_count(&self, user: &Pubkey) -> usize {
        self.engine.claim_count(user)
    }

    pub fn claim(&self, user: &Pubkey, index: usize) -> Result<&Claim> {
        self.engine.claim(user, index)
    }

    pub fn insurance_for_claim(&self, user: &Pubkey, index: usize) -> Result<ClaimInsurance> {
        self.engine.insurance_for_claim(user, index)
    }

    pub fn total_insurance(&self, user: &Pubkey) -> Result<InsuranceSummary> {
        self.engine.total_insurance(user)
    }

    pub fn is_eligible_for_insurance(&self, user: &Pubkey) -> Result<Eligibility> {
        self.engine.is_eligible_for_insurance(user)
    }

    pub fn oracle_price(&self, asset_a: &Pubkey, asset_b: &Pubkey) -> Result<(U256, U256)> {
        self.oracle.get_price(asset_a, asset_b)
    }

    pub fn pool_counters(&self, pool: &Pubkey) -> PoolCounters {
        self.counters.get(pool).copied().unwrap_or_default()
    }
}

impl<O: PriceOracle, C: Clock> LiquidityHook for InsuranceHook<O, C> {
    fn on_add(
        &mut self,
        user:    Pubkey,
        pool:    &PoolKey,
        delta_a: i128,
        delta_b: i128,
    ) -> Result<LiquidityEvent> {
        let (price_a, price_b) = match self.config.price_mode {
            PriceMode::Legacy => (U256::from(LEGACY_ADD_PRICES.0), U256::from(LEGACY_ADD_PRICES.1)),
            PriceMode::Oracle => self.oracle.get_price(&pool.mint_a, &pool.mint_b)?,
        };
        let now = self.clock.unix_timestamp();
        let (amount_a, amount_b) = (magnitude(delta_a), magnitude(delta_b));

        let event = self
            .ledger
            .record_event(user, true, amount_a, amount_b, price_a, price_b, now)?;
        self.counters_mut(pool).add_liquidity += 1;

        log::info!(
            "Liquidity added: user={} pool={} a={} b={}",
            user, pool.id, amount_a, amount_b
        );
        Ok(event)
    }

    fn on_remove(
        &mut self,
        user:    Pubkey,
        pool:    &PoolKey,
        delta_a: i128,
        delta_b: i128,
    ) -> Result<RemovalOutcome> {
        let valuation_prices = self.oracle.get_price(&pool.mint_a, &pool.mint_b)?;
        let recorded_prices = match self.config.price_mode {
            PriceMode::Legacy => (
                U256::from(LEGACY_REMOVE_PRICES.0),
                U256::from(LEGACY_REMOVE_PRICES.1),
            ),
            PriceMode::Oracle => valuation_prices,
        };
        let now = self.clock.unix_timestamp();
        let (amount_a, amount_b) = (magnitude(delta_a), magnitude(delta_b));

        let outcome = self.engine.on_removal(
            &mut self.ledger,
            user,
            amount_a,
            amount_b,
            recorded_prices,
            valuation_prices,
            now,
        )?;
        self.counters_mut(pool).remove_liquidity += 1;

        log::info!(
            "Liquidity removed: user={} pool={} a={} b={} il={}",
            user, pool.id, amount_a, amount_b, outcome.il_detected
        );
        Ok(outcome)
    }

    fn on_swap(&mut self, pool: &PoolKey, phase: SwapPhase) {
        let counters = self.counters_mut(pool);
        match phase {
            SwapPhase::Before => counters.before_swap += 1,
            SwapPhase::After => counters.after_swap += 1,
        }
    }
}

// ─── SharedHook ───────────────────────────────────────────────────────────────

/// Single serialization point for long-lived services.
///
/// Each call holds the lock for its whole duration; clones share one hook.
#[derive(Debug)]
pub struct SharedHook<O = FixedPriceOracle, C = SystemClock> {
    inner: Arc<Mutex<InsuranceHook<O, C>>>,
}

impl<O, C> Clone for SharedHook<O, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<O: PriceOracle, C: Clock> SharedHook<O, C> {
    pub fn new(hook: InsuranceHook<O, C>) -> Self {
        Self { inner: Arc::new(Mutex::new(hook)) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, InsuranceHook<O, C>>> {
        self.inner.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Run `f` against the hook while holding the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut InsuranceHook<O, C>) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    pub fn on_add(&self, user: Pubkey, pool: &PoolKey, delta_a: i128, delta_b: i128)
        -> Result<LiquidityEvent> {
        self.lock()?.on_add(user, pool, delta_a, delta_b)
    }

    pub fn on_remove(&self, user: Pubkey, pool: &PoolKey, delta_a: i128, delta_b: i128)
        -> Result<RemovalOutcome> {
        self.lock()?.on_remove(user, pool, delta_a, delta_b)
    }

    pub fn on_swap(&self, pool: &PoolKey, phase: SwapPhase) -> Result<()> {
        self.lock()?.on_swap(pool, phase);
        Ok(())
    }

    pub fn claim_count(&self, user: &Pubkey) -> Result<usize> {
        Ok(self.lock()?.claim_count(user))
    }

    pub fn claim(&self, user: &Pubkey, index: usize) -> Result<Claim> {
        self.lock()?.claim(user, index).copied()
    }

    pub fn insurance_for_claim(&self, user: &Pubkey, index: usize) -> Result<ClaimInsurance> {
        self.lock()?.insurance_for_claim(user, index)
    }

    pub fn total_insurance(&self, user: &Pubkey) -> Result<InsuranceSummary> {
        self.lock()?.total_insurance(user)
    }

    pub fn is_eligible_for_insurance(&self, user: &Pubkey) -> Result<Eligibility> {
        self.lock()?.is_eligible_for_insurance(user)
    }

    /// Snapshot of the user's ledger history.
    pub fn events(&self, user: &Pubkey) -> Result<Vec<LiquidityEvent>> {
        Ok(self.lock()?.events(user).to_vec())
    }

    pub fn oracle_price(&self, asset_a: &Pubkey, asset_b: &Pubkey) -> Result<(U256, U256)> {
        self.lock()?.oracle_price(asset_a, asset_b)
    }

    pub fn pool_counters(&self, pool: &Pubkey) -> Result<PoolCounters> {
        Ok(self.lock()?.pool_counters(pool))
    }
}
