//! Outbound notifications.
//!
//! The ledger announces every append and the engine announces every claim.
//! Listeners are the only way state leaves the process, so they double as
//! the archival hook for hosts that need to persist history elsewhere.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::math::U256;
use crate::state::Claim;
use crate::units::{base58, dec_str, format_units};

/// Fired once per ledger append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiquidityEventRecorded {
    #[serde(with = "base58")]
    pub user: Pubkey,
    pub is_add: bool,
    #[serde(with = "dec_str")]
    pub amount_a: U256,
    #[serde(with = "dec_str")]
    pub amount_b: U256,
    pub timestamp: i64,
}

/// Fired once per stored claim, carrying every claim field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClaimCreated {
    #[serde(with = "base58")]
    pub user: Pubkey,
    #[serde(flatten)]
    pub claim: Claim,
}

/// Receiver of ledger and claim notifications. Both methods default to no-ops.
pub trait HookListener: Send + Sync {
    fn on_liquidity_event(&self, _event: &LiquidityEventRecorded) {}

    fn on_claim_created(&self, _event: &ClaimCreated) {}
}

/// A single notification, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    LiquidityEventRecorded(LiquidityEventRecorded),
    ClaimCreated(ClaimCreated),
}

/// Collects notifications in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn notifications(&self) -> Vec<Notification> {
        match self.inner.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn claims_created(&self) -> Vec<ClaimCreated> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::ClaimCreated(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn push(&self, n: Notification) {
        match self.inner.lock() {
            Ok(mut buf) => buf.push(n),
            Err(poisoned) => poisoned.into_inner().push(n),
        }
    }
}

impl HookListener for EventLog {
    fn on_liquidity_event(&self, event: &LiquidityEventRecorded) {
        self.push(Notification::LiquidityEventRecorded(*event));
    }

    fn on_claim_created(&self, event: &ClaimCreated) {
        self.push(Notification::ClaimCreated(*event));
    }
}

/// Forwards notifications to the `log` facade at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl HookListener for LogListener {
    fn on_liquidity_event(&self, e: &LiquidityEventRecorded) {
        log::info!(
            "LiquidityEventRecorded: user={} add={} a={} b={} ts={}",
            e.user,
            e.is_add,
            format_units(e.amount_a),
            format_units(e.amount_b),
            e.timestamp
        );
    }

    fn on_claim_created(&self, e: &ClaimCreated) {
        log::info!(
            "ClaimCreated: user={} hold={} pool={} shortfall={} ts={}",
            e.user,
            format_units(e.claim.value_hold),
            format_units(e.claim.value_pool),
            format_units(e.claim.insurance_amount()),
            e.claim.timestamp
        );
    }
}

/// Fan-out list shared by the ledger and the engine.
#[derive(Clone, Default)]
pub struct Listeners {
    subscribers: Vec<Arc<dyn HookListener>>,
}

impl Listeners {
    pub fn subscribe(&mut self, listener: Arc<dyn HookListener>) {
        self.subscribers.push(listener);
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub(crate) fn liquidity_event(&self, event: &LiquidityEventRecorded) {
        for l in &self.subscribers {
            l.on_liquidity_event(event);
        }
    }

    pub(crate) fn claim_created(&self, event: &ClaimCreated) {
        for l in &self.subscribers {
            l.on_claim_created(event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("len", &self.subscribers.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SCALE_U128;

    fn claim() -> Claim {
        let u = |n: u128| U256::from(n * SCALE_U128);
        Claim {
            value_hold: u(3000),
            value_pool: u(2700),
            total_added_a: u(100),
            total_added_b: u(100),
            withdrawn_a: u(90),
            withdrawn_b: u(90),
            price_a: u(10),
            price_b: u(20),
            timestamp: 5,
        }
    }

    #[test]
    fn fan_out_reaches_every_subscriber() {
        let (first, second) = (EventLog::new(), EventLog::new());
        let mut listeners = Listeners::default();
        assert!(listeners.is_empty());
        listeners.subscribe(Arc::new(first.clone()));
        listeners.subscribe(Arc::new(second.clone()));
        listeners.subscribe(Arc::new(LogListener));
        assert_eq!(listeners.len(), 3);

        let created = ClaimCreated { user: Pubkey::new_unique(), claim: claim() };
        listeners.claim_created(&created);
        assert_eq!(first.claims_created(), vec![created]);
        assert_eq!(second.notifications(), first.notifications());
    }

    #[test]
    fn claim_notification_serializes_flat() {
        let user = Pubkey::new_unique();
        let n = Notification::ClaimCreated(ClaimCreated { user, claim: claim() });
        let v = serde_json::to_value(n).unwrap();
        assert_eq!(v["kind"], "claim_created");
        assert_eq!(v["user"], user.to_string());
        assert_eq!(v["value_hold"], (3000 * SCALE_U128).to_string());
        assert_eq!(v["timestamp"], 5);
    }
}
