//! Append-only per-user liquidity ledger.

use std::collections::BTreeMap;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};
use crate::events::{HookListener, Listeners, LiquidityEventRecorded};
use crate::math::U256;
use crate::state::LiquidityEvent;

#[derive(Debug, Default)]
struct UserLedger {
    events: Vec<LiquidityEvent>,
    // Running sums over `is_add` entries; equal to a full rescan at all times.
    total_added_a: U256,
    total_added_b: U256,
}

/// Per-user history of every add and remove, in call order.
///
/// There is no update, delete or reorder path. Entries are the audit trail
/// every claim is recomputed from.
#[derive(Debug, Default)]
pub struct EventLedger {
    users: BTreeMap<Pubkey, UserLedger>,
    listeners: Listeners,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn HookListener>) {
        self.listeners.subscribe(listener);
    }

    /// Append an event for `user` and notify listeners.
    ///
    /// Amounts are taken as given. An add fails fast when the user's running
    /// deposit total would exceed 256 bits, rather than at the next removal;
    /// nothing is appended in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn record_event(
        &mut self,
        user:      Pubkey,
        is_add:    bool,
        amount_a:  U256,
        amount_b:  U256,
        price_a:   U256,
        price_b:   U256,
        timestamp: i64,
    ) -> Result<LiquidityEvent> {
        let entry = self.users.entry(user).or_default();

        // Compute new totals before touching anything.
        let (total_a, total_b) = if is_add {
            (
                entry.total_added_a.checked_add(amount_a).ok_or(Error::MathOverflow)?,
                entry.total_added_b.checked_add(amount_b).ok_or(Error::MathOverflow)?,
            )
        } else {
            (entry.total_added_a, entry.total_added_b)
        };

        let event = LiquidityEvent { is_add, amount_a, amount_b, price_a, price_b, timestamp };
        entry.events.push(event);
        entry.total_added_a = total_a;
        entry.total_added_b = total_b;

        log::debug!(
            "Liquidity recorded: user={} add={} a={} b={} n={}",
            user, is_add, amount_a, amount_b, entry.events.len()
        );

        self.listeners.liquidity_event(&LiquidityEventRecorded {
            user,
            is_add,
            amount_a,
            amount_b,
            timestamp,
        });
        Ok(event)
    }

    /// Full history for `user`; empty if the user never appeared.
    pub fn events(&self, user: &Pubkey) -> &[LiquidityEvent] {
        self.users.get(user).map(|u| u.events.as_slice()).unwrap_or(&[])
    }

    pub fn event_count(&self, user: &Pubkey) -> usize {
        self.events(user).len()
    }

    pub fn event(&self, user: &Pubkey, index: usize) -> Result<&LiquidityEvent> {
        let events = self.events(user);
        events.get(index).ok_or(Error::IndexOutOfRange { index, len: events.len() })
    }

    /// Sum of `amount_a` / `amount_b` over every add event, by full rescan.
    pub fn cumulative_deposits(&self, user: &Pubkey) -> Result<(U256, U256)> {
        self.events(user)
            .iter()
            .filter(|e| e.is_add)
            .try_fold((U256::zero(), U256::zero()), |(a, b), e| {
                Ok((
                    a.checked_add(e.amount_a).ok_or(Error::MathOverflow)?,
                    b.checked_add(e.amount_b).ok_or(Error::MathOverflow)?,
                ))
            })
    }

    /// Cached cumulative deposits, O(1). Always equal to [`Self::cumulative_deposits`].
    pub fn deposit_totals(&self, user: &Pubkey) -> (U256, U256) {
        self.users
            .get(user)
            .map(|u| (u.total_added_a, u.total_added_b))
            .unwrap_or_default()
    }

    /// Number of remove events for `user`; upper bound on their claim count.
    pub fn removal_count(&self, user: &Pubkey) -> usize {
        self.events(user).iter().filter(|e| !e.is_add).count()
    }

    /// Every identity with at least one event, in key order.
    pub fn users(&self) -> impl Iterator<Item = &Pubkey> {
        self.users.keys()
    }
}
