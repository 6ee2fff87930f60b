//! IL detection and claim storage.
//!
//! On every removal the engine values the LP's cumulative deposits against
//! what the removal actually returned, both at the removal-time prices.
//! A strictly positive shortfall becomes a [`Claim`]. The query side only
//! reads stored claims.

use std::collections::BTreeMap;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};
use crate::events::{ClaimCreated, HookListener, Listeners};
use crate::ledger::EventLedger;
use crate::math::{self, U256};
use crate::state::Claim;
use crate::types::{ClaimInsurance, Eligibility, InsuranceSummary, RemovalOutcome, Valuation};

/// Append-only claim store keyed by LP.
#[derive(Debug, Default)]
pub struct ClaimEngine {
    claims: BTreeMap<Pubkey, Vec<Claim>>,
    listeners: Listeners,
}

impl ClaimEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn HookListener>) {
        self.listeners.subscribe(listener);
    }

    // ─── Removal ──────────────────────────────────────────────────────────────

    /// Preview the hold/pool comparison for a removal without storing anything.
    pub fn preview(
        &self,
        ledger:      &EventLedger,
        user:        &Pubkey,
        withdrawn_a: U256,
        withdrawn_b: U256,
        price_a:     U256,
        price_b:     U256,
    ) -> Result<Valuation> {
        let (total_a, total_b) = ledger.deposit_totals(user);
        math::valuation(total_a, total_b, withdrawn_a, withdrawn_b, price_a, price_b)
    }

    /// Record a removal for `user` in `ledger` and store a claim if holding
    /// was strictly better than the withdrawal.
    ///
    /// The remove entry is stored with `recorded` prices; the comparison uses
    /// `valuation`. Every add ever recorded for the user counts towards the
    /// hold value and earlier removals are ignored. Each call appends exactly
    /// one remove entry and at most one claim. Overflow leaves both the
    /// ledger and the store untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn on_removal(
        &mut self,
        ledger:      &mut EventLedger,
        user:        Pubkey,
        withdrawn_a: U256,
        withdrawn_b: U256,
        recorded:    (U256, U256),
        valuation:   (U256, U256),
        timestamp:   i64,
    ) -> Result<RemovalOutcome> {
        let (price_a, price_b) = valuation;
        let (total_added_a, total_added_b) = ledger.deposit_totals(&user);
        // A removal never changes deposit totals, so the valuation can run
        // before the append.
        let v = self.preview(ledger, &user, withdrawn_a, withdrawn_b, price_a, price_b)?;
        ledger.record_event(user, false, withdrawn_a, withdrawn_b, recorded.0, recorded.1, timestamp)?;

        if v.value_hold <= v.value_pool {
            log::debug!(
                "No IL: user={} hold={} pool={}",
                user, v.value_hold, v.value_pool
            );
            return Ok(RemovalOutcome::no_loss());
        }

        let claim = Claim {
            value_hold: v.value_hold,
            value_pool: v.value_pool,
            total_added_a,
            total_added_b,
            withdrawn_a,
            withdrawn_b,
            price_a,
            price_b,
            timestamp,
        };
        let stored = self.claims.entry(user).or_default();
        stored.push(claim);

        log::info!(
            "Claim created: user={} index={} hold={} pool={}",
            user,
            stored.len() - 1,
            claim.value_hold,
            claim.value_pool
        );
        self.listeners.claim_created(&ClaimCreated { user, claim });
        Ok(RemovalOutcome::loss(claim))
    }

    // ─── Queries ──────────────────────────────────────────────────────────────

    pub fn claims(&self, user: &Pubkey) -> &[Claim] {
        self.claims.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn claim_count(&self, user: &Pubkey) -> usize {
        self.claims(user).len()
    }

    pub fn claim(&self, user: &Pubkey, index: usize) -> Result<&Claim> {
        let claims = self.claims(user);
        claims.get(index).ok_or(Error::IndexOutOfRange { index, len: claims.len() })
    }

    /// Shortfall of the claim at `index`, recomputed from its stored values.
    pub fn insurance_for_claim(&self, user: &Pubkey, index: usize) -> Result<ClaimInsurance> {
        let claim = self.claim(user, index)?;
        Ok(ClaimInsurance {
            insurance_amount: claim.insurance_amount(),
            has_loss: claim.value_hold > claim.value_pool,
        })
    }

    pub fn total_insurance(&self, user: &Pubkey) -> Result<InsuranceSummary> {
        let claims = self.claims(user);
        let total_insurance = claims.iter().try_fold(U256::zero(), |acc, c| {
            acc.checked_add(c.insurance_amount()).ok_or(Error::MathOverflow)
        })?;
        Ok(InsuranceSummary { total_insurance, total_loss_count: claims.len() })
    }

    pub fn is_eligible_for_insurance(&self, user: &Pubkey) -> Result<Eligibility> {
        let summary = self.total_insurance(user)?;
        Ok(Eligibility {
            eligible: self.claim_count(user) > 0,
            total_insurance: summary.total_insurance,
        })
    }

    /// LPs with at least one claim, in key order.
    pub fn claimants(&self) -> impl Iterator<Item = &Pubkey> {
        self.claims.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SCALE_U128;
    use crate::events::EventLog;
    use assert_matches::assert_matches;

    fn units(n: u128) -> U256 {
        U256::from(n * SCALE_U128)
    }

    fn deposit(ledger: &mut EventLedger, user: Pubkey, a: u128, b: u128) {
        ledger.record_event(user, true, units(a), units(b), units(1), units(1), 0).unwrap();
    }

    /// Removal recorded at (1, 2), valued at (10, 20).
    fn withdraw(
        engine: &mut ClaimEngine,
        ledger: &mut EventLedger,
        user:   Pubkey,
        a:      u128,
        b:      u128,
        ts:     i64,
    ) -> Result<RemovalOutcome> {
        engine.on_removal(
            ledger,
            user,
            units(a),
            units(b),
            (units(1), units(2)),
            (units(10), units(20)),
            ts,
        )
    }

    #[test]
    fn lossy_removal_stores_one_claim() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        deposit(&mut ledger, user, 100, 100);

        let out = withdraw(&mut engine, &mut ledger, user, 90, 90, 7).unwrap();
        assert!(out.il_detected);
        let claim = out.claim.unwrap();
        assert_eq!(claim.value_hold, units(3000));
        assert_eq!(claim.value_pool, units(2700));
        assert_eq!(claim.total_added_a, units(100));
        assert_eq!(claim.withdrawn_b, units(90));
        assert_eq!((claim.price_a, claim.price_b), (units(10), units(20)));
        assert_eq!(claim.timestamp, 7);
        assert_eq!(engine.claim(&user, 0).unwrap(), &claim);
        assert_eq!(
            engine.insurance_for_claim(&user, 0).unwrap(),
            ClaimInsurance { insurance_amount: units(300), has_loss: true }
        );
    }

    #[test]
    fn removal_is_appended_to_the_ledger() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        deposit(&mut ledger, user, 100, 100);
        withdraw(&mut engine, &mut ledger, user, 90, 90, 7).unwrap();

        let removal = *ledger.event(&user, 1).unwrap();
        assert!(!removal.is_add);
        assert_eq!((removal.amount_a, removal.amount_b), (units(90), units(90)));
        assert_eq!((removal.price_a, removal.price_b), (units(1), units(2)));
        assert_eq!(removal.timestamp, 7);
        assert_eq!(ledger.deposit_totals(&user), (units(100), units(100)));
    }

    #[test]
    fn claims_never_outnumber_removals() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        deposit(&mut ledger, user, 1, 1);
        for ts in 0..3 {
            withdraw(&mut engine, &mut ledger, user, 0, 0, ts).unwrap();
            assert!(engine.claim_count(&user) <= ledger.removal_count(&user));
        }
        assert_eq!(engine.claim_count(&user), 3);
        assert_eq!(ledger.removal_count(&user), 3);
    }

    #[test]
    fn break_even_removal_stores_nothing() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        deposit(&mut ledger, user, 100, 100);

        let out = withdraw(&mut engine, &mut ledger, user, 100, 100, 1).unwrap();
        assert_eq!(out, RemovalOutcome::no_loss());
        assert_eq!(engine.claim_count(&user), 0);
        assert_eq!(ledger.removal_count(&user), 1);
    }

    #[test]
    fn profitable_removal_stores_nothing() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        deposit(&mut ledger, user, 10, 10);

        let out = withdraw(&mut engine, &mut ledger, user, 20, 5, 1).unwrap();
        assert!(!out.il_detected);
        assert!(engine.claims(&user).is_empty());
    }

    #[test]
    fn removal_without_deposits_never_claims() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        let out = withdraw(&mut engine, &mut ledger, user, 1, 1, 1).unwrap();
        assert!(!out.il_detected);
        assert_eq!(ledger.event_count(&user), 1);
    }

    #[test]
    fn totals_and_eligibility_follow_claims() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        assert_eq!(
            engine.is_eligible_for_insurance(&user).unwrap(),
            Eligibility { eligible: false, total_insurance: U256::zero() }
        );

        deposit(&mut ledger, user, 100, 100);
        withdraw(&mut engine, &mut ledger, user, 90, 90, 1).unwrap();
        // Hold is still 3000; pool 50*10 + 50*20 = 1500.
        withdraw(&mut engine, &mut ledger, user, 50, 50, 2).unwrap();

        let summary = engine.total_insurance(&user).unwrap();
        assert_eq!(summary.total_loss_count, 2);
        assert_eq!(summary.total_insurance, units(300 + 1500));
        assert!(summary.total_loss_count <= ledger.removal_count(&user));
        assert_eq!(
            engine.is_eligible_for_insurance(&user).unwrap(),
            Eligibility { eligible: true, total_insurance: units(1800) }
        );
    }

    #[test]
    fn out_of_range_claim_is_an_error() {
        let engine = ClaimEngine::new();
        let user = Pubkey::new_unique();
        assert_matches!(engine.claim(&user, 0), Err(Error::IndexOutOfRange { index: 0, len: 0 }));
        assert_matches!(engine.insurance_for_claim(&user, 3), Err(Error::IndexOutOfRange { .. }));
    }

    #[test]
    fn overflowing_valuation_leaves_no_trace() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        ledger.record_event(user, true, U256::MAX, U256::zero(), units(1), units(1), 0).unwrap();

        let r = withdraw(&mut engine, &mut ledger, user, 1, 1, 1);
        assert_matches!(r, Err(Error::MathOverflow));
        assert_eq!(engine.claim_count(&user), 0);
        assert_eq!(ledger.event_count(&user), 1);
    }

    #[test]
    fn claims_are_announced_with_every_field() {
        let (mut ledger, mut engine) = (EventLedger::new(), ClaimEngine::new());
        let log = EventLog::new();
        engine.subscribe(Arc::new(log.clone()));
        let user = Pubkey::new_unique();
        deposit(&mut ledger, user, 100, 100);
        let claim = withdraw(&mut engine, &mut ledger, user, 90, 90, 3)
            .unwrap()
            .claim
            .unwrap();

        assert_eq!(log.claims_created(), vec![ClaimCreated { user, claim }]);
        assert_eq!(engine.claimants().collect::<Vec<_>>(), vec![&user]);
    }

    #[test]
    fn preview_does_not_store() {
        let (mut ledger, engine) = (EventLedger::new(), ClaimEngine::new());
        let user = Pubkey::new_unique();
        deposit(&mut ledger, user, 100, 100);
        let v = engine
            .preview(&ledger, &user, units(90), units(90), units(10), units(20))
            .unwrap();
        assert_eq!(v.shortfall(), Some(units(300)));
        assert_eq!(engine.claim_count(&user), 0);
        assert_eq!(ledger.removal_count(&user), 0);
    }
}
