//! Result types returned by the engine and the hook.

use serde::Serialize;

use crate::math::{shortfall, U256};
use crate::state::Claim;
use crate::units::dec_str;

/// Hold value vs. pool value at a single price pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Valuation {
    #[serde(with = "dec_str")]
    pub value_hold: U256,
    #[serde(with = "dec_str")]
    pub value_pool: U256,
}

impl Valuation {
    /// `Some(value_hold - value_pool)` only when holding was strictly better.
    pub fn shortfall(&self) -> Option<U256> {
        shortfall(self.value_hold, self.value_pool)
    }
}

/// What a removal produced: the IL flag and the claim, if one was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemovalOutcome {
    pub il_detected: bool,
    pub claim: Option<Claim>,
}

impl RemovalOutcome {
    pub fn no_loss() -> Self {
        Self { il_detected: false, claim: None }
    }

    pub fn loss(claim: Claim) -> Self {
        Self { il_detected: true, claim: Some(claim) }
    }
}

/// Insurance owed for a single stored claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClaimInsurance {
    #[serde(with = "dec_str")]
    pub insurance_amount: U256,
    pub has_loss: bool,
}

/// Insurance owed across every claim of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsuranceSummary {
    #[serde(with = "dec_str")]
    pub total_insurance: U256,
    pub total_loss_count: usize,
}

/// Eligibility verdict: any claim on record makes the user eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    #[serde(with = "dec_str")]
    pub total_insurance: U256,
}

/// Callback counters kept per host pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolCounters {
    pub before_swap: u64,
    pub after_swap: u64,
    pub add_liquidity: u64,
    pub remove_liquidity: u64,
}
