//! Ledger and claim records.
//!
//! Both records are immutable once appended; nothing in the crate hands out
//! a mutable reference to a stored entry.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::math::U256;
use crate::units::{base58, dec_str};

// ─── LiquidityEvent ───────────────────────────────────────────────────────────

/// One add or remove of the two pool assets by a single LP.
///
/// Amounts are magnitudes; the direction lives in `is_add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityEvent {
    /// `true` for a deposit, `false` for a withdrawal
    pub is_add: bool,
    #[serde(with = "dec_str")]
    pub amount_a: U256,
    #[serde(with = "dec_str")]
    pub amount_b: U256,
    /// Prices recorded with the entry (not necessarily the valuation prices)
    #[serde(with = "dec_str")]
    pub price_a: U256,
    #[serde(with = "dec_str")]
    pub price_b: U256,
    /// Unix seconds
    pub timestamp: i64,
}

// ─── Claim ────────────────────────────────────────────────────────────────────

/// Insurance claim derived from a removal that lost value against holding.
///
/// Only ever constructed with `value_hold > value_pool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Value of every token the LP ever deposited, at removal-time prices
    #[serde(with = "dec_str")]
    pub value_hold: U256,
    /// Value of the tokens withdrawn by this removal, at the same prices
    #[serde(with = "dec_str")]
    pub value_pool: U256,
    #[serde(with = "dec_str")]
    pub total_added_a: U256,
    #[serde(with = "dec_str")]
    pub total_added_b: U256,
    #[serde(with = "dec_str")]
    pub withdrawn_a: U256,
    #[serde(with = "dec_str")]
    pub withdrawn_b: U256,
    #[serde(with = "dec_str")]
    pub price_a: U256,
    #[serde(with = "dec_str")]
    pub price_b: U256,
    pub timestamp: i64,
}

impl Claim {
    /// Shortfall recomputed from the stored values.
    ///
    /// Saturates at zero, which can only happen for a hand-built record.
    pub fn insurance_amount(&self) -> U256 {
        self.value_hold.saturating_sub(self.value_pool)
    }
}

// ─── PoolKey ──────────────────────────────────────────────────────────────────

/// Host pool identity plus the two assets handed to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    #[serde(with = "base58")]
    pub id: Pubkey,
    #[serde(with = "base58")]
    pub mint_a: Pubkey,
    #[serde(with = "base58")]
    pub mint_b: Pubkey,
}

impl PoolKey {
    pub fn new(id: Pubkey, mint_a: Pubkey, mint_b: Pubkey) -> Self {
        Self { id, mint_a, mint_b }
    }
}
