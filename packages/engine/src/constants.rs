use crate::math::U256;

/// Fixed-point scale shared by amounts and prices: 18 fractional digits.
pub const SCALE_DECIMALS: usize = 18;

/// `10^18` as a plain integer, for building constants.
pub const SCALE_U128: u128 = 1_000_000_000_000_000_000;

/// `10^18` as a [`U256`].
pub fn scale() -> U256 {
    U256::from(SCALE_U128)
}

// ─── Legacy price placeholders ────────────────────────────────────────────────
// Values the host integration has always written, kept for `PriceMode::Legacy`.

/// Prices stored on add-liquidity ledger entries: (1, 1).
pub const LEGACY_ADD_PRICES: (u128, u128) = (SCALE_U128, SCALE_U128);

/// Prices stored on remove-liquidity ledger entries: (1, 2).
pub const LEGACY_REMOVE_PRICES: (u128, u128) = (SCALE_U128, 2 * SCALE_U128);

/// Stub oracle output used for claim valuation: (10, 20).
pub const DEFAULT_ORACLE_PRICES: (u128, u128) = (10 * SCALE_U128, 20 * SCALE_U128);
