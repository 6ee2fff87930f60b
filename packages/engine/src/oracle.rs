//! Price source used to value removals.

use solana_sdk::pubkey::Pubkey;

use crate::constants::DEFAULT_ORACLE_PRICES;
use crate::error::Result;
use crate::math::U256;

/// Supplies 18-decimal prices for the two assets of a pool.
pub trait PriceOracle: Send + Sync {
    fn get_price(&self, asset_a: &Pubkey, asset_b: &Pubkey) -> Result<(U256, U256)>;
}

/// Deterministic stub: returns the same pair whatever assets are asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPriceOracle {
    pub price_a: U256,
    pub price_b: U256,
}

impl FixedPriceOracle {
    pub fn new(price_a: U256, price_b: U256) -> Self {
        Self { price_a, price_b }
    }
}

impl Default for FixedPriceOracle {
    /// `(10, 20)` at 18 decimals.
    fn default() -> Self {
        Self::new(
            U256::from(DEFAULT_ORACLE_PRICES.0),
            U256::from(DEFAULT_ORACLE_PRICES.1),
        )
    }
}

impl PriceOracle for FixedPriceOracle {
    fn get_price(&self, _asset_a: &Pubkey, _asset_b: &Pubkey) -> Result<(U256, U256)> {
        Ok((self.price_a, self.price_b))
    }
}

impl<O: PriceOracle + ?Sized> PriceOracle for Box<O> {
    fn get_price(&self, asset_a: &Pubkey, asset_b: &Pubkey) -> Result<(U256, U256)> {
        (**self).get_price(asset_a, asset_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SCALE_U128;

    #[test]
    fn stub_ignores_assets() {
        let oracle = FixedPriceOracle::default();
        let (x, y) = (Pubkey::new_unique(), Pubkey::new_unique());
        let expected = (U256::from(10 * SCALE_U128), U256::from(20 * SCALE_U128));
        assert_eq!(oracle.get_price(&x, &y).unwrap(), expected);
        assert_eq!(oracle.get_price(&y, &x).unwrap(), expected);
    }
}
