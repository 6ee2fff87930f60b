//! Fixed-point valuation math.
//!
//! Amounts and prices carry 18 fractional digits. Every `amount × price`
//! product is computed in 256 bits with checked operations so that an
//! out-of-range input surfaces as [`Error::MathOverflow`] instead of wrapping.

use crate::constants::scale;
use crate::error::{Error, Result};
use crate::types::Valuation;

// The macro expansion names `Result<T, E>` unqualified; keep it away from the
// crate alias above.
mod wide {
    #![allow(clippy::assign_op_pattern, clippy::manual_div_ceil)]

    uint::construct_uint! {
        /// 256-bit unsigned integer used for every amount, price and value.
        pub struct U256(4);
    }
}

pub use wide::U256;

// ─── Valuation ────────────────────────────────────────────────────────────────

/// Value of an `(amount_a, amount_b)` basket at `(price_a, price_b)`.
///
/// `amount_a * price_a / SCALE + amount_b * price_b / SCALE`, each term
/// floored independently.
pub fn basket_value(
    amount_a: U256,
    amount_b: U256,
    price_a:  U256,
    price_b:  U256,
) -> Result<U256> {
    let value_a = amount_a
        .checked_mul(price_a)
        .ok_or(Error::MathOverflow)?
        / scale();
    let value_b = amount_b
        .checked_mul(price_b)
        .ok_or(Error::MathOverflow)?
        / scale();
    value_a.checked_add(value_b).ok_or(Error::MathOverflow)
}

/// Hold value of everything ever deposited against the value actually
/// withdrawn, both at the same removal-time prices.
///
/// * `total_added_a` / `total_added_b` – cumulative deposits of the user
/// * `withdrawn_a` / `withdrawn_b`     – magnitudes leaving the pool now
/// * `price_a` / `price_b`             – valuation prices
pub fn valuation(
    total_added_a: U256,
    total_added_b: U256,
    withdrawn_a:   U256,
    withdrawn_b:   U256,
    price_a:       U256,
    price_b:       U256,
) -> Result<Valuation> {
    Ok(Valuation {
        value_hold: basket_value(total_added_a, total_added_b, price_a, price_b)?,
        value_pool: basket_value(withdrawn_a, withdrawn_b, price_a, price_b)?,
    })
}

/// `value_hold - value_pool` when a loss exists, `None` otherwise.
pub fn shortfall(value_hold: U256, value_pool: U256) -> Option<U256> {
    if value_hold > value_pool {
        Some(value_hold - value_pool)
    } else {
        None
    }
}

/// Magnitude of a signed host balance delta.
pub fn magnitude(delta: i128) -> U256 {
    U256::from(delta.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SCALE_U128;
    use assert_matches::assert_matches;

    fn units(n: u128) -> U256 {
        U256::from(n * SCALE_U128)
    }

    #[test]
    fn basket_value_floors_each_term() {
        // 1 wei × 0.5 → 0, twice; flooring per term means the sum stays 0.
        let half = U256::from(SCALE_U128 / 2);
        let v = basket_value(U256::one(), U256::one(), half, half).unwrap();
        assert_eq!(v, U256::zero());
    }

    #[test]
    fn valuation_matches_hand_computed_loss() {
        let v = valuation(units(100), units(100), units(90), units(90), units(10), units(20)).unwrap();
        assert_eq!(v.value_hold, units(3000));
        assert_eq!(v.value_pool, units(2700));
        assert_eq!(v.shortfall(), Some(units(300)));
    }

    #[test]
    fn product_overflow_is_reported() {
        let r = basket_value(U256::MAX, U256::zero(), U256::from(2u8), U256::zero());
        assert_matches!(r, Err(Error::MathOverflow));
    }

    #[test]
    fn shortfall_requires_strict_loss() {
        assert_eq!(shortfall(units(5), units(5)), None);
        assert_eq!(shortfall(units(4), units(5)), None);
        assert_eq!(shortfall(units(6), units(5)), Some(units(1)));
    }

    #[test]
    fn magnitude_ignores_sign() {
        assert_eq!(magnitude(-42), U256::from(42u8));
        assert_eq!(magnitude(42), U256::from(42u8));
        assert_eq!(magnitude(i128::MIN), U256::from(i128::MIN.unsigned_abs()));
    }
}
