//! Human-decimal conversion and serde adapters.
//!
//! `"1.5"` ⇄ `1_500_000_000_000_000_000` at 18 decimals. Serialized forms use
//! decimal strings for [`U256`] and base-58 for [`Pubkey`] so JSON stays
//! readable and lossless.

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::constants::{scale, SCALE_DECIMALS};
use crate::error::{Error, Result};
use crate::math::U256;

fn parse_err(input: &str, reason: impl Into<String>) -> Error {
    Error::Parse { input: input.to_string(), reason: reason.into() }
}

// ─── Decimal ⇄ fixed-point ────────────────────────────────────────────────────

/// Parse an unsigned human decimal (`"100"`, `"0.25"`) into 18-decimal fixed point.
pub fn parse_units(input: &str) -> Result<U256> {
    let s = input.trim();
    if s.is_empty() {
        return Err(parse_err(input, "empty amount"));
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(parse_err(input, "no digits"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(parse_err(input, "expected digits with at most one '.'"));
    }
    if frac.len() > SCALE_DECIMALS {
        return Err(parse_err(input, format!("more than {SCALE_DECIMALS} fractional digits")));
    }

    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|e| parse_err(input, format!("{e:?}")))?
    };
    let frac = if frac.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{frac:0<width$}", width = SCALE_DECIMALS);
        U256::from_dec_str(&padded).map_err(|e| parse_err(input, format!("{e:?}")))?
    };

    whole
        .checked_mul(scale())
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| parse_err(input, "amount exceeds 256 bits"))
}

/// Parse a signed human decimal (`"-100"`) into a raw host delta.
pub fn parse_signed_units(input: &str) -> Result<i128> {
    let s = input.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let magnitude = parse_units(digits)?;
    let limit = U256::from(i128::MAX.unsigned_abs());
    if magnitude > limit {
        return Err(parse_err(input, "delta exceeds i128"));
    }
    let value = magnitude.low_u128() as i128;
    Ok(if negative { -value } else { value })
}

/// Format 18-decimal fixed point as a human decimal, trimming trailing zeros.
pub fn format_units(value: U256) -> String {
    let (whole, frac) = value.div_mod(scale());
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = SCALE_DECIMALS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Parse a base-58 identity.
pub fn parse_pubkey(input: &str) -> Result<Pubkey> {
    Pubkey::from_str(input.trim()).map_err(|e| parse_err(input, e.to_string()))
}

// ─── Serde adapters ───────────────────────────────────────────────────────────

/// `#[serde(with = "il_guard::units::dec_str")]`: [`U256`] as a decimal string
/// of raw fixed-point units.
pub mod dec_str {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use crate::math::U256;

    pub fn serialize<S: Serializer>(value: &U256, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<U256, D::Error> {
        let raw = String::deserialize(d)?;
        U256::from_dec_str(&raw).map_err(|e| D::Error::custom(format!("invalid U256 '{raw}': {e:?}")))
    }
}

/// `#[serde(with = "il_guard::units::base58")]`: [`Pubkey`] as a base-58 string.
pub mod base58 {
    use std::str::FromStr;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(key: &Pubkey, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Pubkey, D::Error> {
        let raw = String::deserialize(d)?;
        Pubkey::from_str(&raw).map_err(|e| D::Error::custom(format!("invalid pubkey '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SCALE_U128;
    use assert_matches::assert_matches;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(parse_units("100").unwrap(), U256::from(100 * SCALE_U128));
        assert_eq!(parse_units("0.25").unwrap(), U256::from(SCALE_U128 / 4));
        assert_eq!(parse_units(".5").unwrap(), U256::from(SCALE_U128 / 2));
        assert_eq!(parse_units("0.000000000000000001").unwrap(), U256::one());
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert_matches!(parse_units(""), Err(Error::Parse { .. }));
        assert_matches!(parse_units("."), Err(Error::Parse { .. }));
        assert_matches!(parse_units("1.2.3"), Err(Error::Parse { .. }));
        assert_matches!(parse_units("-1"), Err(Error::Parse { .. }));
        assert_matches!(parse_units("0.0000000000000000001"), Err(Error::Parse { .. }));
    }

    #[test]
    fn signed_deltas_keep_their_sign() {
        assert_eq!(parse_signed_units("-100").unwrap(), -100 * SCALE_U128 as i128);
        assert_eq!(parse_signed_units("+2.5").unwrap(), 5 * SCALE_U128 as i128 / 2);
        assert_matches!(parse_signed_units("1000000000000000000000"), Err(Error::Parse { .. }));
    }

    #[test]
    fn formats_trimmed_decimals() {
        assert_eq!(format_units(U256::from(3000 * SCALE_U128)), "3000");
        assert_eq!(format_units(U256::from(SCALE_U128 / 4)), "0.25");
        assert_eq!(format_units(U256::one()), "0.000000000000000001");
        assert_eq!(format_units(U256::zero()), "0");
    }

    #[test]
    fn serde_adapters_use_strings() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Row {
            #[serde(with = "dec_str")]
            amount: U256,
            #[serde(with = "base58")]
            owner: Pubkey,
        }

        let row = Row { amount: U256::from(7u8), owner: Pubkey::default() };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, format!(r#"{{"amount":"7","owner":"{}"}}"#, Pubkey::default()));
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
