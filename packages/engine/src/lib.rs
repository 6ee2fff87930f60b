//! IL-Guard
//!
//! Liquidity-event ledger and impermanent-loss insurance engine that rides
//! along an AMM as a callback hook. Every add and remove is written to an
//! append-only per-LP ledger; every removal is valued against simply holding
//! everything the LP ever deposited, and a shortfall becomes a claim.
//!
//! # Quick Start
//!
//! ```rust
//! use il_guard::{InsuranceHook, LiquidityHook, PoolKey};
//! use solana_sdk::pubkey::Pubkey;
//!
//! const TOKEN: i128 = 1_000_000_000_000_000_000;
//!
//! let mut hook = InsuranceHook::with_defaults();
//! let lp   = Pubkey::new_unique();
//! let pool = PoolKey::new(Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
//!
//! // Host reports a deposit of 100 A + 100 B, then a withdrawal of 90 A + 90 B.
//! hook.on_add(lp, &pool, -100 * TOKEN, -100 * TOKEN)?;
//! let outcome = hook.on_remove(lp, &pool, 90 * TOKEN, 90 * TOKEN)?;
//!
//! assert!(outcome.il_detected);
//! assert_eq!(hook.claim_count(&lp), 1);
//! println!("owed: {}", il_guard::units::format_units(hook.total_insurance(&lp)?.total_insurance));
//! # Ok::<(), il_guard::Error>(())
//! ```
//!
//! # Feature Overview
//!
//! | Item | Description |
//! |------|-------------|
//! | [`EventLedger`] | Append-only per-LP add/remove history |
//! | [`ClaimEngine`] | Hold-vs-pool valuation, claim storage and queries |
//! | [`InsuranceHook`] | [`LiquidityHook`] adapter wiring ledger, engine, oracle and clock |
//! | [`SharedHook`] | Mutex-serialized hook for long-lived services |
//! | [`PriceOracle`] | Price source seam; [`FixedPriceOracle`] is the stub |
//! | [`HookListener`] | "liquidity event recorded" / "claim created" notifications |

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod hook;
pub mod ledger;
pub mod math;
pub mod oracle;
pub mod state;
pub mod types;
pub mod units;

pub use engine::ClaimEngine;
pub use error::{Error, Result};
pub use events::{ClaimCreated, EventLog, HookListener, LiquidityEventRecorded, LogListener, Notification};
pub use hook::{
    Clock, HookConfig, InsuranceHook, LiquidityHook, ManualClock, PriceMode, SharedHook,
    SwapPhase, SystemClock,
};
pub use ledger::EventLedger;
pub use math::U256;
pub use oracle::{FixedPriceOracle, PriceOracle};
pub use state::{Claim, LiquidityEvent, PoolKey};
pub use types::*;
