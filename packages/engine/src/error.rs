//! Engine error type.

/// All errors returned by the IL-Guard engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Queries ──────────────────────────────────────────────────────────────
    /// A claim or ledger index at or beyond the stored count.
    #[error("Index {index} out of range (stored: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    // ── Arithmetic ───────────────────────────────────────────────────────────
    /// A 256-bit amount × price product or sum did not fit.
    #[error("Integer overflow in valuation math")]
    MathOverflow,

    // ── Input parsing ────────────────────────────────────────────────────────
    /// A decimal amount or base-58 identity could not be parsed.
    #[error("Cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },

    // ── Collaborators ────────────────────────────────────────────────────────
    /// The price oracle could not produce a price pair.
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// A thread panicked while holding the shared hook lock.
    #[error("Shared hook lock poisoned")]
    LockPoisoned,
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;
