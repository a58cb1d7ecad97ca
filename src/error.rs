//! Error kinds the core distinguishes.

/// Errors surfaced by the ring, NVM, or scheduler.
///
/// Power interruption is explicitly *not* an error — it is handled by
/// suspension (see [`crate::scheduler`]) and never produces a value here.
#[derive(Debug, thiserror::Error)]
pub enum TesseraError {
    /// Invalid ring parameters: `n` is not a power of two, or no primitive
    /// `n`-th root of unity exists mod `q`.
    #[error("invalid ring parameters: n={n}, q={q} ({reason})")]
    InvalidParameters { n: usize, q: i64, reason: &'static str },

    /// An operand's length did not match the ring's transform length `n`.
    #[error("shape error: expected length {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// `STATE_ADDR` indicated progress but the matching data checkpoint was
    /// absent from NVM. The scheduler treats the counter as authoritative
    /// and refuses to silently restart from zero.
    #[error("corrupt checkpoint: STATE_ADDR={step} but DATA_BASE+{addr} is absent")]
    CorruptCheckpoint { step: usize, addr: i64 },
}

pub type Result<T> = std::result::Result<T, TesseraError>;
