//! Error types for bracket generation and progression.

use thiserror::Error;

use crate::bracket::models::MatchId;

/// Bracket errors
///
/// Every operation of the engine returns these synchronously. Nothing is
/// retried or logged on the way out; the caller decides what to do.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Fewer than two entrants were handed to the seeding resolver
    #[error("Insufficient entrants: need at least 2, have {0}")]
    InsufficientEntrants(usize),

    /// Entrant count cannot produce the requested format
    #[error("Invalid entrant count for {format}: {count}")]
    InvalidEntrantCount { format: String, count: usize },

    /// Unknown format string
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Unknown seeding policy string
    #[error("Unsupported seeding policy: {0}")]
    UnsupportedSeedingPolicy(String),

    /// Seed assignment is not a contiguous 1..N permutation (or ids repeat)
    #[error("Invalid seeding: {0}")]
    InvalidSeeding(String),

    /// Score is not decisive for the match's best-of rule
    #[error("Invalid score {score_a}-{score_b} for best of {best_of}")]
    InvalidScore {
        score_a: u32,
        score_b: u32,
        best_of: u8,
    },

    /// Match does not exist in the match set
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Result submitted for a match that is not ready
    #[error("Match {id} is not ready: status {status}")]
    MatchNotReady { id: MatchId, status: String },

    /// Swiss backtracking exhausted every candidate
    #[error("No valid pairing for Swiss round {round}")]
    NoValidPairing { round: u32 },

    /// Two sources target the same downstream slot
    #[error("Advancement conflict: match {source_match} cannot fill {target}")]
    AdvancementConflict { source_match: MatchId, target: String },

    /// Configuration value out of range or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
