//! Pure bracket math: scoring, ranking and payout tiers.
//!
//! Nothing in here touches storage, locks or the clock; services feed it
//! snapshots of the records they hold.

pub mod payout;
pub mod ranking;
pub mod scoring;

use thiserror::Error;

pub use payout::{quote_reward, RewardQuote};
pub use ranking::{Leaderboard, LeaderboardEntry};
pub use scoring::{
    bracket_potential, calc_bracket_points, calc_points_will_be_lost, points_already_lost,
    round_points, BracketPoints,
};

/// Error types for bracket math
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BracketError {
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Round {0} does not exist")]
    InvalidRound(u32),

    #[error("Rank {0} is outside the reward tiers")]
    RankOutOfRange(usize),

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

/// Result type for bracket math
pub type BracketResult<T> = Result<T, BracketError>;
