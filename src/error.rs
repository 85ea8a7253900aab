use crate::bracket::BracketError;
use crate::models::{CertificateId, PoolId, TournamentId};
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    // ------------------------------------------------------------------
    // Lifecycle state errors
    // ------------------------------------------------------------------
    /// Round cannot advance past the final round
    #[error("Tournament {0} is already in its last round")]
    AlreadyAtLastRound(TournamentId),

    /// Round cannot be reverted below the first round
    #[error("Tournament {0} is still in its first round")]
    StillAtFirstRound(TournamentId),

    /// Final ranking requested before the last round ended
    #[error("Tournament {0} has not ended yet")]
    TournamentNotEnded(TournamentId),

    /// Scoring requested before the oracle revealed the round
    #[error("Round {round} of tournament {tournament_id} is not fully revealed")]
    TruthNotRevealed { tournament_id: TournamentId, round: u32 },

    /// Rewards were already claimed, the ranking can no longer grow
    #[error("Pool {0} already paid out rewards, its leaderboard is locked")]
    LeaderboardLocked(PoolId),

    /// Predictions can only be edited before the current round starts
    #[error("Round {round} of tournament {tournament_id} is already in progress")]
    RoundInProgress { tournament_id: TournamentId, round: u32 },

    // ------------------------------------------------------------------
    // Input validation errors
    // ------------------------------------------------------------------
    /// Round bounds rejected
    #[error("Invalid round bounds: {0}")]
    InvalidBounds(String),

    /// Bracket or truth array of the wrong length
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Rank outside the distribution's tiers
    #[error("Rank {0} is outside the reward tiers")]
    RankOutOfRange(usize),

    /// Certificate is not in the paid positions of the pool
    #[error("Certificate {certificate_id} is not among the winners of pool {pool_id}")]
    NotInWinners {
        pool_id: PoolId,
        certificate_id: CertificateId,
    },

    /// Certificate was never entered into the pool
    #[error("Certificate {certificate_id} has not entered pool {pool_id}")]
    NotAnEntrant {
        pool_id: PoolId,
        certificate_id: CertificateId,
    },

    /// Predictions for already decided rounds were modified
    #[error("Certificate {0} changes picks of rounds that are already locked")]
    LockedSlotsChanged(CertificateId),

    /// Finalization batch disagrees with the finals score already pinned for the pool
    #[error("Pool {pool_id} was finalized with finals score {pinned:?}, got {given:?}")]
    FinalsScoreMismatch {
        pool_id: PoolId,
        pinned: Option<u32>,
        given: Option<u32>,
    },

    /// Batch exceeds the configured limit
    #[error("Batch of {size} ids exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// Generic validation error
    #[error("Validation error: {0}")]
    Validation(String),

    // ------------------------------------------------------------------
    // Idempotent replays
    // ------------------------------------------------------------------
    /// Reward already paid out
    #[error("Certificate {certificate_id} already claimed its reward from pool {pool_id}")]
    AlreadyClaimed {
        pool_id: PoolId,
        certificate_id: CertificateId,
    },

    // ------------------------------------------------------------------
    // Setup and infrastructure errors
    // ------------------------------------------------------------------
    /// Record violates a setup invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Payout could not be executed by the treasury
    #[error("Treasury error: {0}")]
    Treasury(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Message(String),

    /// A replayed scenario step failed
    #[error("Scenario step {step} failed: {source}")]
    ScenarioStep {
        step: usize,
        #[source]
        source: Box<AppError>,
    },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Coarse classification used by callers to decide how to react to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transition invalid for the current lifecycle state, never retried automatically
    State,
    /// Malformed input, caller must correct and resubmit
    Validation,
    /// Replay of an already applied operation, nothing changed
    IdempotencyNoOp,
    /// Broken setup invariant
    InvariantViolation,
    /// Unknown record
    NotFound,
    /// Infrastructure failure
    Internal,
}

impl AppError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::AlreadyAtLastRound(_)
            | AppError::StillAtFirstRound(_)
            | AppError::TournamentNotEnded(_)
            | AppError::TruthNotRevealed { .. }
            | AppError::RoundInProgress { .. }
            | AppError::LeaderboardLocked(_) => ErrorKind::State,
            AppError::InvalidBounds(_)
            | AppError::LengthMismatch { .. }
            | AppError::RankOutOfRange(_)
            | AppError::NotInWinners { .. }
            | AppError::NotAnEntrant { .. }
            | AppError::LockedSlotsChanged(_)
            | AppError::FinalsScoreMismatch { .. }
            | AppError::BatchTooLarge { .. }
            | AppError::Validation(_) => ErrorKind::Validation,
            AppError::AlreadyClaimed { .. } => ErrorKind::IdempotencyNoOp,
            AppError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Treasury(_)
            | AppError::Config(_)
            | AppError::Serialization(_)
            | AppError::Io(_)
            | AppError::Message(_) => ErrorKind::Internal,
            AppError::ScenarioStep { source, .. } => source.kind(),
        }
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if the error only signals an already applied operation
    pub fn is_noop(&self) -> bool {
        self.kind() == ErrorKind::IdempotencyNoOp
    }
}

impl From<BracketError> for AppError {
    fn from(err: BracketError) -> Self {
        match err {
            BracketError::LengthMismatch { expected, actual } => {
                AppError::LengthMismatch { expected, actual }
            }
            BracketError::RankOutOfRange(rank) => AppError::RankOutOfRange(rank),
            BracketError::InvalidRound(round) => {
                AppError::Validation(format!("Round {} does not exist", round))
            }
            BracketError::Overflow(what) => {
                AppError::InvariantViolation(format!("Arithmetic overflow in {}", what))
            }
        }
    }
}

/// Convenience function to convert Option<T> to Result<T, AppError>
pub fn option_to_result<T>(opt: Option<T>, error_msg: &str) -> AppResult<T> {
    opt.ok_or_else(|| AppError::NotFound(error_msg.to_string()))
}
