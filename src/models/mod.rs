//! Domain models for the bracket pool engine.
//!
//! Tournaments own the round lifecycle and the truth store, certificates own
//! their predictions and accrued score, pools own their leaderboard and claims.

pub mod certificate;
pub mod pool;
pub mod reward_distribution;
pub mod tournament;

pub type TournamentId = u64;
pub type CertificateId = u64;
pub type PoolId = u64;
pub type DistributionId = u64;
pub type TeamId = u32;

/// Truth slot whose winner is not known yet
pub const UNREVEALED: TeamId = 0;

// Re-export all models for convenient access
pub use certificate::{Bracket, Certificate};
pub use pool::Pool;
pub use reward_distribution::RewardDistribution;
pub use tournament::{RoundBounds, Tournament, Truth};
