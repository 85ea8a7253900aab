pub mod audit;
pub mod leaderboard_service;
pub mod oracle_service;
pub mod reward_service;
pub mod round_service;
pub mod scoring_service;
pub mod treasury;

pub use audit::AuditTrailService;
pub use leaderboard_service::{FinalizeOutcome, LeaderboardService};
pub use oracle_service::OracleService;
pub use reward_service::RewardService;
pub use round_service::RoundService;
pub use scoring_service::{ScoreOutcome, ScoringService};
pub use treasury::{InMemoryTreasury, Payout, Treasury};
