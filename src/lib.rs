//! Bracket Pool Library
//!
//! Round state machine, bracket scoring, pool leaderboards and reward tiers
//! for single-elimination prediction tournaments.

pub mod bracket;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod repositories;
pub mod scenario;
pub mod services;

// Re-export commonly used types
pub use config::{AppConfig, EngineConfig};
pub use error::{AppError, AppResult, ErrorKind};

use clock::Clock;
use notifier::EventNotifier;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub config: EngineConfig,
    pub clock: Arc<dyn Clock>,
    pub notifier: EventNotifier,
    pub tournament_repo: Arc<TournamentRepository>,
    pub certificate_repo: Arc<CertificateRepository>,
    pub pool_repo: Arc<PoolRepository>,
    pub distribution_repo: Arc<DistributionRepository>,
    pub rounds: RoundService,
    pub oracle: OracleService,
    pub scoring: ScoringService,
    pub leaderboards: LeaderboardService,
    pub rewards: RewardService,
}

impl AppState {
    /// Create a new AppState with empty repositories
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>, treasury: Arc<dyn Treasury>) -> Self {
        let notifier = EventNotifier::new(config.event_buffer);
        let tournament_repo = Arc::new(TournamentRepository::new());
        let certificate_repo = Arc::new(CertificateRepository::new());
        let pool_repo = Arc::new(PoolRepository::new());
        let distribution_repo = Arc::new(DistributionRepository::new());

        Self {
            rounds: RoundService::new(tournament_repo.clone(), clock.clone(), notifier.clone()),
            oracle: OracleService::new(tournament_repo.clone(), notifier.clone()),
            scoring: ScoringService::new(
                tournament_repo.clone(),
                certificate_repo.clone(),
                clock.clone(),
                notifier.clone(),
                config.clone(),
            ),
            leaderboards: LeaderboardService::new(
                pool_repo.clone(),
                tournament_repo.clone(),
                certificate_repo.clone(),
                distribution_repo.clone(),
                clock.clone(),
                notifier.clone(),
                config.clone(),
            ),
            rewards: RewardService::new(
                pool_repo.clone(),
                distribution_repo.clone(),
                treasury,
                notifier.clone(),
            ),
            config,
            clock,
            notifier,
            tournament_repo,
            certificate_repo,
            pool_repo,
            distribution_repo,
        }
    }
}
