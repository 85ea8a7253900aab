//! Scripted replay of a whole tournament against a manual clock.
//!
//! A scenario seeds distributions, tournaments, certificates and pools, then
//! runs an ordered list of steps. The report it produces (leaderboards,
//! digests, payouts) is deterministic for a given scenario file.

use crate::bracket::LeaderboardEntry;
use crate::clock::{Clock, ManualClock};
use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    Bracket, Certificate, CertificateId, DistributionId, Pool, PoolId, RewardDistribution, TeamId,
    Tournament, TournamentId,
};
use crate::services::{InMemoryTreasury, Payout};
use crate::AppState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionPreset {
    Top1,
    Top5,
    Top10,
    Top100,
}

/// Reward table, either a preset or explicit ranges and percentages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSeed {
    pub id: DistributionId,
    #[serde(default)]
    pub preset: Option<DistributionPreset>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ranges: Vec<u32>,
    #[serde(default)]
    pub percentages_bps: Vec<u16>,
    #[serde(default)]
    pub is_all_or_nothing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSeed {
    pub id: TournamentId,
    pub name: String,
    pub round_match_count: Vec<u32>,
    pub max_points: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSeed {
    pub id: CertificateId,
    pub tournament_id: TournamentId,
    pub teams_ids: Vec<TeamId>,
    #[serde(default)]
    pub finals_score_sum: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSeed {
    pub id: PoolId,
    pub tournament_id: TournamentId,
    pub reward_distribution_id: DistributionId,
    #[serde(default)]
    pub royalty_bps: u16,
    #[serde(default)]
    pub total_funds: u128,
    #[serde(default)]
    pub entrants: Vec<CertificateId>,
}

/// One replayed operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    SetClock {
        now: i64,
    },
    SetRoundBounds {
        tournament_id: TournamentId,
        round: u32,
        start: i64,
        end: i64,
    },
    RevealTruth {
        tournament_id: TournamentId,
        teams_ids: Vec<TeamId>,
    },
    SetFinalsScoreSum {
        tournament_id: TournamentId,
        finals_score_sum: u32,
    },
    /// Scores the listed certificates, or every certificate of the tournament
    ScoreRound {
        tournament_id: TournamentId,
        #[serde(default)]
        certificate_ids: Option<Vec<CertificateId>>,
    },
    AdvanceRound {
        tournament_id: TournamentId,
    },
    RevertRound {
        tournament_id: TournamentId,
    },
    UpdatePredictions {
        certificate_id: CertificateId,
        teams_ids: Vec<TeamId>,
        finals_score_sum: u32,
    },
    /// Finalizes the listed certificates, or every entrant of the pool
    FinalizeScores {
        pool_id: PoolId,
        #[serde(default)]
        actual_finals_score_sum: Option<u32>,
        #[serde(default)]
        certificate_ids: Option<Vec<CertificateId>>,
    },
    Claim {
        pool_id: PoolId,
        certificate_id: CertificateId,
    },
}

/// A replayable scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub distributions: Vec<DistributionSeed>,
    pub tournaments: Vec<TournamentSeed>,
    #[serde(default)]
    pub certificates: Vec<CertificateSeed>,
    #[serde(default)]
    pub pools: Vec<PoolSeed>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentReport {
    pub id: TournamentId,
    pub current_round: u32,
    pub has_ended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateReport {
    pub id: CertificateId,
    pub score: u64,
    pub update_count: u32,
    pub scored_rounds: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReport {
    pub id: PoolId,
    pub total_funds: u128,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub digest: String,
    pub top: Vec<CertificateId>,
    pub payouts: Vec<Payout>,
}

/// Final state after a replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub steps_run: usize,
    pub tournaments: Vec<TournamentReport>,
    pub certificates: Vec<CertificateReport>,
    pub pools: Vec<PoolReport>,
}

impl Scenario {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl DistributionSeed {
    fn build(&self) -> AppResult<RewardDistribution> {
        let mut distribution = match self.preset {
            Some(DistributionPreset::Top1) => RewardDistribution::top1(self.id),
            Some(DistributionPreset::Top5) => RewardDistribution::top5(self.id),
            Some(DistributionPreset::Top10) => RewardDistribution::top10(self.id),
            Some(DistributionPreset::Top100) => RewardDistribution::top100(self.id),
            None => {
                let name = self
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Distribution {}", self.id));
                return RewardDistribution::new(
                    self.id,
                    name,
                    self.ranges.clone(),
                    self.percentages_bps.clone(),
                    self.is_all_or_nothing,
                );
            }
        };

        if let Some(name) = &self.name {
            distribution.name = name.clone();
        }
        distribution.is_all_or_nothing = self.is_all_or_nothing;
        Ok(distribution)
    }
}

/// Engine seeded from a scenario, driven by a manual clock
pub struct ScenarioRunner {
    state: AppState,
    clock: Arc<ManualClock>,
    treasury: Arc<InMemoryTreasury>,
    steps: Vec<Step>,
}

impl ScenarioRunner {
    /// Build the engine and seed every record of the scenario
    pub async fn new(scenario: Scenario, config: EngineConfig) -> AppResult<Self> {
        let clock = Arc::new(ManualClock::new(scenario.start_time));
        let treasury = Arc::new(InMemoryTreasury::new());
        let state = AppState::new(config, clock.clone(), treasury.clone());

        for seed in &scenario.distributions {
            state.distribution_repo.create(seed.build()?).await?;
        }
        for seed in &scenario.tournaments {
            let tournament = Tournament::new(
                seed.id,
                seed.name.clone(),
                seed.round_match_count.clone(),
                seed.max_points,
            )?;
            state.tournament_repo.create(tournament).await?;
        }
        for seed in &scenario.certificates {
            state.tournament_repo.get(seed.tournament_id).await?;
            let predictions = Bracket::new(seed.teams_ids.clone(), seed.finals_score_sum);
            state
                .certificate_repo
                .create(Certificate::new(seed.id, seed.tournament_id, predictions))
                .await?;
        }
        for seed in &scenario.pools {
            state.tournament_repo.get(seed.tournament_id).await?;
            state.distribution_repo.get(seed.reward_distribution_id).await?;
            let pool = Pool::new(
                seed.id,
                seed.tournament_id,
                seed.reward_distribution_id,
                seed.royalty_bps,
            )?;
            state.pool_repo.create(pool).await?;
            state.pool_repo.add_funds(seed.id, seed.total_funds).await?;
            for &certificate_id in &seed.entrants {
                state.leaderboards.enter_pool(seed.id, certificate_id).await?;
            }
        }

        info!(
            "Scenario seeded: {} tournaments, {} certificates, {} pools, {} steps",
            scenario.tournaments.len(),
            scenario.certificates.len(),
            scenario.pools.len(),
            scenario.steps.len()
        );

        Ok(Self {
            state,
            clock,
            treasury,
            steps: scenario.steps,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(&self) -> AppResult<usize> {
        for (index, step) in self.steps.iter().enumerate() {
            if let Err(source) = self.run_step(step).await {
                error!("Scenario step {} failed: {}", index, source);
                return Err(AppError::ScenarioStep {
                    step: index,
                    source: Box::new(source),
                });
            }
        }
        Ok(self.steps.len())
    }

    async fn run_step(&self, step: &Step) -> AppResult<()> {
        let state = &self.state;
        match step {
            Step::SetClock { now } => self.clock.set(*now),
            Step::SetRoundBounds {
                tournament_id,
                round,
                start,
                end,
            } => {
                state
                    .rounds
                    .set_round_bounds(*tournament_id, *round, *start, *end)
                    .await?;
            }
            Step::RevealTruth {
                tournament_id,
                teams_ids,
            } => {
                state
                    .oracle
                    .reveal_truth(*tournament_id, teams_ids.clone())
                    .await?;
            }
            Step::SetFinalsScoreSum {
                tournament_id,
                finals_score_sum,
            } => {
                state
                    .oracle
                    .set_finals_score_sum(*tournament_id, *finals_score_sum)
                    .await?;
            }
            Step::ScoreRound {
                tournament_id,
                certificate_ids,
            } => {
                let ids = match certificate_ids {
                    Some(ids) => ids.clone(),
                    None => state.certificate_repo.find_by_tournament(*tournament_id).await,
                };
                for batch in ids.chunks(state.config.max_batch_size) {
                    state.scoring.score_certificates(*tournament_id, batch).await?;
                }
            }
            Step::AdvanceRound { tournament_id } => {
                state.rounds.advance_round(*tournament_id).await?;
            }
            Step::RevertRound { tournament_id } => {
                state.rounds.revert_round_in_emergency(*tournament_id).await?;
            }
            Step::UpdatePredictions {
                certificate_id,
                teams_ids,
                finals_score_sum,
            } => {
                let predictions = Bracket::new(teams_ids.clone(), *finals_score_sum);
                state
                    .scoring
                    .update_predictions(*certificate_id, predictions)
                    .await?;
            }
            Step::FinalizeScores {
                pool_id,
                actual_finals_score_sum,
                certificate_ids,
            } => {
                let ids: Vec<CertificateId> = match certificate_ids {
                    Some(ids) => ids.clone(),
                    None => state.pool_repo.snapshot(*pool_id).await?.entrants.into_iter().collect(),
                };
                if ids.is_empty() {
                    state
                        .leaderboards
                        .finalize_scores(*pool_id, *actual_finals_score_sum, &[])
                        .await?;
                }
                for batch in ids.chunks(state.config.max_batch_size) {
                    state
                        .leaderboards
                        .finalize_scores(*pool_id, *actual_finals_score_sum, batch)
                        .await?;
                }
            }
            Step::Claim {
                pool_id,
                certificate_id,
            } => {
                state.rewards.claim(*pool_id, *certificate_id).await?;
            }
        }
        Ok(())
    }

    /// Snapshot of every record touched by the scenario
    pub async fn report(&self, steps_run: usize) -> AppResult<ScenarioReport> {
        let state = &self.state;
        let now = self.clock.now();
        let payouts = self.treasury.payouts()?;

        let mut tournaments = Vec::new();
        for id in state.tournament_repo.list_ids().await {
            let tournament = state.tournament_repo.snapshot(id).await?;
            tournaments.push(TournamentReport {
                id,
                current_round: tournament.current_round,
                has_ended: tournament.has_ended(now),
            });
        }

        let mut certificates = Vec::new();
        for id in state.certificate_repo.list_ids().await {
            let certificate = state.certificate_repo.snapshot(id).await?;
            certificates.push(CertificateReport {
                id,
                score: certificate.score,
                update_count: certificate.update_count,
                scored_rounds: certificate.scored_rounds.into_iter().collect(),
            });
        }

        let mut pools = Vec::new();
        for id in state.pool_repo.list_ids().await {
            let pool = state.pool_repo.snapshot(id).await?;
            pools.push(PoolReport {
                id,
                total_funds: pool.total_funds,
                leaderboard: pool.leaderboard.entries().copied().collect(),
                digest: pool.leaderboard.digest(),
                top: state.leaderboards.get_top(id).await?,
                payouts: payouts
                    .iter()
                    .filter(|payout| payout.pool_id == id)
                    .copied()
                    .collect(),
            });
        }

        Ok(ScenarioReport {
            steps_run,
            tournaments,
            certificates,
            pools,
        })
    }
}

/// Seed, run and report a scenario in one go
pub async fn replay(scenario: Scenario, config: EngineConfig) -> AppResult<ScenarioReport> {
    let runner = ScenarioRunner::new(scenario, config).await?;
    let steps_run = runner.run().await?;
    runner.report(steps_run).await
}
