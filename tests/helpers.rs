#![allow(dead_code)]

use bracket_pool::clock::ManualClock;
use bracket_pool::models::*;
use bracket_pool::services::{InMemoryTreasury, Treasury};
use bracket_pool::{AppState, EngineConfig};
use std::sync::Arc;

/// Clock value every test engine starts at
pub const T0: i64 = 1_000;

pub const MARCH_MADNESS: [u32; 6] = [32, 16, 8, 4, 2, 1];
pub const MARCH_MADNESS_MAX_POINTS: u64 = 192;

/// Round `r` runs from `round_start(r)` to `round_end(r)`
pub fn round_start(round: u32) -> i64 {
    T0 + 1_000 * i64::from(round)
}

pub fn round_end(round: u32) -> i64 {
    round_start(round) + 500
}

/// Bracket naming team `i + 1` as the winner of slot `i`
pub fn sequential_bracket() -> Vec<TeamId> {
    (1..=63).collect()
}

/// Exclusive end slot of a March Madness round
pub fn round_end_slot(round: u32) -> usize {
    MARCH_MADNESS[..round as usize]
        .iter()
        .map(|&count| count as usize)
        .sum()
}

/// `truth` with every slot after `round` hidden
pub fn revealed_through(truth: &[TeamId], round: u32) -> Vec<TeamId> {
    let end = round_end_slot(round);
    truth
        .iter()
        .enumerate()
        .map(|(slot, &team)| if slot < end { team } else { UNREVEALED })
        .collect()
}

/// Engine wired to a manual clock and an in-memory treasury
pub struct TestEngine {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub treasury: Arc<InMemoryTreasury>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let treasury = Arc::new(InMemoryTreasury::new());
        let state = AppState::new(config, clock.clone(), treasury.clone());
        Self {
            state,
            clock,
            treasury,
        }
    }

    /// Engine paying through `payer`; the in-memory ledger stays empty
    pub fn with_treasury(payer: Arc<dyn Treasury>) -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let state = AppState::new(EngineConfig::default(), clock.clone(), payer);
        Self {
            state,
            clock,
            treasury: Arc::new(InMemoryTreasury::new()),
        }
    }

    /// 64-team single-elimination tournament
    pub async fn create_march_madness(&self, id: TournamentId) {
        let tournament = Tournament::new(
            id,
            "March Madness",
            MARCH_MADNESS.to_vec(),
            MARCH_MADNESS_MAX_POINTS,
        )
        .expect("valid layout");
        self.state
            .tournament_repo
            .create(tournament)
            .await
            .expect("Failed to create tournament");
    }

    pub async fn create_certificate(
        &self,
        id: CertificateId,
        tournament_id: TournamentId,
        teams_ids: Vec<TeamId>,
        finals_score_sum: u32,
    ) {
        let certificate =
            Certificate::new(id, tournament_id, Bracket::new(teams_ids, finals_score_sum));
        self.state
            .certificate_repo
            .create(certificate)
            .await
            .expect("Failed to create certificate");
    }

    /// Pool funded with `funds`, every listed certificate entered
    pub async fn create_pool(
        &self,
        pool_id: PoolId,
        tournament_id: TournamentId,
        distribution: RewardDistribution,
        royalty_bps: u16,
        funds: u128,
        entrants: &[CertificateId],
    ) {
        let distribution_id = distribution.id;
        if self.state.distribution_repo.get(distribution_id).await.is_err() {
            self.state
                .distribution_repo
                .create(distribution)
                .await
                .expect("Failed to create distribution");
        }

        let pool = Pool::new(pool_id, tournament_id, distribution_id, royalty_bps)
            .expect("valid pool");
        self.state
            .pool_repo
            .create(pool)
            .await
            .expect("Failed to create pool");
        self.state
            .pool_repo
            .add_funds(pool_id, funds)
            .await
            .expect("Failed to fund pool");
        for &certificate_id in entrants {
            self.state
                .leaderboards
                .enter_pool(pool_id, certificate_id)
                .await
                .expect("Failed to enter pool");
        }
    }

    /// Schedule every round, back to back, in the future
    pub async fn schedule_rounds(&self, tournament_id: TournamentId) {
        for round in 1..=MARCH_MADNESS.len() as u32 {
            self.state
                .rounds
                .set_round_bounds(tournament_id, round, round_start(round), round_end(round))
                .await
                .expect("Failed to schedule round");
        }
    }

    /// Reveal, score and advance through every round, then move the clock past the end
    pub async fn play_out(&self, tournament_id: TournamentId, truth: &[TeamId]) {
        let ids = self
            .state
            .certificate_repo
            .find_by_tournament(tournament_id)
            .await;
        let rounds = MARCH_MADNESS.len() as u32;

        for round in 1..=rounds {
            self.state
                .oracle
                .reveal_truth(tournament_id, revealed_through(truth, round))
                .await
                .expect("Failed to reveal truth");
            for batch in ids.chunks(self.state.config.max_batch_size) {
                self.state
                    .scoring
                    .score_certificates(tournament_id, batch)
                    .await
                    .expect("Failed to score round");
            }
            if round < rounds {
                self.state
                    .rounds
                    .advance_round(tournament_id)
                    .await
                    .expect("Failed to advance round");
            }
        }

        self.clock.set(round_end(rounds) + 1);
    }
}
