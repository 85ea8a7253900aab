use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::models::{RoundBounds, TournamentId};
use crate::notifier::{EngineEvent, EventNotifier};
use crate::repositories::TournamentRepository;
use std::sync::Arc;
use tracing::{info, warn};

/// Round state machine of every tournament
pub struct RoundService {
    tournament_repo: Arc<TournamentRepository>,
    clock: Arc<dyn Clock>,
    notifier: EventNotifier,
}

impl RoundService {
    pub fn new(
        tournament_repo: Arc<TournamentRepository>,
        clock: Arc<dyn Clock>,
        notifier: EventNotifier,
    ) -> Self {
        Self {
            tournament_repo,
            clock,
            notifier,
        }
    }

    /// Schedule a round
    ///
    /// `start` must lie in the future, after `end` of the previous round, and the round
    /// must finish before the next round (if already scheduled) starts.
    pub async fn set_round_bounds(
        &self,
        tournament_id: TournamentId,
        round: u32,
        start: i64,
        end: i64,
    ) -> AppResult<RoundBounds> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let mut tournament = handle.lock().await;

        if !tournament.is_valid_round(round) {
            warn!("Rejected bounds for unknown round {} of tournament {}", round, tournament_id);
            return Err(AppError::InvalidBounds(format!(
                "Round {} does not exist in tournament {}",
                round, tournament_id
            )));
        }
        if end <= start {
            warn!("Rejected bounds for tournament {}: end {} <= start {}", tournament_id, end, start);
            return Err(AppError::InvalidBounds(format!(
                "End {} must be after start {}",
                end, start
            )));
        }

        let now = self.clock.now();
        if start <= now {
            warn!("Rejected bounds for tournament {}: start {} is not in the future", tournament_id, start);
            return Err(AppError::InvalidBounds(format!(
                "Start {} is not after the current time {}",
                start, now
            )));
        }
        if let Some(previous) = tournament.bounds(round - 1) {
            if start < previous.end {
                warn!("Rejected bounds for tournament {}: overlaps round {}", tournament_id, round - 1);
                return Err(AppError::InvalidBounds(format!(
                    "Start {} precedes the end {} of round {}",
                    start,
                    previous.end,
                    round - 1
                )));
            }
        }
        if let Some(next) = tournament.bounds(round + 1) {
            if end > next.start {
                warn!("Rejected bounds for tournament {}: overlaps round {}", tournament_id, round + 1);
                return Err(AppError::InvalidBounds(format!(
                    "End {} is after the start {} of round {}",
                    end,
                    next.start,
                    round + 1
                )));
            }
        }

        let bounds = RoundBounds { start, end };
        tournament.round_bounds[(round - 1) as usize] = Some(bounds);

        info!(
            "Tournament {} round {} scheduled: {} -> {}",
            tournament_id, round, start, end
        );
        self.notifier.publish(EngineEvent::RoundBoundsSet {
            tournament_id,
            round,
            start,
            end,
        });

        Ok(bounds)
    }

    /// Move to the next round, returns the new current round
    pub async fn advance_round(&self, tournament_id: TournamentId) -> AppResult<u32> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let mut tournament = handle.lock().await;

        if tournament.is_last_round() {
            warn!("Tournament {} cannot advance past its last round", tournament_id);
            return Err(AppError::AlreadyAtLastRound(tournament_id));
        }

        tournament.current_round += 1;
        let round = tournament.current_round;

        info!(
            "Tournament {} advanced to round {} (slot offset {})",
            tournament_id,
            round,
            tournament.current_round_index()
        );
        self.notifier.publish(EngineEvent::RoundAdvanced {
            tournament_id,
            round,
        });

        Ok(round)
    }

    /// Step back one round; pausing the system beforehand is the caller's concern
    ///
    /// Scores accrued in the abandoned round are kept.
    pub async fn revert_round_in_emergency(&self, tournament_id: TournamentId) -> AppResult<u32> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let mut tournament = handle.lock().await;

        if tournament.current_round == 1 {
            warn!("Tournament {} cannot revert below its first round", tournament_id);
            return Err(AppError::StillAtFirstRound(tournament_id));
        }

        tournament.current_round -= 1;
        let round = tournament.current_round;

        warn!("Tournament {} reverted to round {}", tournament_id, round);
        self.notifier.publish(EngineEvent::RoundReverted {
            tournament_id,
            round,
        });

        Ok(round)
    }

    /// True once the clock passed the end of the final round
    pub async fn has_ended(&self, tournament_id: TournamentId) -> AppResult<bool> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let tournament = handle.lock().await;
        Ok(tournament.has_ended(self.clock.now()))
    }

    pub async fn current_round(&self, tournament_id: TournamentId) -> AppResult<u32> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let round = handle.lock().await.current_round;
        Ok(round)
    }
}
