use crate::error::{AppError, AppResult};
use crate::models::{TeamId, TournamentId, UNREVEALED};
use crate::notifier::{EngineEvent, EventNotifier};
use crate::repositories::TournamentRepository;
use std::sync::Arc;
use tracing::{info, warn};

/// Writes the oracle's results into the truth store
pub struct OracleService {
    tournament_repo: Arc<TournamentRepository>,
    notifier: EventNotifier,
}

impl OracleService {
    pub fn new(tournament_repo: Arc<TournamentRepository>, notifier: EventNotifier) -> Self {
        Self {
            tournament_repo,
            notifier,
        }
    }

    /// Replace the whole truth array
    ///
    /// Slots of a round that was already scored are frozen: a reveal changing any of them
    /// is rejected. Returns the number of revealed slots.
    pub async fn reveal_truth(
        &self,
        tournament_id: TournamentId,
        teams_ids: Vec<TeamId>,
    ) -> AppResult<usize> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let mut tournament = handle.lock().await;

        tournament.check_length(teams_ids.len())?;

        for &round in &tournament.scored_rounds {
            let range = tournament.round_range(round);
            if tournament.truth.teams_ids[range.clone()] != teams_ids[range] {
                warn!(
                    "Rejected reveal for tournament {}: round {} is already scored",
                    tournament_id, round
                );
                return Err(AppError::InvariantViolation(format!(
                    "Round {} of tournament {} is already scored, its results cannot change",
                    round, tournament_id
                )));
            }
        }

        let revealed_slots = teams_ids.iter().filter(|&&team| team != UNREVEALED).count();
        tournament.truth.teams_ids = teams_ids;

        info!(
            "Tournament {} truth revealed: {}/{} slots",
            tournament_id, revealed_slots, tournament.bracket_length
        );
        self.notifier.publish(EngineEvent::TruthRevealed {
            tournament_id,
            revealed_slots,
        });

        Ok(revealed_slots)
    }

    /// Record the actual combined score of the final
    pub async fn set_finals_score_sum(
        &self,
        tournament_id: TournamentId,
        finals_score_sum: u32,
    ) -> AppResult<()> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let mut tournament = handle.lock().await;

        tournament.truth.finals_score_sum = Some(finals_score_sum);

        info!(
            "Tournament {} finals score sum set to {}",
            tournament_id, finals_score_sum
        );
        self.notifier.publish(EngineEvent::FinalsScoreSet {
            tournament_id,
            finals_score_sum,
        });

        Ok(())
    }
}
