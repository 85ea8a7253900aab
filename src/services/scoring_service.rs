use crate::bracket::{self, BracketPoints};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Bracket, Certificate, CertificateId, TeamId, Tournament, TournamentId};
use crate::notifier::{EngineEvent, EventNotifier};
use crate::repositories::{CertificateRepository, TournamentRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of scoring one certificate for the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub certificate_id: CertificateId,
    pub round: u32,
    pub round_score: u64,
    pub total_score: u64,
    /// False when the round had already been applied to this certificate
    pub applied: bool,
}

/// Service for scoring certificates and editing their predictions
pub struct ScoringService {
    tournament_repo: Arc<TournamentRepository>,
    certificate_repo: Arc<CertificateRepository>,
    clock: Arc<dyn Clock>,
    notifier: EventNotifier,
    config: EngineConfig,
}

impl ScoringService {
    pub fn new(
        tournament_repo: Arc<TournamentRepository>,
        certificate_repo: Arc<CertificateRepository>,
        clock: Arc<dyn Clock>,
        notifier: EventNotifier,
        config: EngineConfig,
    ) -> Self {
        Self {
            tournament_repo,
            certificate_repo,
            clock,
            notifier,
            config,
        }
    }

    fn check_scorable(tournament: &Tournament, certificate: &Certificate) -> AppResult<()> {
        if certificate.tournament_id != tournament.id {
            return Err(AppError::Validation(format!(
                "Certificate {} belongs to tournament {}, not {}",
                certificate.id, certificate.tournament_id, tournament.id
            )));
        }
        tournament.check_length(certificate.predictions.teams_ids.len())
    }

    /// Add the current round's points to a certificate unless that round is already applied
    fn apply_current_round(
        tournament: &mut Tournament,
        certificate: &mut Certificate,
    ) -> AppResult<ScoreOutcome> {
        let round = tournament.current_round;

        if certificate.is_scored_in_round(round) {
            debug!(
                "Certificate {} already scored in round {}",
                certificate.id, round
            );
            return Ok(ScoreOutcome {
                certificate_id: certificate.id,
                round,
                round_score: 0,
                total_score: certificate.score,
                applied: false,
            });
        }

        let round_score =
            bracket::round_points(tournament, &certificate.predictions.teams_ids, round)?;
        certificate.score += round_score;
        certificate.scored_rounds.insert(round);
        tournament.scored_rounds.insert(round);

        Ok(ScoreOutcome {
            certificate_id: certificate.id,
            round,
            round_score,
            total_score: certificate.score,
            applied: true,
        })
    }

    fn require_round_revealed(tournament: &Tournament) -> AppResult<()> {
        let round = tournament.current_round;
        if !tournament.is_round_revealed(round) {
            warn!(
                "Tournament {} round {} is not fully revealed, refusing to score",
                tournament.id, round
            );
            return Err(AppError::TruthNotRevealed {
                tournament_id: tournament.id,
                round,
            });
        }
        Ok(())
    }

    fn publish_scored(&self, outcome: &ScoreOutcome) {
        if !outcome.applied {
            return;
        }
        info!(
            "Certificate {} scored {} in round {} (total {})",
            outcome.certificate_id, outcome.round_score, outcome.round, outcome.total_score
        );
        self.notifier.publish(EngineEvent::CertificateScored {
            certificate_id: outcome.certificate_id,
            round: outcome.round,
            round_score: outcome.round_score,
            total_score: outcome.total_score,
        });
    }

    /// Score one certificate for the tournament's current round
    pub async fn score_certificate(
        &self,
        tournament_id: TournamentId,
        certificate_id: CertificateId,
    ) -> AppResult<ScoreOutcome> {
        let tournament_handle = self.tournament_repo.get(tournament_id).await?;
        let certificate_handle = self.certificate_repo.get(certificate_id).await?;

        let mut tournament = tournament_handle.lock().await;
        let mut certificate = certificate_handle.lock().await;

        Self::check_scorable(&tournament, &certificate)?;
        if !certificate.is_scored_in_round(tournament.current_round) {
            Self::require_round_revealed(&tournament)?;
        }

        let outcome = Self::apply_current_round(&mut tournament, &mut certificate)?;
        self.publish_scored(&outcome);
        Ok(outcome)
    }

    /// Score a batch of certificates for the current round
    ///
    /// The whole batch is validated before anything is scored. Ids may repeat and come
    /// in any order; repeats are no-ops.
    pub async fn score_certificates(
        &self,
        tournament_id: TournamentId,
        certificate_ids: &[CertificateId],
    ) -> AppResult<Vec<ScoreOutcome>> {
        if certificate_ids.len() > self.config.max_batch_size {
            warn!(
                "Rejected scoring batch of {} certificates for tournament {}",
                certificate_ids.len(),
                tournament_id
            );
            return Err(AppError::BatchTooLarge {
                size: certificate_ids.len(),
                limit: self.config.max_batch_size,
            });
        }

        let tournament_handle = self.tournament_repo.get(tournament_id).await?;
        let mut handles = Vec::with_capacity(certificate_ids.len());
        for &id in certificate_ids {
            handles.push(self.certificate_repo.get(id).await?);
        }

        let mut tournament = tournament_handle.lock().await;
        Self::require_round_revealed(&tournament)?;
        for handle in &handles {
            let certificate = handle.lock().await;
            Self::check_scorable(&tournament, &certificate)?;
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in &handles {
            let mut certificate = handle.lock().await;
            let outcome = Self::apply_current_round(&mut tournament, &mut certificate)?;
            self.publish_scored(&outcome);
            outcomes.push(outcome);
        }

        let applied = outcomes.iter().filter(|outcome| outcome.applied).count();
        info!(
            "Tournament {} round {}: scored {} of {} certificates",
            tournament_id,
            tournament.current_round,
            applied,
            outcomes.len()
        );

        Ok(outcomes)
    }

    pub async fn is_scored_in_round(
        &self,
        certificate_id: CertificateId,
        round: u32,
    ) -> AppResult<bool> {
        let handle = self.certificate_repo.get(certificate_id).await?;
        let scored = handle.lock().await.is_scored_in_round(round);
        Ok(scored)
    }

    /// Fresh points of `predictions` through the current round, nothing is stored
    pub async fn calc_bracket_points(
        &self,
        tournament_id: TournamentId,
        predictions: &[TeamId],
    ) -> AppResult<BracketPoints> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let tournament = handle.lock().await;
        Ok(bracket::calc_bracket_points(&tournament, predictions)?)
    }

    pub async fn calc_points_will_be_lost(
        &self,
        tournament_id: TournamentId,
        predictions: &[TeamId],
    ) -> AppResult<u64> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let tournament = handle.lock().await;
        Ok(bracket::calc_points_will_be_lost(&tournament, predictions)?)
    }

    pub async fn get_bracket_potential(
        &self,
        tournament_id: TournamentId,
        predictions: &[TeamId],
    ) -> AppResult<u64> {
        let handle = self.tournament_repo.get(tournament_id).await?;
        let tournament = handle.lock().await;
        Ok(bracket::bracket_potential(&tournament, predictions)?)
    }

    /// Replace a certificate's predictions before the current round starts
    ///
    /// Picks of earlier rounds are locked. Returns the new update count.
    pub async fn update_predictions(
        &self,
        certificate_id: CertificateId,
        predictions: Bracket,
    ) -> AppResult<u32> {
        let certificate_handle = self.certificate_repo.get(certificate_id).await?;
        let tournament_id = certificate_handle.lock().await.tournament_id;
        let tournament_handle = self.tournament_repo.get(tournament_id).await?;

        let tournament = tournament_handle.lock().await;
        let mut certificate = certificate_handle.lock().await;

        if !tournament.is_editable(self.clock.now()) {
            warn!(
                "Certificate {} cannot be edited, round {} already started",
                certificate_id, tournament.current_round
            );
            return Err(AppError::RoundInProgress {
                tournament_id,
                round: tournament.current_round,
            });
        }
        tournament.check_length(predictions.teams_ids.len())?;

        let locked = tournament.current_round_index();
        if certificate.predictions.teams_ids.get(..locked) != Some(&predictions.teams_ids[..locked])
        {
            warn!(
                "Certificate {} tried to change picks of decided rounds",
                certificate_id
            );
            return Err(AppError::LockedSlotsChanged(certificate_id));
        }

        certificate.predictions = predictions;
        certificate.update_count += 1;
        let update_count = certificate.update_count;

        info!(
            "Certificate {} predictions updated from slot {} (update #{})",
            certificate_id, locked, update_count
        );
        self.notifier.publish(EngineEvent::PredictionsUpdated {
            certificate_id,
            start_index: locked,
            update_count,
        });

        Ok(update_count)
    }
}
