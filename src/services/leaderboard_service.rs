use crate::bracket::LeaderboardEntry;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CertificateId, PoolId};
use crate::notifier::{EngineEvent, EventNotifier};
use crate::repositories::{
    CertificateRepository, DistributionRepository, PoolRepository, TournamentRepository,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one finalization batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeOutcome {
    pub pool_id: PoolId,
    /// Actual finals score the pool is ranked against
    pub finals_score_sum: Option<u32>,
    /// Entries added by this batch
    pub inserted: usize,
    /// Leaderboard size after the batch
    pub entries: usize,
    pub digest: String,
}

/// Service building and querying pool leaderboards
pub struct LeaderboardService {
    pool_repo: Arc<PoolRepository>,
    tournament_repo: Arc<TournamentRepository>,
    certificate_repo: Arc<CertificateRepository>,
    distribution_repo: Arc<DistributionRepository>,
    clock: Arc<dyn Clock>,
    notifier: EventNotifier,
    config: EngineConfig,
}

impl LeaderboardService {
    pub fn new(
        pool_repo: Arc<PoolRepository>,
        tournament_repo: Arc<TournamentRepository>,
        certificate_repo: Arc<CertificateRepository>,
        distribution_repo: Arc<DistributionRepository>,
        clock: Arc<dyn Clock>,
        notifier: EventNotifier,
        config: EngineConfig,
    ) -> Self {
        Self {
            pool_repo,
            tournament_repo,
            certificate_repo,
            distribution_repo,
            clock,
            notifier,
            config,
        }
    }

    /// Enter a certificate into a pool, returns false if it already entered
    pub async fn enter_pool(&self, pool_id: PoolId, certificate_id: CertificateId) -> AppResult<bool> {
        let certificate = self.certificate_repo.snapshot(certificate_id).await?;
        let added = self.pool_repo.add_entrant(pool_id, &certificate).await?;
        if added {
            info!("Certificate {} entered pool {}", certificate_id, pool_id);
        }
        Ok(added)
    }

    /// Insert final scores of a batch of entrants into the pool's leaderboard
    ///
    /// `actual_finals_score_sum` falls back to the value stored by the oracle. Ids already
    /// on the leaderboard are skipped, so batches may overlap and arrive in any order.
    /// Once a reward is claimed no new entry may be added.
    pub async fn finalize_scores(
        &self,
        pool_id: PoolId,
        actual_finals_score_sum: Option<u32>,
        certificate_ids: &[CertificateId],
    ) -> AppResult<FinalizeOutcome> {
        if certificate_ids.len() > self.config.max_batch_size {
            warn!(
                "Rejected finalization batch of {} certificates for pool {}",
                certificate_ids.len(),
                pool_id
            );
            return Err(AppError::BatchTooLarge {
                size: certificate_ids.len(),
                limit: self.config.max_batch_size,
            });
        }

        let pool_handle = self.pool_repo.get(pool_id).await?;
        let mut pool = pool_handle.lock().await;
        let tournament_handle = self.tournament_repo.get(pool.tournament_id).await?;
        let tournament = tournament_handle.lock().await;

        if !tournament.has_ended(self.clock.now()) {
            warn!(
                "Pool {} cannot be finalized, tournament {} has not ended",
                pool_id, tournament.id
            );
            return Err(AppError::TournamentNotEnded(tournament.id));
        }

        let finals_score_sum = actual_finals_score_sum.or(tournament.truth.finals_score_sum);
        if let Some(pinned) = pool.finalized_with {
            if pinned != finals_score_sum {
                warn!(
                    "Pool {} was finalized with finals score {:?}, got {:?}",
                    pool_id, pinned, finals_score_sum
                );
                return Err(AppError::FinalsScoreMismatch {
                    pool_id,
                    pinned,
                    given: finals_score_sum,
                });
            }
        }

        if let Some(&outsider) = certificate_ids.iter().find(|&&id| !pool.is_entrant(id)) {
            warn!("Certificate {} is not an entrant of pool {}", outsider, pool_id);
            return Err(AppError::NotAnEntrant {
                pool_id,
                certificate_id: outsider,
            });
        }

        if !pool.claimed.is_empty()
            && certificate_ids.iter().any(|&id| !pool.leaderboard.contains(id))
        {
            warn!(
                "Pool {} already paid {} claims, refusing new leaderboard entries",
                pool_id,
                pool.claimed.len()
            );
            return Err(AppError::LeaderboardLocked(pool_id));
        }

        let mut handles = Vec::with_capacity(certificate_ids.len());
        for &id in certificate_ids {
            handles.push((id, self.certificate_repo.get(id).await?));
        }

        let mut inserted = 0;
        for (id, handle) in handles {
            if pool.leaderboard.contains(id) {
                debug!("Certificate {} already on the leaderboard of pool {}", id, pool_id);
                continue;
            }

            let certificate = handle.lock().await;
            let entry = LeaderboardEntry {
                certificate_id: id,
                score: certificate.score,
                finals_diff: finals_score_sum.map(|sum| certificate.predictions.finals_diff(sum)),
                update_count: certificate.update_count,
            };
            if pool.leaderboard.insert(entry) {
                inserted += 1;
            }
        }

        pool.finalized_with = Some(finals_score_sum);

        let outcome = FinalizeOutcome {
            pool_id,
            finals_score_sum,
            inserted,
            entries: pool.leaderboard.len(),
            digest: pool.leaderboard.digest(),
        };

        info!(
            "Pool {} finalized {} new entries ({} total), digest {}",
            pool_id, outcome.inserted, outcome.entries, outcome.digest
        );
        self.notifier.publish(EngineEvent::ScoresFinalized {
            pool_id,
            inserted: outcome.inserted,
            entries: outcome.entries,
            digest: outcome.digest.clone(),
        });

        Ok(outcome)
    }

    /// Paid positions of the pool, best first
    pub async fn get_top(&self, pool_id: PoolId) -> AppResult<Vec<CertificateId>> {
        let pool = self.pool_repo.snapshot(pool_id).await?;
        let distribution = self.distribution_repo.get(pool.reward_distribution_id).await?;
        Ok(pool.leaderboard.top(distribution.max_winners()))
    }

    /// 1-indexed leaderboard position, `None` if not finalized
    pub async fn rank_of(
        &self,
        pool_id: PoolId,
        certificate_id: CertificateId,
    ) -> AppResult<Option<usize>> {
        let handle = self.pool_repo.get(pool_id).await?;
        let rank = handle.lock().await.leaderboard.rank_of(certificate_id);
        Ok(rank)
    }

    /// Full leaderboard, best first
    pub async fn leaderboard(&self, pool_id: PoolId) -> AppResult<Vec<LeaderboardEntry>> {
        let handle = self.pool_repo.get(pool_id).await?;
        let entries = handle.lock().await.leaderboard.entries().copied().collect();
        Ok(entries)
    }
}
