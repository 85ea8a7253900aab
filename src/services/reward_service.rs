use super::treasury::Treasury;
use crate::bracket::{quote_reward, RewardQuote};
use crate::error::{AppError, AppResult};
use crate::models::{CertificateId, PoolId};
use crate::notifier::{EngineEvent, EventNotifier};
use crate::repositories::{DistributionRepository, PoolRepository};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Service turning leaderboard ranks into payouts
pub struct RewardService {
    pool_repo: Arc<PoolRepository>,
    distribution_repo: Arc<DistributionRepository>,
    treasury: Arc<dyn Treasury>,
    notifier: EventNotifier,
}

impl RewardService {
    pub fn new(
        pool_repo: Arc<PoolRepository>,
        distribution_repo: Arc<DistributionRepository>,
        treasury: Arc<dyn Treasury>,
        notifier: EventNotifier,
    ) -> Self {
        Self {
            pool_repo,
            distribution_repo,
            treasury,
            notifier,
        }
    }

    /// Reward owed to a 1-indexed rank of the pool
    pub async fn calc_reward(&self, pool_id: PoolId, rank: usize) -> AppResult<RewardQuote> {
        let handle = self.pool_repo.get(pool_id).await?;
        let pool = handle.lock().await;
        let distribution = self.distribution_repo.get(pool.reward_distribution_id).await?;

        Ok(quote_reward(
            pool.total_funds,
            pool.royalty_bps,
            &distribution,
            rank,
        )?)
    }

    /// Pay a winner its reward, once
    ///
    /// The certificate is only marked as claimed when the treasury accepted the payout.
    pub async fn claim(&self, pool_id: PoolId, certificate_id: CertificateId) -> AppResult<u128> {
        let handle = self.pool_repo.get(pool_id).await?;
        let mut pool = handle.lock().await;
        let distribution = self.distribution_repo.get(pool.reward_distribution_id).await?;

        let rank = pool
            .leaderboard
            .top(distribution.max_winners())
            .iter()
            .position(|&id| id == certificate_id)
            .map(|idx| idx + 1)
            .ok_or_else(|| {
                warn!("Certificate {} is not a winner of pool {}", certificate_id, pool_id);
                AppError::NotInWinners {
                    pool_id,
                    certificate_id,
                }
            })?;

        if pool.has_claimed(certificate_id) {
            debug!(
                "Certificate {} already claimed from pool {}",
                certificate_id, pool_id
            );
            return Err(AppError::AlreadyClaimed {
                pool_id,
                certificate_id,
            });
        }

        let quote = quote_reward(pool.total_funds, pool.royalty_bps, &distribution, rank)?;
        self.treasury.pay(pool_id, certificate_id, quote.reward)?;
        pool.claimed.insert(certificate_id);

        info!(
            "Certificate {} claimed {} from pool {} (rank {}, tier {})",
            certificate_id, quote.reward, pool_id, rank, quote.tier
        );
        self.notifier.publish(EngineEvent::RewardClaimed {
            pool_id,
            certificate_id,
            amount: quote.reward,
        });

        Ok(quote.reward)
    }
}
