use crate::error::{option_to_result, AppError, AppResult};
use crate::models::{DistributionId, RewardDistribution};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Repository for reward distribution tables, which never change once created
pub struct DistributionRepository {
    distributions: RwLock<HashMap<DistributionId, Arc<RewardDistribution>>>,
}

impl DistributionRepository {
    pub fn new() -> Self {
        Self {
            distributions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, distribution: RewardDistribution) -> AppResult<Arc<RewardDistribution>> {
        let mut distributions = self.distributions.write().await;
        if distributions.contains_key(&distribution.id) {
            return Err(AppError::InvariantViolation(format!(
                "Reward distribution {} already exists",
                distribution.id
            )));
        }

        let distribution = Arc::new(distribution);
        distributions.insert(distribution.id, distribution.clone());
        Ok(distribution)
    }

    pub async fn get(&self, id: DistributionId) -> AppResult<Arc<RewardDistribution>> {
        let found = self.distributions.read().await.get(&id).cloned();
        option_to_result(found, &format!("Reward distribution {} not found", id))
    }
}

impl Default for DistributionRepository {
    fn default() -> Self {
        Self::new()
    }
}
