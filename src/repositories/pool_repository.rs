use super::store::{RecordStore, Shared};
use crate::error::{AppError, AppResult};
use crate::models::{Certificate, Pool, PoolId};

/// Repository for prize pools
pub struct PoolRepository {
    store: RecordStore<Pool>,
}

impl PoolRepository {
    /// Create a new, empty PoolRepository
    pub fn new() -> Self {
        Self {
            store: RecordStore::new("Pool"),
        }
    }

    pub async fn create(&self, pool: Pool) -> AppResult<Shared<Pool>> {
        self.store.insert(pool.id, pool).await
    }

    pub async fn get(&self, id: PoolId) -> AppResult<Shared<Pool>> {
        self.store.get(id).await
    }

    pub async fn snapshot(&self, id: PoolId) -> AppResult<Pool> {
        self.store.snapshot(id).await
    }

    pub async fn list_ids(&self) -> Vec<PoolId> {
        self.store.ids().await
    }

    /// Enter a certificate into a pool
    ///
    /// Returns false when the certificate was already an entrant.
    pub async fn add_entrant(&self, pool_id: PoolId, certificate: &Certificate) -> AppResult<bool> {
        let handle = self.get(pool_id).await?;
        let mut pool = handle.lock().await;

        if pool.tournament_id != certificate.tournament_id {
            return Err(AppError::Validation(format!(
                "Certificate {} belongs to tournament {}, pool {} runs on tournament {}",
                certificate.id, certificate.tournament_id, pool_id, pool.tournament_id
            )));
        }

        Ok(pool.entrants.insert(certificate.id))
    }

    /// Credit funds collected by the treasury, returns the new total
    pub async fn add_funds(&self, pool_id: PoolId, amount: u128) -> AppResult<u128> {
        let handle = self.get(pool_id).await?;
        let mut pool = handle.lock().await;

        pool.total_funds = pool.total_funds.checked_add(amount).ok_or_else(|| {
            AppError::InvariantViolation(format!("Funds of pool {} overflow", pool_id))
        })?;

        Ok(pool.total_funds)
    }
}

impl Default for PoolRepository {
    fn default() -> Self {
        Self::new()
    }
}
