use crate::error::{AppError, AppResult};
use crate::models::{CertificateId, PoolId};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::info;

/// Executes payouts computed by the reward engine
pub trait Treasury: Send + Sync {
    /// Transfer `amount` to the holder of `certificate_id`
    fn pay(&self, pool_id: PoolId, certificate_id: CertificateId, amount: u128) -> AppResult<()>;
}

/// One executed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub pool_id: PoolId,
    pub certificate_id: CertificateId,
    pub amount: u128,
}

/// Ledger keeping payouts in memory
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    payouts: Mutex<Vec<Payout>>,
}

impl InMemoryTreasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payouts in execution order
    pub fn payouts(&self) -> AppResult<Vec<Payout>> {
        let payouts = self
            .payouts
            .lock()
            .map_err(|_| AppError::Treasury("Treasury ledger is poisoned".to_string()))?;
        Ok(payouts.clone())
    }

    pub fn total_paid(&self, pool_id: PoolId) -> AppResult<u128> {
        Ok(self
            .payouts()?
            .iter()
            .filter(|payout| payout.pool_id == pool_id)
            .map(|payout| payout.amount)
            .sum())
    }
}

impl Treasury for InMemoryTreasury {
    fn pay(&self, pool_id: PoolId, certificate_id: CertificateId, amount: u128) -> AppResult<()> {
        let mut payouts = self
            .payouts
            .lock()
            .map_err(|_| AppError::Treasury("Treasury ledger is poisoned".to_string()))?;

        payouts.push(Payout {
            pool_id,
            certificate_id,
            amount,
        });
        info!(
            "Treasury paid {} to certificate {} from pool {}",
            amount, certificate_id, pool_id
        );
        Ok(())
    }
}
