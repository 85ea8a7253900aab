use super::{CertificateId, DistributionId, PoolId, TournamentId};
use crate::bracket::payout::BPS_DENOMINATOR;
use crate::bracket::Leaderboard;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Prize pool over one tournament
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub tournament_id: TournamentId,
    pub reward_distribution_id: DistributionId,
    pub royalty_bps: u16,
    /// Currency units collected by the treasury
    pub total_funds: u128,
    pub entrants: BTreeSet<CertificateId>,
    pub leaderboard: Leaderboard,
    /// Finals score the leaderboard was ranked against, pinned by the first finalized batch
    pub finalized_with: Option<Option<u32>>,
    pub claimed: BTreeSet<CertificateId>,
}

impl Pool {
    /// Create a new, empty Pool
    pub fn new(
        id: PoolId,
        tournament_id: TournamentId,
        reward_distribution_id: DistributionId,
        royalty_bps: u16,
    ) -> AppResult<Self> {
        if u128::from(royalty_bps) > BPS_DENOMINATOR {
            return Err(AppError::InvariantViolation(format!(
                "Royalty of {} bps exceeds 100%",
                royalty_bps
            )));
        }

        Ok(Self {
            id,
            tournament_id,
            reward_distribution_id,
            royalty_bps,
            total_funds: 0,
            entrants: BTreeSet::new(),
            leaderboard: Leaderboard::default(),
            finalized_with: None,
            claimed: BTreeSet::new(),
        })
    }

    pub fn is_entrant(&self, certificate_id: CertificateId) -> bool {
        self.entrants.contains(&certificate_id)
    }

    pub fn has_claimed(&self, certificate_id: CertificateId) -> bool {
        self.claimed.contains(&certificate_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_royalty_capped_at_full_amount() {
        assert!(Pool::new(1, 1, 1, 10_000).is_ok());
        assert!(matches!(
            Pool::new(1, 1, 1, 10_001),
            Err(AppError::InvariantViolation(_))
        ));
    }
}
