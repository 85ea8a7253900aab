use super::DistributionId;
use crate::bracket::payout::BPS_DENOMINATOR;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Tiered payout table: rank range bounds and the basis points paid to each tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDistribution {
    pub id: DistributionId,
    pub name: String,
    /// Tier `t` covers ranks `ranges[t]..ranges[t + 1]`
    pub ranges: Vec<u32>,
    /// Share of the distributable funds for each tier, one entry per tier
    pub percentages_bps: Vec<u16>,
    /// Winner takes all, overrides the table
    pub is_all_or_nothing: bool,
}

impl RewardDistribution {
    /// Create a new RewardDistribution, validating the table
    ///
    /// A trailing `0` percentage for the open-ended last bound is accepted and dropped.
    pub fn new(
        id: DistributionId,
        name: impl Into<String>,
        ranges: Vec<u32>,
        mut percentages_bps: Vec<u16>,
        is_all_or_nothing: bool,
    ) -> AppResult<Self> {
        if ranges.len() < 2 {
            return Err(AppError::InvariantViolation(
                "Reward ranges need at least two bounds".to_string(),
            ));
        }
        if ranges[0] != 1 {
            return Err(AppError::InvariantViolation(
                "Reward ranges must start at rank 1".to_string(),
            ));
        }
        if ranges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AppError::InvariantViolation(
                "Reward ranges must be strictly increasing".to_string(),
            ));
        }
        if percentages_bps.len() == ranges.len() && percentages_bps.last() == Some(&0) {
            percentages_bps.pop();
        }
        if percentages_bps.len() != ranges.len() - 1 {
            return Err(AppError::InvariantViolation(format!(
                "Expected {} tier percentages, got {}",
                ranges.len() - 1,
                percentages_bps.len()
            )));
        }
        let total: u128 = percentages_bps.iter().map(|&bps| u128::from(bps)).sum();
        if total != BPS_DENOMINATOR {
            return Err(AppError::InvariantViolation(format!(
                "Tier percentages sum to {} bps, expected {}",
                total, BPS_DENOMINATOR
            )));
        }

        Ok(Self {
            id,
            name: name.into(),
            ranges,
            percentages_bps,
            is_all_or_nothing,
        })
    }

    /// Winner takes all
    pub fn top1(id: DistributionId) -> Self {
        Self {
            id,
            name: "Top 1".to_string(),
            ranges: vec![1, 2],
            percentages_bps: vec![10_000],
            is_all_or_nothing: false,
        }
    }

    pub fn top5(id: DistributionId) -> Self {
        Self {
            id,
            name: "Top 5".to_string(),
            ranges: vec![1, 2, 3, 4, 5, 6],
            percentages_bps: vec![3700, 2500, 1500, 1200, 1100],
            is_all_or_nothing: false,
        }
    }

    pub fn top10(id: DistributionId) -> Self {
        Self {
            id,
            name: "Top 10".to_string(),
            ranges: (1..=11).collect(),
            percentages_bps: vec![2900, 1700, 1200, 1000, 800, 690, 590, 490, 350, 280],
            is_all_or_nothing: false,
        }
    }

    pub fn top100(id: DistributionId) -> Self {
        Self {
            id,
            name: "Top 100".to_string(),
            ranges: vec![
                1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 16, 21, 26, 31, 36, 41, 51, 61, 76, 101,
            ],
            percentages_bps: vec![
                2150, 1300, 740, 640, 540, 440, 320, 190, 160, 130, 600, 450, 275, 225, 190, 170,
                300, 270, 360, 550,
            ],
            is_all_or_nothing: false,
        }
    }

    /// Ranges and percentages actually used for payouts
    pub fn effective_tiers(&self) -> (&[u32], &[u16]) {
        const ALL_OR_NOTHING_RANGES: [u32; 2] = [1, 2];
        const ALL_OR_NOTHING_BPS: [u16; 1] = [10_000];

        if self.is_all_or_nothing {
            (&ALL_OR_NOTHING_RANGES, &ALL_OR_NOTHING_BPS)
        } else {
            (&self.ranges, &self.percentages_bps)
        }
    }

    /// Number of paid positions
    pub fn max_winners(&self) -> usize {
        let (ranges, _) = self.effective_tiers();
        ranges.last().map(|&last| (last - 1) as usize).unwrap_or(0)
    }
}
