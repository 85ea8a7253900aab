use super::{BracketError, BracketResult};
use crate::models::RewardDistribution;
use serde::{Deserialize, Serialize};

/// 100% in basis points
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Breakdown of the reward owed to one rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardQuote {
    pub rank: usize,
    pub royalty: u128,
    pub distributable: u128,
    /// Index of the tier the rank falls in
    pub tier: usize,
    pub winners_in_tier: u128,
    pub tier_total: u128,
    pub reward: u128,
}

fn apply_bps(amount: u128, bps: u128) -> BracketResult<u128> {
    amount
        .checked_mul(bps)
        .map(|scaled| scaled / BPS_DENOMINATOR)
        .ok_or(BracketError::Overflow("basis point scaling"))
}

/// Tier index `t` with `ranges[t] <= rank < ranges[t + 1]`
pub fn tier_for_rank(ranges: &[u32], rank: usize) -> Option<usize> {
    ranges
        .windows(2)
        .position(|bounds| bounds[0] as usize <= rank && rank < bounds[1] as usize)
}

/// Reward for a 1-indexed `rank` in a pool holding `total_funds`
///
/// Integer division leaves remainders in the pool.
pub fn quote_reward(
    total_funds: u128,
    royalty_bps: u16,
    distribution: &RewardDistribution,
    rank: usize,
) -> BracketResult<RewardQuote> {
    let (ranges, percentages_bps) = distribution.effective_tiers();
    let tier = tier_for_rank(ranges, rank).ok_or(BracketError::RankOutOfRange(rank))?;

    let royalty = apply_bps(total_funds, u128::from(royalty_bps))?;
    let distributable = total_funds - royalty;
    let winners_in_tier = u128::from(ranges[tier + 1] - ranges[tier]);
    let tier_total = apply_bps(distributable, u128::from(percentages_bps[tier]))?;

    Ok(RewardQuote {
        rank,
        royalty,
        distributable,
        tier,
        winners_in_tier,
        tier_total,
        reward: tier_total / winners_in_tier,
    })
}
