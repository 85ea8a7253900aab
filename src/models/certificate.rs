use super::{CertificateId, TeamId, TournamentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A bracket: one predicted winner per match plus the predicted combined final score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub teams_ids: Vec<TeamId>,
    pub finals_score_sum: u32,
}

impl Bracket {
    pub fn new(teams_ids: Vec<TeamId>, finals_score_sum: u32) -> Self {
        Self {
            teams_ids,
            finals_score_sum,
        }
    }

    /// Distance between the predicted and actual combined final score
    pub fn finals_diff(&self, actual: u32) -> u32 {
        self.finals_score_sum.abs_diff(actual)
    }
}

/// Prediction certificate: the scoring-relevant view of an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub tournament_id: TournamentId,
    pub predictions: Bracket,
    /// Cumulative points, never decreases
    pub score: u64,
    /// Number of edits since creation
    pub update_count: u32,
    /// Rounds already added to `score`
    pub scored_rounds: BTreeSet<u32>,
}

impl Certificate {
    /// Create a new Certificate with no score
    pub fn new(id: CertificateId, tournament_id: TournamentId, predictions: Bracket) -> Self {
        Self {
            id,
            tournament_id,
            predictions,
            score: 0,
            update_count: 0,
            scored_rounds: BTreeSet::new(),
        }
    }

    pub fn is_scored_in_round(&self, round: u32) -> bool {
        self.scored_rounds.contains(&round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finals_diff_is_absolute() {
        let bracket = Bracket::new(vec![1, 2, 1], 150);
        assert_eq!(bracket.finals_diff(140), 10);
        assert_eq!(bracket.finals_diff(160), 10);
        assert_eq!(bracket.finals_diff(150), 0);
    }

    #[test]
    fn test_new_certificate_is_unscored() {
        let cert = Certificate::new(7, 1, Bracket::new(vec![1, 2, 1], 0));
        assert_eq!(cert.score, 0);
        assert_eq!(cert.update_count, 0);
        assert!(!cert.is_scored_in_round(1));
    }
}
