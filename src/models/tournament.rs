use super::{TeamId, TournamentId, UNREVEALED};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

/// Upper bound on rounds, keeps `2^(r-1)` weights inside `u64`
pub const MAX_ROUNDS: usize = 32;

/// Scheduled start/end of a round (Unix seconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundBounds {
    pub start: i64,
    pub end: i64,
}

/// Ground truth revealed by the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truth {
    /// Winner of every match, `UNREVEALED` until known
    pub teams_ids: Vec<TeamId>,
    /// Combined final score, `None` until the oracle supplies it
    pub finals_score_sum: Option<u32>,
}

/// Tournament model: bracket layout, round lifecycle and truth store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// Matches resolved in each round, index `r - 1`
    pub round_match_count: Vec<u32>,
    /// Flat index where each round's slots begin, index `r - 1`
    pub round_offsets: Vec<usize>,
    pub bracket_length: usize,
    pub max_points: u64,
    pub current_round: u32,
    /// Bounds per round, index `r - 1`
    pub round_bounds: Vec<Option<RoundBounds>>,
    pub truth: Truth,
    /// Rounds already applied to at least one certificate; their truth is frozen
    pub scored_rounds: BTreeSet<u32>,
}

impl Tournament {
    /// Create a new Tournament, validating the layout against `max_points`
    pub fn new(
        id: TournamentId,
        name: impl Into<String>,
        round_match_count: Vec<u32>,
        max_points: u64,
    ) -> AppResult<Self> {
        if round_match_count.is_empty() {
            return Err(AppError::InvariantViolation(
                "Tournament needs at least one round".to_string(),
            ));
        }
        if round_match_count.len() > MAX_ROUNDS {
            return Err(AppError::InvariantViolation(format!(
                "Tournament supports at most {} rounds, got {}",
                MAX_ROUNDS,
                round_match_count.len()
            )));
        }
        if let Some(pos) = round_match_count.iter().position(|&count| count == 0) {
            return Err(AppError::InvariantViolation(format!(
                "Round {} has no matches",
                pos + 1
            )));
        }

        let mut round_offsets = Vec::with_capacity(round_match_count.len());
        let mut offset = 0usize;
        let mut expected_points = 0u64;
        for (idx, &count) in round_match_count.iter().enumerate() {
            round_offsets.push(offset);
            offset += count as usize;
            expected_points += u64::from(count) << idx;
        }

        if expected_points != max_points {
            return Err(AppError::InvariantViolation(format!(
                "maxPoints {} does not match the round layout ({})",
                max_points, expected_points
            )));
        }

        let rounds = round_match_count.len();
        Ok(Self {
            id,
            name: name.into(),
            round_match_count,
            round_offsets,
            bracket_length: offset,
            max_points,
            current_round: 1,
            round_bounds: vec![None; rounds],
            truth: Truth {
                teams_ids: vec![UNREVEALED; offset],
                finals_score_sum: None,
            },
            scored_rounds: BTreeSet::new(),
        })
    }

    pub fn rounds_count(&self) -> u32 {
        self.round_match_count.len() as u32
    }

    pub fn is_valid_round(&self, round: u32) -> bool {
        round >= 1 && round <= self.rounds_count()
    }

    pub fn is_last_round(&self) -> bool {
        self.current_round == self.rounds_count()
    }

    /// Points per correct pick in `round`: `2^(round-1)`
    pub fn round_weight(round: u32) -> u64 {
        1u64 << (round.saturating_sub(1))
    }

    /// Slot range of `round` in the flat bracket array
    pub fn round_range(&self, round: u32) -> Range<usize> {
        let idx = (round - 1) as usize;
        let start = self.round_offsets[idx];
        start..start + self.round_match_count[idx] as usize
    }

    /// Flat index where the current round's slots begin
    pub fn current_round_index(&self) -> usize {
        self.round_offsets[(self.current_round - 1) as usize]
    }

    pub fn bounds(&self, round: u32) -> Option<RoundBounds> {
        if !self.is_valid_round(round) {
            return None;
        }
        self.round_bounds[(round - 1) as usize]
    }

    /// True once `now` is past the end of the final round
    pub fn has_ended(&self, now: i64) -> bool {
        self.bounds(self.rounds_count())
            .map(|bounds| now > bounds.end)
            .unwrap_or(false)
    }

    /// Predictions may change only while the current round has not started
    pub fn is_editable(&self, now: i64) -> bool {
        self.bounds(self.current_round)
            .map(|bounds| now < bounds.start)
            .unwrap_or(true)
    }

    pub fn is_slot_revealed(&self, slot: usize) -> bool {
        self.truth
            .teams_ids
            .get(slot)
            .map(|&team| team != UNREVEALED)
            .unwrap_or(false)
    }

    /// True when every match of `round` has a known winner
    pub fn is_round_revealed(&self, round: u32) -> bool {
        self.is_valid_round(round)
            && self.truth.teams_ids[self.round_range(round)]
                .iter()
                .all(|&team| team != UNREVEALED)
    }

    pub fn check_length(&self, actual: usize) -> AppResult<()> {
        if actual != self.bracket_length {
            return Err(AppError::LengthMismatch {
                expected: self.bracket_length,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march_madness() -> Tournament {
        Tournament::new(1, "March Madness", vec![32, 16, 8, 4, 2, 1], 192).unwrap()
    }

    #[test]
    fn test_layout_is_derived() {
        let t = march_madness();
        assert_eq!(t.bracket_length, 63);
        assert_eq!(t.round_offsets, vec![0, 32, 48, 56, 60, 62]);
        assert_eq!(t.round_range(2), 32..48);
        assert_eq!(t.current_round_index(), 0);
        assert_eq!(t.truth.teams_ids.len(), 63);
    }

    #[test]
    fn test_max_points_must_match_layout() {
        let result = Tournament::new(1, "bad", vec![32, 16, 8, 4, 2, 1], 191);
        assert!(matches!(result, Err(AppError::InvariantViolation(_))));

        assert!(Tournament::new(1, "empty", vec![], 0).is_err());
        assert!(Tournament::new(1, "zero", vec![2, 0], 2).is_err());
    }

    #[test]
    fn test_round_weights() {
        assert_eq!(Tournament::round_weight(1), 1);
        assert_eq!(Tournament::round_weight(6), 32);
    }

    #[test]
    fn test_has_ended_needs_final_bounds() {
        let mut t = march_madness();
        assert!(!t.has_ended(i64::MAX));

        t.round_bounds[5] = Some(RoundBounds { start: 100, end: 200 });
        assert!(!t.has_ended(200));
        assert!(t.has_ended(201));
    }

    #[test]
    fn test_editable_until_round_starts() {
        let mut t = march_madness();
        assert!(t.is_editable(0));

        t.round_bounds[0] = Some(RoundBounds { start: 100, end: 200 });
        assert!(t.is_editable(99));
        assert!(!t.is_editable(100));
    }
}
