use super::{BracketError, BracketResult};
use crate::models::{TeamId, Tournament, UNREVEALED};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Points of a bracket through the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPoints {
    /// Rounds `1..=currentRound` combined
    pub total: u64,
    /// Current round alone
    pub current_round: u64,
}

fn check_length(tournament: &Tournament, picks: &[TeamId]) -> BracketResult<()> {
    if picks.len() != tournament.bracket_length {
        return Err(BracketError::LengthMismatch {
            expected: tournament.bracket_length,
            actual: picks.len(),
        });
    }
    Ok(())
}

/// Points earned by `picks` in a single round against the revealed truth
///
/// Unrevealed truth slots never match.
pub fn round_points(tournament: &Tournament, picks: &[TeamId], round: u32) -> BracketResult<u64> {
    check_length(tournament, picks)?;
    if !tournament.is_valid_round(round) {
        return Err(BracketError::InvalidRound(round));
    }

    let truth = &tournament.truth.teams_ids;
    let matches = tournament
        .round_range(round)
        .filter(|&slot| truth[slot] != UNREVEALED && picks[slot] == truth[slot])
        .count() as u64;

    Ok(matches * Tournament::round_weight(round))
}

/// Fresh recomputation of points through the current round
pub fn calc_bracket_points(tournament: &Tournament, picks: &[TeamId]) -> BracketResult<BracketPoints> {
    check_length(tournament, picks)?;

    let mut total = 0;
    let mut current_round = 0;
    for round in 1..=tournament.current_round {
        current_round = round_points(tournament, picks, round)?;
        total += current_round;
    }

    Ok(BracketPoints {
        total,
        current_round,
    })
}

/// Points missed on revealed slots of rounds that already started
pub fn points_already_lost(tournament: &Tournament, picks: &[TeamId]) -> BracketResult<u64> {
    check_length(tournament, picks)?;

    let truth = &tournament.truth.teams_ids;
    let mut lost = 0;
    for round in 1..=tournament.current_round {
        let missed = tournament
            .round_range(round)
            .filter(|&slot| truth[slot] != UNREVEALED && picks[slot] != truth[slot])
            .count() as u64;
        lost += missed * Tournament::round_weight(round);
    }

    Ok(lost)
}

/// Teams picked to win a match whose revealed winner is someone else
fn eliminated_picks(tournament: &Tournament, picks: &[TeamId]) -> HashSet<TeamId> {
    let truth = &tournament.truth.teams_ids;
    (1..=tournament.current_round)
        .flat_map(|round| tournament.round_range(round))
        .filter(|&slot| {
            truth[slot] != UNREVEALED && picks[slot] != UNREVEALED && picks[slot] != truth[slot]
        })
        .map(|slot| picks[slot])
        .collect()
}

/// Points on still-open slots that can no longer be won because the picked team is already out
///
/// Zero in the first round (nothing decided yet) and in the final round (nothing left).
pub fn calc_points_will_be_lost(tournament: &Tournament, picks: &[TeamId]) -> BracketResult<u64> {
    check_length(tournament, picks)?;
    if tournament.current_round == 1 || tournament.is_last_round() {
        return Ok(0);
    }

    let eliminated = eliminated_picks(tournament, picks);
    if eliminated.is_empty() {
        return Ok(0);
    }

    let mut lost = 0;
    for round in tournament.current_round..=tournament.rounds_count() {
        let doomed = tournament
            .round_range(round)
            .filter(|&slot| !tournament.is_slot_revealed(slot) && eliminated.contains(&picks[slot]))
            .count() as u64;
        lost += doomed * Tournament::round_weight(round);
    }

    Ok(lost)
}

/// Best total still reachable by the bracket
pub fn bracket_potential(tournament: &Tournament, picks: &[TeamId]) -> BracketResult<u64> {
    let lost = points_already_lost(tournament, picks)?;
    let will_be_lost = calc_points_will_be_lost(tournament, picks)?;
    Ok(tournament
        .max_points
        .saturating_sub(lost)
        .saturating_sub(will_be_lost))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march_madness() -> Tournament {
        Tournament::new(1, "March Madness", vec![32, 16, 8, 4, 2, 1], 192).unwrap()
    }

    fn sequential_bracket() -> Vec<TeamId> {
        (1..=63).collect()
    }

    fn with_zeros(mut revealed: Vec<TeamId>, total: usize) -> Vec<TeamId> {
        revealed.resize(total, UNREVEALED);
        revealed
    }

    #[test]
    fn test_perfect_bracket_scores_max_points() {
        let mut t = march_madness();
        t.truth.teams_ids = sequential_bracket();
        t.current_round = 6;

        let points = calc_bracket_points(&t, &sequential_bracket()).unwrap();
        assert_eq!(points.total, 192);
        assert_eq!(points.current_round, 32);
    }

    #[test]
    fn test_each_round_worth_the_same() {
        let mut t = march_madness();
        t.truth.teams_ids = sequential_bracket();
        for round in 1..=6 {
            assert_eq!(round_points(&t, &sequential_bracket(), round).unwrap(), 32);
        }
    }

    #[test]
    fn test_missed_final_costs_32() {
        let mut t = march_madness();
        t.truth.teams_ids = sequential_bracket();
        t.current_round = 6;

        let mut picks = sequential_bracket();
        picks[62] = 99;
        assert_eq!(calc_bracket_points(&t, &picks).unwrap().total, 160);
    }

    #[test]
    fn test_missed_second_round_pick() {
        let mut t = march_madness();
        t.truth.teams_ids = sequential_bracket();
        t.current_round = 2;

        let mut picks = sequential_bracket();
        picks[32] = 99;
        assert_eq!(calc_bracket_points(&t, &picks).unwrap().current_round, 30);
    }

    #[test]
    fn test_unrevealed_slots_never_score() {
        let t = march_madness();
        let picks = vec![UNREVEALED; 63];
        assert_eq!(round_points(&t, &picks, 1).unwrap(), 0);
    }

    #[test]
    fn test_length_mismatch() {
        let t = march_madness();
        let result = calc_bracket_points(&t, &[1, 2, 3]);
        assert_eq!(
            result,
            Err(BracketError::LengthMismatch {
                expected: 63,
                actual: 3
            })
        );
        assert!(bracket_potential(&t, &[1]).is_err());
    }

    #[test]
    fn test_nothing_will_be_lost_in_first_and_last_round() {
        let mut t = march_madness();
        assert_eq!(calc_points_will_be_lost(&t, &sequential_bracket()).unwrap(), 0);

        t.current_round = 6;
        assert_eq!(calc_points_will_be_lost(&t, &sequential_bracket()).unwrap(), 0);
    }

    #[test]
    fn test_potential_before_first_round_is_max() {
        let t = march_madness();
        assert_eq!(bracket_potential(&t, &sequential_bracket()).unwrap(), 192);
    }

    #[test]
    fn test_potential_after_first_round_upset() {
        // 13 beats 10 in round one; the bracket rides 10 all the way to the title
        let mut t = march_madness();
        t.truth.teams_ids = with_zeros(
            vec![
                15, 6, 1, 31, 2, 55, 59, 33, 14, 48, 16, 23, 17, 18, 3, 42, 25, 26, 36, 63, 45,
                53, 40, 52, 13, 27, 32, 46, 7, 51, 44, 12,
            ],
            63,
        );
        t.current_round = 2;

        let picks: Vec<TeamId> = [
            vec![
                15, 6, 1, 31, 2, 55, 59, 33, 14, 48, 16, 23, 17, 18, 3, 42, 25, 26, 36, 63, 45,
                53, 40, 52, 10, 27, 32, 46, 7, 51, 44, 12,
            ],
            vec![44, 51, 26, 15, 10, 2, 40, 12, 27, 1, 18, 14, 42, 32, 48, 23],
            vec![18, 51, 40, 12, 48, 1, 10, 2],
            vec![10, 18, 12, 51],
            vec![12, 10],
            vec![10],
        ]
        .concat();

        assert_eq!(points_already_lost(&t, &picks).unwrap(), 1);
        assert_eq!(calc_points_will_be_lost(&t, &picks).unwrap(), 62);
        assert_eq!(bracket_potential(&t, &picks).unwrap(), 192 - 63);
    }

    #[test]
    fn test_revealed_slots_are_not_counted_as_lost() {
        // round 2 is already revealed and credits 10 in slot 36 despite the round one upset
        let mut t = march_madness();
        t.truth.teams_ids = with_zeros(
            [
                vec![
                    15, 6, 1, 31, 2, 55, 59, 33, 14, 48, 16, 23, 17, 18, 3, 42, 25, 26, 36, 63,
                    45, 53, 40, 52, 13, 27, 32, 46, 7, 51, 44, 12,
                ],
                vec![44, 51, 26, 15, 10, 2, 40, 12, 27, 1, 18, 14, 42, 32, 48, 23],
            ]
            .concat(),
            63,
        );
        t.current_round = 2;

        let picks: Vec<TeamId> = [
            vec![
                15, 6, 1, 31, 2, 55, 59, 33, 14, 48, 16, 23, 17, 18, 3, 42, 25, 26, 36, 63, 45,
                53, 40, 52, 10, 27, 32, 46, 7, 51, 44, 12,
            ],
            vec![44, 51, 26, 15, 10, 2, 40, 12, 27, 1, 18, 14, 42, 32, 48, 23],
            vec![18, 51, 40, 12, 48, 1, 10, 2],
            vec![10, 18, 12, 51],
            vec![12, 10],
            vec![10],
        ]
        .concat();

        assert_eq!(points_already_lost(&t, &picks).unwrap(), 1);
        // 4 + 8 + 16 + 32, the revealed round 2 slot is already settled
        assert_eq!(calc_points_will_be_lost(&t, &picks).unwrap(), 60);
        assert_eq!(bracket_potential(&t, &picks).unwrap(), 192 - 61);
    }

    #[test]
    fn test_potential_after_third_round() {
        let mut t = march_madness();
        t.truth.teams_ids = with_zeros(
            [
                vec![
                    15, 6, 1, 31, 2, 55, 59, 33, 14, 21, 16, 23, 17, 18, 3, 42, 25, 26, 36, 63,
                    45, 53, 40, 52, 10, 27, 32, 46, 7, 51, 44, 12,
                ],
                vec![44, 51, 26, 15, 10, 2, 40, 12, 27, 1, 18, 14, 42, 32, 21, 23],
                vec![18, 51, 40, 12, 21, 1, 10, 2],
            ]
            .concat(),
            63,
        );
        t.current_round = 4;

        let picks: Vec<TeamId> = [
            vec![
                15, 6, 1, 31, 2, 55, 59, 33, 14, 48, 16, 23, 17, 18, 3, 42, 25, 26, 36, 63, 45,
                53, 40, 52, 10, 27, 32, 46, 7, 51, 44, 12,
            ],
            vec![44, 51, 26, 15, 10, 2, 40, 59, 27, 1, 18, 14, 42, 32, 48, 23],
            vec![18, 51, 40, 59, 48, 1, 10, 2],
            vec![10, 18, 59, 51],
            vec![59, 10],
            vec![10],
        ]
        .concat();

        assert_eq!(points_already_lost(&t, &picks).unwrap(), 13);
        assert_eq!(calc_points_will_be_lost(&t, &picks).unwrap(), 24);
        assert_eq!(bracket_potential(&t, &picks).unwrap(), 192 - 37);
    }

    #[test]
    fn test_potential_in_final_round() {
        let mut t = march_madness();
        t.truth.teams_ids = sequential_bracket();
        t.current_round = 6;

        let mut picks = sequential_bracket();
        picks[62] = 99;
        assert_eq!(calc_points_will_be_lost(&t, &picks).unwrap(), 0);
        assert_eq!(bracket_potential(&t, &picks).unwrap(), 160);
    }
}
