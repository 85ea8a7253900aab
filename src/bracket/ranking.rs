use crate::models::CertificateId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeSet;

/// Finalized ranking inputs of one certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub certificate_id: CertificateId,
    pub score: u64,
    /// `None` when the actual finals score is unknown; the level then ties everyone
    pub finals_diff: Option<u32>,
    pub update_count: u32,
}

impl LeaderboardEntry {
    /// Lexicographic sort key, best entry first
    fn rank_key(&self) -> (Reverse<u64>, Option<u32>, u32, CertificateId) {
        (
            Reverse(self.score),
            self.finals_diff,
            self.update_count,
            self.certificate_id,
        )
    }
}

impl Ord for LeaderboardEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank_key().cmp(&other.rank_key())
    }
}

impl PartialOrd for LeaderboardEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered, duplicate-free set of finalized entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: BTreeSet<LeaderboardEntry>,
    members: BTreeSet<CertificateId>,
}

impl Leaderboard {
    /// Insert an entry, returns false when the certificate is already ranked
    pub fn insert(&mut self, entry: LeaderboardEntry) -> bool {
        if !self.members.insert(entry.certificate_id) {
            return false;
        }
        self.entries.insert(entry);
        true
    }

    pub fn contains(&self, certificate_id: CertificateId) -> bool {
        self.members.contains(&certificate_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LeaderboardEntry> {
        self.entries.iter()
    }

    /// Certificate ids best first
    pub fn ordered_ids(&self) -> Vec<CertificateId> {
        self.entries.iter().map(|entry| entry.certificate_id).collect()
    }

    /// First `limit` certificate ids
    pub fn top(&self, limit: usize) -> Vec<CertificateId> {
        self.entries
            .iter()
            .take(limit)
            .map(|entry| entry.certificate_id)
            .collect()
    }

    /// 1-indexed position of a certificate
    pub fn rank_of(&self, certificate_id: CertificateId) -> Option<usize> {
        if !self.contains(certificate_id) {
            return None;
        }
        self.entries
            .iter()
            .position(|entry| entry.certificate_id == certificate_id)
            .map(|idx| idx + 1)
    }

    /// SHA-256 over the ordered entries, hex encoded
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in &self.entries {
            hasher.update(entry.certificate_id.to_be_bytes());
            hasher.update(entry.score.to_be_bytes());
            match entry.finals_diff {
                Some(diff) => {
                    hasher.update([1u8]);
                    hasher.update(diff.to_be_bytes());
                }
                None => hasher.update([0u8]),
            }
            hasher.update(entry.update_count.to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: CertificateId, score: u64, diff: Option<u32>, updates: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            certificate_id: id,
            score,
            finals_diff: diff,
            update_count: updates,
        }
    }

    #[test]
    fn test_score_ranks_first() {
        let mut board = Leaderboard::default();
        board.insert(entry(1, 100, Some(0), 0));
        board.insert(entry(2, 150, Some(40), 5));
        assert_eq!(board.ordered_ids(), vec![2, 1]);
    }

    #[test]
    fn test_closer_finals_guess_breaks_ties() {
        let mut board = Leaderboard::default();
        board.insert(entry(1, 100, Some(12), 0));
        board.insert(entry(2, 100, Some(3), 4));
        assert_eq!(board.ordered_ids(), vec![2, 1]);
    }

    #[test]
    fn test_fewer_updates_break_ties() {
        let mut board = Leaderboard::default();
        board.insert(entry(1, 100, Some(5), 3));
        board.insert(entry(2, 100, Some(5), 2));
        board.insert(entry(3, 100, Some(5), 1));
        assert_eq!(board.ordered_ids(), vec![3, 2, 1]);
    }

    #[test]
    fn test_lowest_id_is_final_tiebreak() {
        let mut board = Leaderboard::default();
        board.insert(entry(3, 100, Some(5), 1));
        board.insert(entry(1, 100, Some(5), 1));
        board.insert(entry(2, 100, Some(5), 1));
        assert_eq!(board.ordered_ids(), vec![1, 2, 3]);
        assert_ne!(
            entry(1, 100, Some(5), 1).cmp(&entry(2, 100, Some(5), 1)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_unknown_finals_score_ties_everyone() {
        let mut board = Leaderboard::default();
        board.insert(entry(2, 100, None, 0));
        board.insert(entry(1, 100, None, 1));
        assert_eq!(board.ordered_ids(), vec![2, 1]);
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let mut board = Leaderboard::default();
        assert!(board.insert(entry(1, 100, Some(0), 0)));
        assert!(!board.insert(entry(1, 120, Some(0), 0)));
        assert_eq!(board.len(), 1);
        assert_eq!(board.entries().next().map(|e| e.score), Some(100));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let entries = [
            entry(4, 90, Some(2), 0),
            entry(1, 120, Some(9), 2),
            entry(3, 120, Some(9), 1),
            entry(2, 120, Some(1), 7),
        ];

        let mut forward = Leaderboard::default();
        entries.iter().for_each(|e| {
            forward.insert(*e);
        });
        let mut backward = Leaderboard::default();
        entries.iter().rev().for_each(|e| {
            backward.insert(*e);
        });

        assert_eq!(forward.ordered_ids(), vec![2, 3, 1, 4]);
        assert_eq!(forward.ordered_ids(), backward.ordered_ids());
        assert_eq!(forward.digest(), backward.digest());
    }

    #[test]
    fn test_rank_and_top() {
        let mut board = Leaderboard::default();
        for id in 1..=5 {
            board.insert(entry(id, 10 * id, None, 0));
        }
        assert_eq!(board.rank_of(5), Some(1));
        assert_eq!(board.rank_of(1), Some(5));
        assert_eq!(board.rank_of(42), None);
        assert_eq!(board.top(2), vec![5, 4]);
        assert_eq!(board.top(10).len(), 5);
    }
}
