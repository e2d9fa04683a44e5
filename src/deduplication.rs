// 🔍 Deduplication Engine - collapse records describing the same move
//
// Two merge passes and one diagnostic report:
// - deduplicate_transfers_ui: merge boundary, key = player + destination + status
// - merge_parsed_transfers: ingestion, key = player + destination, confirmed beats rumored
// - DeduplicationEngine::find_duplicates: explains which records collide and why

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::normalizer::normalize_club_name;
use crate::transfer::{Transfer, TransferStatus};

// ============================================================================
// MERGE PASSES
// ============================================================================

/// Keep one record per (player, destination, status); the most recent date
/// wins. Output keeps the position where each key was first seen.
pub fn deduplicate_transfers_ui(transfers: &[Transfer]) -> Vec<Transfer> {
    merge_by_key(
        transfers,
        |t| format!("{}-{}-{}", t.player_key(), normalize_club_name(&t.to_club), t.status.as_str()),
        |existing, candidate| is_newer(candidate, existing),
    )
}

/// Keep one record per (player, destination). A confirmed record replaces a
/// rumored one; otherwise the more recent date wins.
pub fn merge_parsed_transfers(transfers: &[Transfer]) -> Vec<Transfer> {
    merge_by_key(
        transfers,
        |t| format!("{}-{}", t.player_key(), normalize_club_name(&t.to_club)),
        |existing, candidate| {
            (candidate.status == TransferStatus::Confirmed
                && existing.status == TransferStatus::Rumored)
                || is_newer(candidate, existing)
        },
    )
}

/// Strictly newer; undated records never replace anything
fn is_newer(candidate: &Transfer, existing: &Transfer) -> bool {
    match (candidate.parsed_date(), existing.parsed_date()) {
        (Some(c), Some(e)) => c > e,
        (Some(_), None) => true,
        _ => false,
    }
}

fn merge_by_key<K, R>(transfers: &[Transfer], key_of: K, replaces: R) -> Vec<Transfer>
where
    K: Fn(&Transfer) -> String,
    R: Fn(&Transfer, &Transfer) -> bool,
{
    let mut kept: Vec<Transfer> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for transfer in transfers {
        let key = key_of(transfer);
        match slots.get(&key) {
            Some(&slot) => {
                if replaces(&kept[slot], transfer) {
                    kept[slot] = transfer.clone();
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(transfer.clone());
            }
        }
    }

    kept
}

// ============================================================================
// MATCH STRATEGY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Same fingerprint: player, destination, origin and status all agree
    ExactRecord,

    /// Same player and destination, one rumored and one confirmed
    StatusConflict,

    /// Same player, destination and status reported by different sources
    CrossSource,
}

// ============================================================================
// DUPLICATE MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMatch {
    /// Index of first transfer
    pub first_index: usize,

    /// Index of second transfer
    pub second_index: usize,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,

    /// Which strategy detected this match
    pub strategy: MatchStrategy,

    /// Human-readable reason
    pub reason: String,
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

pub struct DeduplicationEngine {
    /// Confidence reported for identical fingerprints (default: 0.95)
    pub exact_match_confidence: f64,

    /// Confidence reported for rumored/confirmed pairs (default: 0.85)
    pub status_conflict_confidence: f64,

    /// Confidence reported for multi-source reports (default: 0.75)
    pub cross_source_confidence: f64,
}

impl DeduplicationEngine {
    /// Create engine with default confidences
    pub fn new() -> Self {
        DeduplicationEngine {
            exact_match_confidence: 0.95,
            status_conflict_confidence: 0.85,
            cross_source_confidence: 0.75,
        }
    }

    /// Find all duplicate pairs in a list of transfers
    pub fn find_duplicates(&self, transfers: &[Transfer]) -> Vec<DuplicateMatch> {
        let mut matches = Vec::new();

        let fingerprints: Vec<String> = transfers.iter().map(|t| t.fingerprint()).collect();
        let player_keys: Vec<String> = transfers.iter().map(|t| t.player_key()).collect();
        let destinations: Vec<String> = transfers
            .iter()
            .map(|t| normalize_club_name(&t.to_club))
            .collect();

        for i in 0..transfers.len() {
            for j in (i + 1)..transfers.len() {
                let (a, b) = (&transfers[i], &transfers[j]);

                if fingerprints[i] == fingerprints[j] {
                    matches.push(DuplicateMatch {
                        first_index: i,
                        second_index: j,
                        confidence: self.exact_match_confidence,
                        strategy: MatchStrategy::ExactRecord,
                        reason: format!(
                            "Exact record: {} | {} → {} | {}",
                            a.player_name, a.from_club, a.to_club, a.status.as_str()
                        ),
                    });
                    continue;
                }

                if player_keys[i] != player_keys[j] || destinations[i] != destinations[j] {
                    continue;
                }

                if let Some(m) = self.check_status_conflict(i, j, a, b) {
                    matches.push(m);
                    continue;
                }

                if let Some(m) = self.check_cross_source(i, j, a, b) {
                    matches.push(m);
                }
            }
        }

        matches
    }

    fn check_status_conflict(
        &self,
        i: usize,
        j: usize,
        a: &Transfer,
        b: &Transfer,
    ) -> Option<DuplicateMatch> {
        let pair = (a.status, b.status);
        let conflicting = matches!(
            pair,
            (TransferStatus::Rumored, TransferStatus::Confirmed)
                | (TransferStatus::Confirmed, TransferStatus::Rumored)
        );
        if !conflicting {
            return None;
        }

        Some(DuplicateMatch {
            first_index: i,
            second_index: j,
            confidence: self.status_conflict_confidence,
            strategy: MatchStrategy::StatusConflict,
            reason: format!(
                "Status conflict: {} → {} is {} ({}) and {} ({})",
                a.player_name,
                a.to_club,
                a.status.as_str(),
                a.source,
                b.status.as_str(),
                b.source
            ),
        })
    }

    fn check_cross_source(
        &self,
        i: usize,
        j: usize,
        a: &Transfer,
        b: &Transfer,
    ) -> Option<DuplicateMatch> {
        if a.status != b.status || a.source.eq_ignore_ascii_case(&b.source) {
            return None;
        }

        Some(DuplicateMatch {
            first_index: i,
            second_index: j,
            confidence: self.cross_source_confidence,
            strategy: MatchStrategy::CrossSource,
            reason: format!(
                "Cross source: {} → {} reported by {} and {}",
                a.player_name, a.to_club, a.source, b.source
            ),
        })
    }
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_transfer(
        id: &str,
        player: &str,
        to_club: &str,
        date: &str,
        status: TransferStatus,
        source: &str,
    ) -> Transfer {
        Transfer::new(id, player, "Brentford", to_club, date, status).with_source(source)
    }

    #[test]
    fn test_ui_dedup_keeps_most_recent() {
        let transfers = vec![
            create_test_transfer("1", "Bryan Mbeumo", "Man Utd", "2025-07-01", TransferStatus::Confirmed, "Sky"),
            create_test_transfer("2", "Yoane Wissa", "Newcastle", "2025-07-02", TransferStatus::Rumored, "Sky"),
            create_test_transfer("3", "bryan mbeumo", "Manchester United", "2025-07-05", TransferStatus::Confirmed, "BBC"),
        ];

        let deduped = deduplicate_transfers_ui(&transfers);
        assert_eq!(deduped.len(), 2);
        // First-seen slot, newer record
        assert_eq!(deduped[0].id, "3");
        assert_eq!(deduped[1].id, "2");
    }

    #[test]
    fn test_ui_dedup_keeps_different_statuses() {
        let transfers = vec![
            create_test_transfer("1", "A", "Arsenal", "2025-07-01", TransferStatus::Rumored, "Sky"),
            create_test_transfer("2", "A", "Arsenal", "2025-07-02", TransferStatus::Confirmed, "Sky"),
        ];
        assert_eq!(deduplicate_transfers_ui(&transfers).len(), 2);
    }

    #[test]
    fn test_ui_dedup_tie_keeps_first() {
        let transfers = vec![
            create_test_transfer("1", "A", "Arsenal", "2025-07-01", TransferStatus::Rumored, "Sky"),
            create_test_transfer("2", "A", "Arsenal", "2025-07-01", TransferStatus::Rumored, "BBC"),
        ];
        let deduped = deduplicate_transfers_ui(&transfers);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].id, "1");
    }

    #[test]
    fn test_parsed_merge_confirmed_beats_rumored() {
        let transfers = vec![
            create_test_transfer("1", "A", "Arsenal", "2025-07-05", TransferStatus::Rumored, "Sky"),
            create_test_transfer("2", "A", "Arsenal", "2025-07-01", TransferStatus::Confirmed, "Club"),
        ];
        let merged = merge_parsed_transfers(&transfers);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "2");
    }

    #[test]
    fn test_parsed_merge_newer_wins_otherwise() {
        let transfers = vec![
            create_test_transfer("1", "A", "Arsenal", "2025-07-01", TransferStatus::Confirmed, "Club"),
            create_test_transfer("2", "A", "Arsenal", "2025-07-03", TransferStatus::Rumored, "Sky"),
        ];
        let merged = merge_parsed_transfers(&transfers);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "2");
    }

    #[test]
    fn test_undated_never_replaces() {
        let transfers = vec![
            create_test_transfer("1", "A", "Arsenal", "2025-07-01", TransferStatus::Rumored, "Sky"),
            create_test_transfer("2", "A", "Arsenal", "", TransferStatus::Rumored, "Sky"),
        ];
        assert_eq!(deduplicate_transfers_ui(&transfers)[0].id, "1");
    }

    #[test]
    fn test_find_exact_record() {
        let engine = DeduplicationEngine::new();
        let transfers = vec![
            create_test_transfer("1", "A", "Arsenal FC", "2025-07-01", TransferStatus::Confirmed, "Sky"),
            create_test_transfer("2", "A", "Arsenal", "2025-07-02", TransferStatus::Confirmed, "BBC"),
        ];

        let matches = engine.find_duplicates(&transfers);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].strategy, MatchStrategy::ExactRecord);
        assert!(matches[0].confidence >= 0.95);
    }

    #[test]
    fn test_find_status_conflict() {
        let engine = DeduplicationEngine::new();
        let transfers = vec![
            create_test_transfer("1", "A", "Arsenal", "2025-07-01", TransferStatus::Rumored, "Sky"),
            create_test_transfer("2", "A", "Arsenal", "2025-07-02", TransferStatus::Confirmed, "Club"),
        ];

        let matches = engine.find_duplicates(&transfers);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].strategy, MatchStrategy::StatusConflict);
    }

    #[test]
    fn test_find_cross_source() {
        let engine = DeduplicationEngine::new();
        let mut a = create_test_transfer("1", "A", "Arsenal", "2025-07-01", TransferStatus::Pending, "Sky");
        let b = create_test_transfer("2", "A", "Arsenal", "2025-07-01", TransferStatus::Pending, "BBC");
        a.from_club = "Porto".to_string();

        let matches = engine.find_duplicates(&[a, b]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].strategy, MatchStrategy::CrossSource);
    }

    #[test]
    fn test_no_match_different_players() {
        let engine = DeduplicationEngine::new();
        let transfers = vec![
            create_test_transfer("1", "A", "Arsenal", "2025-07-01", TransferStatus::Rumored, "Sky"),
            create_test_transfer("2", "B", "Arsenal", "2025-07-01", TransferStatus::Confirmed, "Sky"),
        ];
        assert!(engine.find_duplicates(&transfers).is_empty());
    }
}
