// 📊 Transfer Categorizer - per-club confirmed-in / confirmed-out / rumors
//
// Two passes over the input:
//   1. rumored records claim their player first
//   2. confirmed records go in/out unless the player is already claimed
// A player (by normalized name) lands in at most one bucket.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::deduplication::deduplicate_transfers_ui;
use crate::normalizer::is_club_match;
use crate::transfer::{Transfer, TransferStatus};

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedTransfers {
    pub confirmed_in: Vec<Transfer>,
    pub confirmed_out: Vec<Transfer>,
    pub rumors: Vec<Transfer>,
}

impl CategorizedTransfers {
    pub fn counts(&self) -> TransferCounts {
        TransferCounts {
            confirmed_in: self.confirmed_in.len(),
            confirmed_out: self.confirmed_out.len(),
            rumors: self.rumors.len(),
            total: self.confirmed_in.len() + self.confirmed_out.len() + self.rumors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed_in.is_empty() && self.confirmed_out.is_empty() && self.rumors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCounts {
    pub confirmed_in: usize,
    pub confirmed_out: usize,
    pub rumors: usize,
    pub total: usize,
}

/// Direction/loan split used by the club transfer lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferGroups {
    pub transfers_in: Vec<Transfer>,
    pub transfers_out: Vec<Transfer>,
    pub loans_in: Vec<Transfer>,
    pub loans_out: Vec<Transfer>,
}

// ============================================================================
// CATEGORIZATION
// ============================================================================

/// Partition `transfers` for `club_name` into confirmed-in, confirmed-out and
/// rumors. Pending and rejected records are left out. Buckets are ordered
/// newest first; undated records sink to the end.
pub fn categorize_transfers(transfers: &[Transfer], club_name: &str) -> CategorizedTransfers {
    let mut result = CategorizedTransfers::default();
    let mut seen: HashSet<String> = HashSet::new();

    // Phase 1: rumors claim their player
    for transfer in transfers.iter().filter(|t| t.status == TransferStatus::Rumored) {
        if seen.insert(transfer.player_key()) {
            result.rumors.push(transfer.clone());
        }
    }

    // Phase 2: confirmed moves, in or out
    for transfer in transfers.iter().filter(|t| t.status == TransferStatus::Confirmed) {
        let key = transfer.player_key();
        if seen.contains(&key) {
            continue;
        }

        if is_club_match(&transfer.to_club, club_name) {
            result.confirmed_in.push(transfer.clone());
        } else if is_club_match(&transfer.from_club, club_name) {
            result.confirmed_out.push(transfer.clone());
        } else {
            // Not this club's move; leave the player unclaimed
            continue;
        }
        seen.insert(key);
    }

    sort_newest_first(&mut result.confirmed_in);
    sort_newest_first(&mut result.confirmed_out);
    sort_newest_first(&mut result.rumors);

    tracing::info!(
        club = club_name,
        input = transfers.len(),
        confirmed_in = result.confirmed_in.len(),
        confirmed_out = result.confirmed_out.len(),
        rumors = result.rumors.len(),
        "Categorized transfers"
    );

    result
}

/// Every transfer where `club_name` fuzzy-matches the origin or destination
pub fn get_club_transfers(all_transfers: &[Transfer], club_name: &str) -> Vec<Transfer> {
    all_transfers
        .iter()
        .filter(|t| is_club_match(&t.to_club, club_name) || is_club_match(&t.from_club, club_name))
        .cloned()
        .collect()
}

/// Pre-filter then categorize, once per club. O(clubs × transfers).
pub fn categorize_all_club_transfers(
    all_transfers: &[Transfer],
    club_names: &[String],
) -> BTreeMap<String, CategorizedTransfers> {
    club_names
        .iter()
        .map(|club| {
            let club_transfers = get_club_transfers(all_transfers, club);
            (club.clone(), categorize_transfers(&club_transfers, club))
        })
        .collect()
}

/// Split a club's deduplicated transfers by direction and loan status.
/// A record is a loan when its fee mentions "loan".
pub fn group_transfers_by_type(transfers: &[Transfer], club_name: &str) -> TransferGroups {
    let mut groups = TransferGroups::default();

    for transfer in deduplicate_transfers_ui(transfers) {
        let incoming = is_club_match(&transfer.to_club, club_name);
        let outgoing = is_club_match(&transfer.from_club, club_name);

        match (incoming, outgoing, transfer.is_loan()) {
            (true, _, false) => groups.transfers_in.push(transfer),
            (true, _, true) => groups.loans_in.push(transfer),
            (false, true, false) => groups.transfers_out.push(transfer),
            (false, true, true) => groups.loans_out.push(transfer),
            _ => {}
        }
    }

    groups
}

fn compare_newest_first(a: &Transfer, b: &Transfer) -> Ordering {
    // Option ordering puts None first; reversing sinks undated records
    b.parsed_date().cmp(&a.parsed_date())
}

fn sort_newest_first(transfers: &mut [Transfer]) {
    transfers.sort_by(compare_newest_first);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_player_name;
    use proptest::prelude::*;

    fn transfer(
        id: &str,
        player: &str,
        from: &str,
        to: &str,
        date: &str,
        status: TransferStatus,
    ) -> Transfer {
        Transfer::new(id, player, from, to, date, status)
    }

    #[test]
    fn test_empty_input() {
        let result = categorize_transfers(&[], "Arsenal");
        assert!(result.is_empty());
        assert_eq!(result.counts().total, 0);
    }

    #[test]
    fn test_rumor_priority_over_confirmed() {
        let transfers = vec![
            transfer("1", "A", "Porto", "Arsenal", "2025-06-01", TransferStatus::Rumored),
            transfer("2", "A", "Porto", "Arsenal", "2025-07-01", TransferStatus::Confirmed),
        ];

        let result = categorize_transfers(&transfers, "Arsenal");
        assert_eq!(result.rumors.len(), 1);
        assert_eq!(result.rumors[0].id, "1");
        assert!(result.confirmed_in.is_empty());
    }

    #[test]
    fn test_rumor_priority_regardless_of_order() {
        let transfers = vec![
            transfer("2", "A", "Porto", "Arsenal", "2025-07-01", TransferStatus::Confirmed),
            transfer("1", "a.", "Porto", "Arsenal", "2025-06-01", TransferStatus::Rumored),
        ];

        let result = categorize_transfers(&transfers, "Arsenal");
        assert_eq!(result.rumors.len(), 1);
        assert!(result.confirmed_in.is_empty());
    }

    #[test]
    fn test_direction_in_and_out() {
        let transfers = vec![transfer("b", "B", "Chelsea", "Liverpool", "2025-06-01", TransferStatus::Confirmed)];

        let liverpool = categorize_transfers(&transfers, "Liverpool");
        assert_eq!(liverpool.confirmed_in.len(), 1);
        assert!(liverpool.confirmed_out.is_empty());

        let chelsea = categorize_transfers(&transfers, "Chelsea");
        assert_eq!(chelsea.confirmed_out.len(), 1);
        assert!(chelsea.confirmed_in.is_empty());
    }

    #[test]
    fn test_unrelated_confirmed_does_not_claim_player() {
        let transfers = vec![
            transfer("x", "C", "Roma", "Napoli", "2025-06-01", TransferStatus::Confirmed),
            transfer("y", "C", "Roma", "Everton", "2025-06-02", TransferStatus::Confirmed),
        ];

        let everton = categorize_transfers(&transfers, "Everton");
        assert_eq!(everton.confirmed_in.len(), 1);
        assert_eq!(everton.confirmed_in[0].id, "y");
    }

    #[test]
    fn test_duplicate_confirmed_first_seen_wins() {
        let transfers = vec![
            transfer("1", "D", "Lyon", "Fulham", "2025-06-01", TransferStatus::Confirmed),
            transfer("2", "D", "Lyon", "Fulham FC", "2025-06-03", TransferStatus::Confirmed),
        ];

        let result = categorize_transfers(&transfers, "Fulham");
        assert_eq!(result.confirmed_in.len(), 1);
        assert_eq!(result.confirmed_in[0].id, "1");
    }

    #[test]
    fn test_pending_and_rejected_excluded() {
        let mut rejected = transfer("r", "E", "Leeds", "Arsenal", "2025-06-01", TransferStatus::Rejected);
        rejected.rejection_reason = Some("Failed medical".to_string());
        let transfers = vec![
            transfer("p", "F", "Leeds", "Arsenal", "2025-06-01", TransferStatus::Pending),
            rejected,
        ];

        assert!(categorize_transfers(&transfers, "Arsenal").is_empty());
    }

    #[test]
    fn test_buckets_sorted_newest_first() {
        let transfers = vec![
            transfer("old", "G", "Ajax", "Arsenal", "2025-06-01", TransferStatus::Confirmed),
            transfer("undated", "H", "Ajax", "Arsenal", "soon", TransferStatus::Confirmed),
            transfer("new", "I", "Ajax", "Arsenal", "2025-08-01", TransferStatus::Confirmed),
            transfer("mid", "J", "Ajax", "Arsenal", "2025-07-01T09:00:00Z", TransferStatus::Confirmed),
        ];

        let ids: Vec<_> = categorize_transfers(&transfers, "Arsenal")
            .confirmed_in
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old", "undated"]);
    }

    #[test]
    fn test_missing_clubs_fail_silently() {
        let transfers = vec![transfer("m", "K", "", "", "2025-06-01", TransferStatus::Confirmed)];
        assert!(categorize_transfers(&transfers, "Arsenal").is_empty());
    }

    #[test]
    fn test_get_club_transfers() {
        let transfers = vec![
            transfer("1", "A", "Wolverhampton Wanderers", "Porto", "2025-06-01", TransferStatus::Confirmed),
            transfer("2", "B", "Porto", "Wolves", "2025-06-01", TransferStatus::Rumored),
            transfer("3", "C", "Porto", "Benfica", "2025-06-01", TransferStatus::Confirmed),
        ];

        let wolves = get_club_transfers(&transfers, "Wolves");
        assert_eq!(wolves.len(), 2);
    }

    #[test]
    fn test_categorize_all_club_transfers() {
        let transfers = vec![
            transfer("1", "A", "Chelsea", "Liverpool", "2025-06-01", TransferStatus::Confirmed),
            transfer("2", "B", "Porto", "Chelsea", "2025-06-02", TransferStatus::Rumored),
        ];
        let clubs = vec!["Chelsea".to_string(), "Liverpool".to_string(), "Everton".to_string()];

        let all = categorize_all_club_transfers(&transfers, &clubs);
        assert_eq!(all.len(), 3);
        assert_eq!(all["Chelsea"].counts(), TransferCounts { confirmed_in: 0, confirmed_out: 1, rumors: 1, total: 2 });
        assert_eq!(all["Liverpool"].confirmed_in.len(), 1);
        assert!(all["Liverpool"].rumors.is_empty());
        assert!(all["Everton"].is_empty());
    }

    #[test]
    fn test_group_transfers_by_type() {
        let transfers = vec![
            transfer("1", "A", "Porto", "Leeds United", "2025-06-01", TransferStatus::Confirmed).with_fee("£20M"),
            transfer("2", "B", "Leeds", "Burnley", "2025-06-01", TransferStatus::Confirmed).with_fee("Loan"),
            transfer("3", "C", "Leeds", "Celtic", "2025-06-01", TransferStatus::Confirmed).with_fee("Free Transfer"),
            transfer("4", "D", "Arsenal", "Leeds", "2025-06-01", TransferStatus::Confirmed).with_fee("Season-long loan"),
            transfer("5", "E", "Porto", "Benfica", "2025-06-01", TransferStatus::Confirmed),
        ];

        let groups = group_transfers_by_type(&transfers, "Leeds");
        assert_eq!(groups.transfers_in.len(), 1);
        assert_eq!(groups.loans_out.len(), 1);
        assert_eq!(groups.transfers_out.len(), 1);
        assert_eq!(groups.loans_in.len(), 1);
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    fn arb_status() -> impl Strategy<Value = TransferStatus> {
        prop_oneof![
            Just(TransferStatus::Confirmed),
            Just(TransferStatus::Rumored),
            Just(TransferStatus::Pending),
            Just(TransferStatus::Rejected),
        ]
    }

    fn arb_transfer() -> impl Strategy<Value = Transfer> {
        let players = prop::sample::select(vec!["Ben White", "ben white", "Ben-White", "Kai Havertz", "Jurrien Timber", "J. Timber"]);
        let clubs = prop::sample::select(vec!["Arsenal", "Arsenal FC", "Chelsea", "Man City", "Manchester City", "Wolves", ""]);
        let dates = prop::sample::select(vec!["2025-06-01", "2025-06-15", "2025-07-01T12:00:00Z", "2025-08-30", "bad"]);

        (players, clubs.clone(), clubs, dates, arb_status()).prop_map(|(player, from, to, date, status)| {
            Transfer::new("id", player, from, to, date, status)
        })
    }

    proptest! {
        #[test]
        fn prop_player_in_at_most_one_bucket(
            transfers in prop::collection::vec(arb_transfer(), 0..24),
            club in prop::sample::select(vec!["Arsenal", "Chelsea", "Manchester City"]),
        ) {
            let result = categorize_transfers(&transfers, club);
            let mut seen = HashSet::new();
            for t in result.confirmed_in.iter().chain(&result.confirmed_out).chain(&result.rumors) {
                prop_assert!(seen.insert(normalize_player_name(&t.player_name)));
            }
        }

        #[test]
        fn prop_buckets_sorted_descending(
            transfers in prop::collection::vec(arb_transfer(), 0..24),
        ) {
            let result = categorize_transfers(&transfers, "Arsenal");
            for bucket in [&result.confirmed_in, &result.confirmed_out, &result.rumors] {
                for pair in bucket.windows(2) {
                    prop_assert!(pair[0].parsed_date() >= pair[1].parsed_date());
                }
            }
        }

        #[test]
        fn prop_only_confirmed_and_rumored_placed(
            transfers in prop::collection::vec(arb_transfer(), 0..24),
        ) {
            let result = categorize_transfers(&transfers, "Chelsea");
            prop_assert!(result.rumors.iter().all(|t| t.status == TransferStatus::Rumored));
            prop_assert!(result
                .confirmed_in
                .iter()
                .chain(&result.confirmed_out)
                .all(|t| t.status == TransferStatus::Confirmed));
        }
    }
}
