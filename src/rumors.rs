// 🗞️ Rumor Classifier - keyword heuristics over free-text fields
//
// Advisory only: `status` is authoritative and the categorizer never calls
// into this module. Used to flag aging gossip for manual review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transfer::{Transfer, TransferStatus};

// ============================================================================
// KEYWORDS
// ============================================================================

/// Phrases that mark a record as gossip rather than fact
pub const RUMOR_KEYWORDS: &[&str] = &[
    "rumor", "rumour", "rumored", "rumoured", "gossip", "speculation", "speculated",
    "linked", "target", "interest", "reported", "allegedly", "supposedly",
    "unconfirmed", "potential", "considering", "monitoring", "tracking",
    "scouting", "interested in", "keen on", "eyeing", "close to", "nearing",
    "transfer target", "interest reported",
];

/// Wider list used by the stale-gossip sweep
pub const GOSSIP_KEYWORDS: &[&str] = &[
    "interest reported", "monitoring", "talks underway", "negotiations ongoing",
    "personal terms agreed", "medical scheduled", "bid submitted", "offer tabled",
    "verbal agreement", "hijack attempt", "on the radar", "agent pushing move",
    "player keen", "surprise move", "marquee signing", "exit door looms",
    "contract standoff", "free to leave", "loan with option to buy",
    "rumor", "rumoured", "gossip", "linked", "scouted", "target", "deal imminent",
    "terms agreed", "club pushing", "liked", "listed as target",
];

/// Default age (whole days) after which gossip needs a second look
pub const DEFAULT_STALE_DAYS: i64 = 3;

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Case-insensitive scan of `fee`, `source` and `player_name`
pub fn contains_rumor_keywords(transfer: &Transfer) -> bool {
    let text = [
        transfer.fee.as_str(),
        transfer.source.as_str(),
        transfer.player_name.as_str(),
    ]
    .join(" ");

    contains_any(&text, RUMOR_KEYWORDS)
}

/// Case-insensitive scan of `fee`, `status` and `source`.
/// A `rumored` status always matches ("rumor" is a gossip phrase).
pub fn is_gossip(transfer: &Transfer) -> bool {
    let text = format!(
        "{} {} {}",
        transfer.fee,
        transfer.status.as_str(),
        transfer.source
    );

    contains_any(&text, GOSSIP_KEYWORDS)
}

// ============================================================================
// STALE RUMOR CHECKER
// ============================================================================

/// One aging gossip record flagged for review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleRumor {
    pub transfer_id: String,
    pub player: String,
    pub date: String,
    pub fee: String,
    pub status: TransferStatus,
    pub source: String,
    pub age_days: i64,
}

impl StaleRumor {
    pub fn summary(&self) -> String {
        format!(
            "{} ({} days): {} | {} | {} | {}",
            self.player,
            self.age_days,
            self.date,
            self.status.as_str(),
            self.fee,
            self.source
        )
    }
}

pub struct StaleRumorChecker {
    /// Reference time; injected so sweeps are reproducible
    pub now: DateTime<Utc>,

    /// Gossip older than this many whole days is stale
    pub threshold_days: i64,
}

impl StaleRumorChecker {
    pub fn new(now: DateTime<Utc>) -> Self {
        StaleRumorChecker {
            now,
            threshold_days: DEFAULT_STALE_DAYS,
        }
    }

    pub fn with_threshold(mut self, days: i64) -> Self {
        self.threshold_days = days;
        self
    }

    /// Whole days between the record date and `now`; `None` if undated
    pub fn age_days(&self, transfer: &Transfer) -> Option<i64> {
        transfer
            .parsed_date()
            .map(|date| (self.now - date).num_days())
    }

    /// Dated records only; undated gossip cannot be judged stale
    pub fn is_stale(&self, transfer: &Transfer) -> bool {
        self.age_days(transfer)
            .map_or(false, |age| age > self.threshold_days)
    }

    /// Every gossip record older than the threshold, in input order
    pub fn check(&self, transfers: &[Transfer]) -> Vec<StaleRumor> {
        transfers
            .iter()
            .filter(|t| is_gossip(t))
            .filter_map(|t| {
                let age_days = self.age_days(t)?;
                if age_days <= self.threshold_days {
                    return None;
                }
                Some(StaleRumor {
                    transfer_id: t.id.clone(),
                    player: t.player_name.clone(),
                    date: t.date.clone(),
                    fee: t.fee.clone(),
                    status: t.status,
                    source: t.source.clone(),
                    age_days,
                })
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
