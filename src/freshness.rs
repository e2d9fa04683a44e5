// ⏱️ Freshness/Merge Policy - trust the live feeds or splice in fixtures?
//
// Simple age gate, not a consistency protocol:
// - either live feed updated within `stale_after` → live data only
// - otherwise → live data + static fixtures from the last `fallback_window`
// The combined set always goes through the merge-boundary dedup.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::deduplication::deduplicate_transfers_ui;
use crate::transfer::Transfer;

// ============================================================================
// FEED SNAPSHOT
// ============================================================================

/// Last known state of one live feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub name: String,

    /// Transfers from the last successful fetch
    pub transfers: Vec<Transfer>,

    /// When the last successful fetch completed
    pub last_updated: Option<DateTime<Utc>>,

    /// Message from the most recent failed fetch, cleared on success
    pub error: Option<String>,

    pub loading: bool,
}

impl FeedSnapshot {
    pub fn new(name: &str) -> Self {
        FeedSnapshot {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_updated.map(|updated| now - updated)
    }
}

// ============================================================================
// DECISIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeDecision {
    /// At least one feed is fresh
    LiveOnly,

    /// Both feeds are stale or never loaded; recent fixtures fill the gap
    LiveWithFallback,
}

/// What the freshness badge shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataStatus {
    Loading,
    Error,
    Fresh,
    Stale,
}

impl DataStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DataStatus::Loading => "Updating...",
            DataStatus::Error => "APIs Offline",
            DataStatus::Fresh => "Live Data",
            DataStatus::Stale => "Stale Data",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedTransfers {
    pub transfers: Vec<Transfer>,
    pub decision: MergeDecision,
    pub status: DataStatus,

    /// How many static fixtures were spliced in
    pub fallback_count: usize,
}

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    /// Feed age beyond which it no longer counts as live (default: 1 hour)
    pub stale_after: Duration,

    /// How far back static fixtures are eligible as fallback (default: 30 days)
    pub fallback_window: Duration,
}

impl FreshnessPolicy {
    pub fn new(stale_after: Duration, fallback_window: Duration) -> Self {
        FreshnessPolicy {
            stale_after,
            fallback_window,
        }
    }

    /// Updated strictly less than `stale_after` ago
    pub fn is_fresh(&self, feed: &FeedSnapshot, now: DateTime<Utc>) -> bool {
        feed.age(now).map_or(false, |age| age < self.stale_after)
    }

    pub fn decide(&self, a: &FeedSnapshot, b: &FeedSnapshot, now: DateTime<Utc>) -> MergeDecision {
        if self.is_fresh(a, now) || self.is_fresh(b, now) {
            MergeDecision::LiveOnly
        } else {
            MergeDecision::LiveWithFallback
        }
    }

    pub fn status(&self, a: &FeedSnapshot, b: &FeedSnapshot, now: DateTime<Utc>) -> DataStatus {
        if a.loading || b.loading {
            DataStatus::Loading
        } else if a.error.is_some() && b.error.is_some() {
            DataStatus::Error
        } else if self.is_fresh(a, now) || self.is_fresh(b, now) {
            DataStatus::Fresh
        } else {
            DataStatus::Stale
        }
    }

    /// Fixtures dated within the fallback window (and not in the future
    /// beyond `now`); undated fixtures are never used as fallback
    pub fn recent_fixtures(&self, fixtures: &[Transfer], now: DateTime<Utc>) -> Vec<Transfer> {
        let cutoff = now - self.fallback_window;
        fixtures
            .iter()
            .filter(|t| t.parsed_date().map_or(false, |date| date >= cutoff && date <= now))
            .cloned()
            .collect()
    }

    /// Combine feed a, feed b and (when both are stale) recent fixtures,
    /// then deduplicate at the merge boundary
    pub fn merge(
        &self,
        fixtures: &[Transfer],
        a: &FeedSnapshot,
        b: &FeedSnapshot,
        now: DateTime<Utc>,
    ) -> MergedTransfers {
        let decision = self.decide(a, b, now);

        let mut combined: Vec<Transfer> = a
            .transfers
            .iter()
            .chain(b.transfers.iter())
            .cloned()
            .collect();

        let mut fallback_count = 0;
        if decision == MergeDecision::LiveWithFallback {
            let recent = self.recent_fixtures(fixtures, now);
            fallback_count = recent.len();
            combined.extend(recent);
        }

        tracing::debug!(
            feed_a = a.transfers.len(),
            feed_b = b.transfers.len(),
            fallback = fallback_count,
            ?decision,
            "Merging transfer sources"
        );

        MergedTransfers {
            transfers: deduplicate_transfers_ui(&combined),
            decision,
            status: self.status(a, b, now),
            fallback_count,
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        FreshnessPolicy {
            stale_after: Duration::hours(1),
            fallback_window: Duration::days(30),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap()
    }

    fn feed(name: &str, updated_minutes_ago: Option<i64>, players: &[&str]) -> FeedSnapshot {
        FeedSnapshot {
            name: name.to_string(),
            transfers: players
                .iter()
                .map(|p| Transfer::new(p, p, "Porto", "Arsenal", "2025-07-14", TransferStatus::Rumored))
                .collect(),
            last_updated: updated_minutes_ago.map(|m| now() - Duration::minutes(m)),
            error: None,
            loading: false,
        }
    }

    fn fixtures() -> Vec<Transfer> {
        vec![
            Transfer::new("recent", "Fixture Recent", "Ajax", "Arsenal", "2025-07-01", TransferStatus::Confirmed),
            Transfer::new("old", "Fixture Old", "Ajax", "Arsenal", "2025-05-01", TransferStatus::Confirmed),
            Transfer::new("undated", "Fixture Undated", "Ajax", "Arsenal", "", TransferStatus::Confirmed),
        ]
    }

    #[test]
    fn test_fresh_feed_means_live_only() {
        let policy = FreshnessPolicy::default();
        let a = feed("teamtalk", Some(10), &["A"]);
        let b = feed("scoreinside", Some(300), &["B"]);

        let merged = policy.merge(&fixtures(), &a, &b, now());
        assert_eq!(merged.decision, MergeDecision::LiveOnly);
        assert_eq!(merged.status, DataStatus::Fresh);
        assert_eq!(merged.fallback_count, 0);
        assert_eq!(merged.transfers.len(), 2);
    }

    #[test]
    fn test_stale_feeds_splice_recent_fixtures() {
        let policy = FreshnessPolicy::default();
        let a = feed("teamtalk", Some(61), &["A"]);
        let b = feed("scoreinside", None, &[]);

        let merged = policy.merge(&fixtures(), &a, &b, now());
        assert_eq!(merged.decision, MergeDecision::LiveWithFallback);
        assert_eq!(merged.status, DataStatus::Stale);
        assert_eq!(merged.fallback_count, 1);

        let ids: Vec<_> = merged.transfers.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "recent"]);
    }

    #[test]
    fn test_exactly_one_hour_is_stale() {
        let policy = FreshnessPolicy::default();
        assert!(!policy.is_fresh(&feed("a", Some(60), &[]), now()));
        assert!(policy.is_fresh(&feed("a", Some(59), &[]), now()));
    }

    #[test]
    fn test_merge_dedups_across_feeds() {
        let policy = FreshnessPolicy::default();
        let a = feed("teamtalk", Some(5), &["A"]);
        let b = feed("scoreinside", Some(5), &["A"]);

        assert_eq!(policy.merge(&[], &a, &b, now()).transfers.len(), 1);
    }

    #[test]
    fn test_status_error_and_loading() {
        let policy = FreshnessPolicy::default();
        let mut a = feed("a", Some(5), &[]);
        let mut b = feed("b", Some(5), &[]);
        a.error = Some("timeout".to_string());
        assert_eq!(policy.status(&a, &b, now()), DataStatus::Fresh);

        b.error = Some("502".to_string());
        assert_eq!(policy.status(&a, &b, now()), DataStatus::Error);

        b.loading = true;
        assert_eq!(policy.status(&a, &b, now()), DataStatus::Loading);
        assert_eq!(DataStatus::Stale.label(), "Stale Data");
    }
}
