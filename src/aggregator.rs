// 🧩 Transfer Data Store - fixtures + two live feeds → one deduplicated view
//
// Owns the feed snapshots and answers "what should club X show right now?".
// Time is always passed in; refresh scheduling is the caller's loop calling
// `due_feeds` + `refresh_feed`. Callers that must not hold the store while a
// feed is fetched split a refresh into `begin_refresh` + `complete_refresh`.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::categorizer::{categorize_transfers, get_club_transfers, CategorizedTransfers};
use crate::events::{EventBus, NullEventBus, RefreshEvent};
use crate::config::HubConfig;
use crate::feeds::{FeedAdapter, FileFeed};
use crate::freshness::{DataStatus, FeedSnapshot, FreshnessPolicy, MergedTransfers};
use crate::transfer::{load_transfers, Transfer};

/// Default auto-refresh cadence
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: i64 = 15;

struct FeedSlot {
    adapter: Arc<dyn FeedAdapter>,
    snapshot: FeedSnapshot,
    refresh_interval: Duration,
    last_attempt: Option<DateTime<Utc>>,
}

impl FeedSlot {
    fn new(adapter: Box<dyn FeedAdapter>, refresh_interval: Duration) -> Self {
        let snapshot = FeedSnapshot::new(adapter.name());
        FeedSlot {
            adapter: Arc::from(adapter),
            snapshot,
            refresh_interval,
            last_attempt: None,
        }
    }

    fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_attempt
            .map_or(true, |attempt| now - attempt >= self.refresh_interval)
    }
}

pub struct TransferDataStore {
    fixtures: Vec<Transfer>,
    primary: Option<FeedSlot>,
    secondary: Option<FeedSlot>,
    policy: FreshnessPolicy,
    bus: Arc<dyn EventBus>,
}

impl TransferDataStore {
    pub fn new(fixtures: Vec<Transfer>, policy: FreshnessPolicy) -> Self {
        TransferDataStore {
            fixtures,
            primary: None,
            secondary: None,
            policy,
            bus: Arc::new(NullEventBus),
        }
    }

    /// Build from config: fixtures from `static_data`, first feed as primary,
    /// second as secondary
    pub fn from_config(config: &HubConfig) -> Result<Self> {
        config.validate()?;

        let fixtures = match &config.static_data {
            Some(path) => load_transfers(path)?,
            None => Vec::new(),
        };

        let mut store = TransferDataStore::new(fixtures, config.freshness.policy());
        let mut feeds = config.feeds.iter();

        if let Some(feed) = feeds.next() {
            store = store.with_primary_feed(
                Box::new(FileFeed::new(&feed.name, &feed.path)),
                Duration::minutes(feed.refresh_minutes),
            );
        }
        if let Some(feed) = feeds.next() {
            store = store.with_secondary_feed(
                Box::new(FileFeed::new(&feed.name, &feed.path)),
                Duration::minutes(feed.refresh_minutes),
            )?;
        }

        Ok(store)
    }

    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_primary_feed(mut self, adapter: Box<dyn FeedAdapter>, refresh_interval: Duration) -> Self {
        self.primary = Some(FeedSlot::new(adapter, refresh_interval));
        self
    }

    /// Feeds are addressed by name, so the secondary must not reuse the
    /// primary's
    pub fn with_secondary_feed(
        mut self,
        adapter: Box<dyn FeedAdapter>,
        refresh_interval: Duration,
    ) -> Result<Self> {
        if let Some(primary) = &self.primary {
            if primary.adapter.name() == adapter.name() {
                anyhow::bail!("Duplicate feed name: {}", adapter.name());
            }
        }
        self.secondary = Some(FeedSlot::new(adapter, refresh_interval));
        Ok(self)
    }

    pub fn fixtures(&self) -> &[Transfer] {
        &self.fixtures
    }

    fn slots(&self) -> impl Iterator<Item = &FeedSlot> {
        self.primary.iter().chain(self.secondary.iter())
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut FeedSlot> {
        self.primary
            .iter_mut()
            .chain(self.secondary.iter_mut())
            .find(|slot| slot.adapter.name() == name)
    }

    pub fn feed_names(&self) -> Vec<String> {
        self.slots().map(|slot| slot.adapter.name().to_string()).collect()
    }

    pub fn snapshot(&self, name: &str) -> Option<&FeedSnapshot> {
        self.slots()
            .find(|slot| slot.adapter.name() == name)
            .map(|slot| &slot.snapshot)
    }

    /// Fetch one feed synchronously. Failures keep the previous transfers and
    /// record the error on the snapshot; they never propagate. Returns false
    /// for an unknown feed name.
    pub fn refresh_feed(&mut self, name: &str, now: DateTime<Utc>) -> bool {
        let Some(adapter) = self.begin_refresh(name, now) else {
            return false;
        };
        self.complete_refresh(name, adapter.get_transfers(), now)
    }

    /// Mark a feed as loading and hand out its adapter so the fetch can run
    /// without borrowing the store. `None` for an unknown feed name.
    pub fn begin_refresh(&mut self, name: &str, now: DateTime<Utc>) -> Option<Arc<dyn FeedAdapter>> {
        let slot = self.slot_mut(name)?;
        slot.last_attempt = Some(now);
        slot.snapshot.loading = true;
        Some(slot.adapter.clone())
    }

    /// Apply a fetch result started by `begin_refresh`
    pub fn complete_refresh(
        &mut self,
        name: &str,
        result: Result<Vec<Transfer>>,
        now: DateTime<Utc>,
    ) -> bool {
        let bus = self.bus.clone();
        let Some(slot) = self.slot_mut(name) else {
            return false;
        };

        match result {
            Ok(transfers) => {
                let count = transfers.len();
                slot.snapshot.transfers = transfers;
                slot.snapshot.last_updated = Some(now);
                slot.snapshot.error = None;
                tracing::info!(feed = name, count, "Feed refreshed");
                bus.publish(RefreshEvent::FeedRefreshed {
                    feed: name.to_string(),
                    count,
                    at: now,
                });
            }
            Err(e) => {
                let error = format!("{:#}", e);
                tracing::warn!(feed = name, error = %error, "Feed refresh failed");
                slot.snapshot.error = Some(error.clone());
                bus.publish(RefreshEvent::FeedFailed {
                    feed: name.to_string(),
                    error,
                    at: now,
                });
            }
        }

        slot.snapshot.loading = false;
        true
    }

    /// Manual "refresh everything"
    pub fn refresh_all(&mut self, now: DateTime<Utc>) {
        for (name, adapter) in self.begin_refresh_all(now) {
            let result = adapter.get_transfers();
            self.complete_refresh(&name, result, now);
        }
    }

    /// `begin_refresh` for every feed, announced as one manual refresh
    pub fn begin_refresh_all(&mut self, now: DateTime<Utc>) -> Vec<(String, Arc<dyn FeedAdapter>)> {
        self.bus.publish(RefreshEvent::RefreshRequested { feed: None, at: now });
        self.feed_names()
            .into_iter()
            .filter_map(|name| {
                let adapter = self.begin_refresh(&name, now)?;
                Some((name, adapter))
            })
            .collect()
    }

    /// `begin_refresh` for every feed that is due
    pub fn begin_due_refreshes(&mut self, now: DateTime<Utc>) -> Vec<(String, Arc<dyn FeedAdapter>)> {
        self.due_feeds(now)
            .into_iter()
            .filter_map(|name| {
                let adapter = self.begin_refresh(&name, now)?;
                Some((name, adapter))
            })
            .collect()
    }

    /// Feeds whose refresh interval has elapsed (or that never ran)
    pub fn due_feeds(&self, now: DateTime<Utc>) -> Vec<String> {
        self.slots()
            .filter(|slot| slot.is_due(now))
            .map(|slot| slot.adapter.name().to_string())
            .collect()
    }

    fn snapshot_or_empty(slot: &Option<FeedSlot>) -> FeedSnapshot {
        slot.as_ref()
            .map(|slot| slot.snapshot.clone())
            .unwrap_or_default()
    }

    /// Combined, deduplicated transfers per the freshness policy
    pub fn all_transfers(&self, now: DateTime<Utc>) -> MergedTransfers {
        let primary = Self::snapshot_or_empty(&self.primary);
        let secondary = Self::snapshot_or_empty(&self.secondary);
        self.policy.merge(&self.fixtures, &primary, &secondary, now)
    }

    pub fn data_status(&self, now: DateTime<Utc>) -> DataStatus {
        let primary = Self::snapshot_or_empty(&self.primary);
        let secondary = Self::snapshot_or_empty(&self.secondary);
        self.policy.status(&primary, &secondary, now)
    }

    /// What a club page shows: pre-filter, then categorize
    pub fn club_view(&self, club_name: &str, now: DateTime<Utc>) -> CategorizedTransfers {
        let merged = self.all_transfers(now);
        let club_transfers = get_club_transfers(&merged.transfers, club_name);
        categorize_transfers(&club_transfers, club_name)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::InMemoryEventBus;
    use crate::feeds::StaticFeed;
    use crate::transfer::TransferStatus;
    use chrono::TimeZone;

    struct FailingFeed;

    impl FeedAdapter for FailingFeed {
        fn name(&self) -> &str {
            "scoreinside"
        }

        fn get_transfers(&self) -> Result<Vec<Transfer>> {
            anyhow::bail!("HTTP 503")
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap()
    }

    fn live_feed() -> Box<dyn FeedAdapter> {
        Box::new(StaticFeed::new(
            "teamtalk",
            vec![
                Transfer::new("t1", "Hugo Ekitiké", "Eintracht Frankfurt", "Liverpool", "2025-07-14", TransferStatus::Rumored),
                Transfer::new("t2", "Florian Wirtz", "Leverkusen", "Liverpool", "2025-06-20", TransferStatus::Confirmed),
            ],
        ))
    }

    fn fixtures() -> Vec<Transfer> {
        vec![Transfer::new("s1", "Jeremie Frimpong", "Leverkusen", "Liverpool", "2025-07-01", TransferStatus::Confirmed)]
    }

    #[test]
    fn test_never_refreshed_uses_fallback() {
        let store = TransferDataStore::new(fixtures(), FreshnessPolicy::default())
            .with_primary_feed(live_feed(), Duration::minutes(15));

        let view = store.club_view("Liverpool", now());
        assert_eq!(view.confirmed_in.len(), 1);
        assert_eq!(view.confirmed_in[0].id, "s1");
        assert_eq!(store.data_status(now()), DataStatus::Stale);
    }

    #[test]
    fn test_refresh_switches_to_live_only() {
        let mut store = TransferDataStore::new(fixtures(), FreshnessPolicy::default())
            .with_primary_feed(live_feed(), Duration::minutes(15));

        assert!(store.refresh_feed("teamtalk", now()));
        let view = store.club_view("Liverpool", now());
        assert_eq!(view.rumors.len(), 1);
        assert_eq!(view.confirmed_in.len(), 1);
        assert_eq!(view.confirmed_in[0].id, "t2");
        assert_eq!(store.data_status(now()), DataStatus::Fresh);

        // Two hours later the feed is stale and fixtures come back
        let later = now() + Duration::hours(2);
        assert_eq!(store.club_view("Liverpool", later).confirmed_in.len(), 2);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_data() {
        let bus = InMemoryEventBus::new();
        let mut store = TransferDataStore::new(Vec::new(), FreshnessPolicy::default())
            .with_event_bus(bus.clone())
            .with_primary_feed(live_feed(), Duration::minutes(15))
            .with_secondary_feed(Box::new(FailingFeed), Duration::minutes(10))
            .unwrap();

        store.refresh_all(now());

        let failed = store.snapshot("scoreinside").unwrap();
        assert_eq!(failed.error.as_deref(), Some("HTTP 503"));
        assert!(failed.transfers.is_empty());
        assert_eq!(store.all_transfers(now()).transfers.len(), 2);

        let history = bus.history();
        assert_eq!(history.len(), 3);
        assert!(matches!(history[0], RefreshEvent::RefreshRequested { feed: None, .. }));
        assert!(matches!(history[2], RefreshEvent::FeedFailed { .. }));
    }

    #[test]
    fn test_due_feeds_follow_intervals() {
        let mut store = TransferDataStore::new(Vec::new(), FreshnessPolicy::default())
            .with_primary_feed(live_feed(), Duration::minutes(15))
            .with_secondary_feed(Box::new(FailingFeed), Duration::minutes(10))
            .unwrap();

        assert_eq!(store.due_feeds(now()).len(), 2);
        store.refresh_all(now());
        assert!(store.due_feeds(now() + Duration::minutes(5)).is_empty());
        assert_eq!(store.due_feeds(now() + Duration::minutes(10)), vec!["scoreinside".to_string()]);
        assert_eq!(store.due_feeds(now() + Duration::minutes(15)).len(), 2);

        let started = store.begin_due_refreshes(now() + Duration::minutes(10));
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].0, "scoreinside");
        assert_eq!(store.data_status(now() + Duration::minutes(10)), DataStatus::Loading);
    }

    #[test]
    fn test_from_config() {
        let dir = std::env::temp_dir().join(format!("hub-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let feed_path = dir.join("teamtalk.json");
        std::fs::write(
            &feed_path,
            r#"[{"id":"f1","playerName":"Milos Kerkez","fromClub":"Bournemouth","toClub":"Liverpool","date":"2025-06-30","status":"confirmed"}]"#,
        )
        .unwrap();

        let config: HubConfig = serde_json::from_value(serde_json::json!({
            "feeds": [
                {"name": "teamtalk", "path": feed_path},
                {"name": "scoreinside", "path": dir.join("missing.json"), "refresh_minutes": 10}
            ]
        }))
        .unwrap();

        let mut store = TransferDataStore::from_config(&config).unwrap();
        assert_eq!(store.feed_names(), vec!["teamtalk".to_string(), "scoreinside".to_string()]);

        store.refresh_all(now());
        assert_eq!(store.club_view("Bournemouth", now()).confirmed_out.len(), 1);
        assert!(store.snapshot("scoreinside").unwrap().error.is_some());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_secondary_feed_rejects_primary_name() {
        let result = TransferDataStore::new(Vec::new(), FreshnessPolicy::default())
            .with_primary_feed(live_feed(), Duration::minutes(15))
            .with_secondary_feed(
                Box::new(StaticFeed::new(
                    "teamtalk",
                    vec![Transfer::new("b1", "Rayan Cherki", "Lyon", "Man City", "2025-06-10", TransferStatus::Confirmed)],
                )),
                Duration::minutes(15),
            );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config_rejects_duplicate_feed_names() {
        let config: HubConfig = serde_json::from_value(serde_json::json!({
            "feeds": [
                {"name": "feed", "path": "a.json"},
                {"name": "feed", "path": "b.json"}
            ]
        }))
        .unwrap();
        assert!(TransferDataStore::from_config(&config).is_err());
    }

    #[test]
    fn test_split_refresh_reports_loading() {
        let mut store = TransferDataStore::new(fixtures(), FreshnessPolicy::default())
            .with_primary_feed(live_feed(), Duration::minutes(15));

        let adapter = store.begin_refresh("teamtalk", now()).unwrap();
        assert_eq!(store.data_status(now()), DataStatus::Loading);
        assert!(store.snapshot("teamtalk").unwrap().loading);
        assert!(store.due_feeds(now()).is_empty());
        assert!(store.begin_due_refreshes(now()).is_empty());

        assert!(store.complete_refresh("teamtalk", adapter.get_transfers(), now()));
        assert!(!store.snapshot("teamtalk").unwrap().loading);
        assert_eq!(store.data_status(now()), DataStatus::Fresh);
        assert_eq!(store.all_transfers(now()).transfers.len(), 2);
    }

    #[test]
    fn test_unknown_feed() {
        let mut store = TransferDataStore::new(Vec::new(), FreshnessPolicy::default());
        assert!(!store.refresh_feed("nope", now()));
        assert!(store.begin_refresh("nope", now()).is_none());
        assert!(store.feed_names().is_empty());
        assert!(store.club_view("Arsenal", now()).is_empty());
    }
}
