// Transfer Hub - Core Library
// Exposes the aggregation pipeline for the CLI, the API server, and tests

pub mod transfer;
pub mod normalizer;
pub mod clubs;
pub mod rumors;
pub mod deduplication;
pub mod categorizer;
pub mod freshness;
pub mod window;
pub mod feeds;
pub mod events;
pub mod store;
pub mod aggregator;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use transfer::{
    Transfer, TransferStatus, DataFormat,
    parse_transfer_date, detect_format, load_json, load_csv, load_transfers,
};
pub use normalizer::{
    normalize_club_name, normalize_player_name, is_club_match,
};
pub use clubs::{
    ClubEntry, ClubRegistry,
};
pub use rumors::{
    RUMOR_KEYWORDS, GOSSIP_KEYWORDS,
    contains_rumor_keywords, is_gossip, StaleRumor, StaleRumorChecker,
};
pub use deduplication::{
    DeduplicationEngine, DuplicateMatch, MatchStrategy,
    deduplicate_transfers_ui, merge_parsed_transfers,
};
pub use categorizer::{
    CategorizedTransfers, TransferCounts, TransferGroups,
    categorize_transfers, get_club_transfers, categorize_all_club_transfers,
    group_transfers_by_type,
};
pub use freshness::{
    FeedSnapshot, FreshnessPolicy, MergeDecision, MergedTransfers, DataStatus,
};
pub use window::{
    TransferWindow, WindowFilter, transfer_window_for, filter_by_window,
};
pub use feeds::{
    FeedAdapter, StaticFeed, FileFeed,
};
pub use events::{
    EventBus, RefreshEvent, InMemoryEventBus, NullEventBus,
};
pub use store::{
    KeyValueStore, MemoryStore, SqliteStore, ParsedTransferCache,
};
pub use aggregator::TransferDataStore;
pub use config::{
    HubConfig, FeedConfig, FreshnessConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
