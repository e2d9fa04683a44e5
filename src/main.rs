use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::Path;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg};
use transfer_hub::logging::{init_logging, LogConfig, LogFormat};
use transfer_hub::store::{ParsedTransferCache, SqliteStore};
use transfer_hub::{
    categorize_all_club_transfers, categorize_transfers, deduplicate_transfers_ui,
    filter_by_window, get_club_transfers, group_transfers_by_type, load_transfers,
    CategorizedTransfers, ClubRegistry, DeduplicationEngine, HubConfig, NullEventBus,
    StaleRumorChecker, Transfer, TransferDataStore, WindowFilter,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&log_config_from_cli(&cli))?;

    let config = match &cli.config {
        Some(path) => HubConfig::from_file(path)?,
        None => HubConfig::default(),
    };

    match cli.command {
        Command::Categorize { file, club } => run_categorize(&file, &club),
        Command::Clubs { file, clubs } => run_clubs(&file, &clubs, &config),
        Command::Dedup { file } => run_dedup(&file),
        Command::Stale { file, now } => run_stale(&file, &config, now.unwrap_or_else(Utc::now)),
        Command::Window { file, window } => run_window(&file, window),
        Command::Status { now } => run_status(&config, now.unwrap_or_else(Utc::now)),
        Command::Cache { file } => run_cache(&file, &config),
    }
}

/// `-v`/`-q` pin the level; without them `RUST_LOG` may override it
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        format: match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        },
        use_env_filter: !cli.verbosity.is_present(),
        ..LogConfig::default()
    }
}

fn load(path: &Path) -> Result<Vec<Transfer>> {
    println!("📂 Loading {}...", path.display());
    let transfers = load_transfers(path)?;
    println!("✓ Loaded {} transfers", transfers.len());
    Ok(transfers)
}

fn print_section(title: &str, transfers: &[Transfer]) {
    println!("\n{} ({})", title, transfers.len());
    for t in transfers {
        let fee = if t.fee.is_empty() { "-" } else { t.fee.as_str() };
        println!(
            "  {:<10} {:<24} {} → {}  [{}]",
            t.date, t.player_name, t.from_club, t.to_club, fee
        );
    }
}

fn print_categorized(club: &str, categorized: &CategorizedTransfers) {
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("⚽ {}", club);
    print_section("✅ Confirmed in", &categorized.confirmed_in);
    print_section("📤 Confirmed out", &categorized.confirmed_out);
    print_section("💬 Rumors", &categorized.rumors);
}

fn run_categorize(path: &Path, club: &str) -> Result<()> {
    let transfers = load(path)?;
    let club_transfers = get_club_transfers(&transfers, club);
    let categorized = categorize_transfers(&club_transfers, club);
    print_categorized(club, &categorized);

    let groups = group_transfers_by_type(&club_transfers, club);
    println!(
        "\n🔁 Loans: {} in, {} out",
        groups.loans_in.len(),
        groups.loans_out.len()
    );
    Ok(())
}

fn run_clubs(path: &Path, requested: &[String], config: &HubConfig) -> Result<()> {
    let registry = ClubRegistry::with_defaults();
    let transfers = registry.canonicalize_transfers(&load(path)?);

    let clubs: Vec<String> = if !requested.is_empty() {
        requested.to_vec()
    } else if !config.clubs.is_empty() {
        config.clubs.clone()
    } else {
        registry.canonical_clubs()
    };

    let by_club = categorize_all_club_transfers(&transfers, &clubs);

    println!("\n{:<28} {:>4} {:>4} {:>7}", "Club", "In", "Out", "Rumors");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (club, categorized) in &by_club {
        let counts = categorized.counts();
        println!(
            "{:<28} {:>4} {:>4} {:>7}",
            club, counts.confirmed_in, counts.confirmed_out, counts.rumors
        );
    }
    Ok(())
}

fn run_dedup(path: &Path) -> Result<()> {
    let transfers = load(path)?;

    let engine = DeduplicationEngine::new();
    let matches = engine.find_duplicates(&transfers);

    println!("\n🔍 Duplicate candidates: {}", matches.len());
    for m in &matches {
        println!(
            "  #{} ~ #{}  {:.2}  {}",
            m.first_index, m.second_index, m.confidence, m.reason
        );
    }

    let unique = deduplicate_transfers_ui(&transfers);
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Unique transfers: {}", unique.len());
    println!("✓ Duplicates removed: {}", transfers.len() - unique.len());
    Ok(())
}

fn run_stale(path: &Path, config: &HubConfig, now: DateTime<Utc>) -> Result<()> {
    let transfers = load(path)?;
    let checker = StaleRumorChecker::new(now).with_threshold(config.rumor_stale_days);
    let stale = checker.check(&transfers);

    if stale.is_empty() {
        println!("\n✅ No gossip older than {} days", checker.threshold_days);
        return Ok(());
    }

    println!(
        "\n⚠️  {} gossip records older than {} days:",
        stale.len(),
        checker.threshold_days
    );
    for rumor in &stale {
        println!("  {}", rumor.summary());
    }
    std::process::exit(1);
}

fn run_window(path: &Path, filter: WindowFilter) -> Result<()> {
    let transfers = deduplicate_transfers_ui(&load(path)?);
    let filtered = filter_by_window(&transfers, filter);
    let label = match filter {
        WindowFilter::All => "all",
        WindowFilter::Summer => "summer",
        WindowFilter::Winter => "winter",
    };
    print_section(&format!("🗓️  Window: {}", label), &filtered);
    Ok(())
}

fn run_status(config: &HubConfig, now: DateTime<Utc>) -> Result<()> {
    let mut store = TransferDataStore::from_config(config)?;
    store.refresh_all(now);

    println!("\n📡 Feeds");
    for name in store.feed_names() {
        let Some(snapshot) = store.snapshot(&name) else {
            continue;
        };
        match &snapshot.error {
            Some(error) => println!("  ❌ {:<16} {}", name, error),
            None => println!("  ✓ {:<16} {} transfers", name, snapshot.transfers.len()),
        }
    }

    let merged = store.all_transfers(now);
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Status: {}", merged.status.label());
    println!("Decision: {:?}", merged.decision);
    println!("Transfers: {} ({} from fixtures)", merged.transfers.len(), merged.fallback_count);
    Ok(())
}

fn run_cache(path: &Path, config: &HubConfig) -> Result<()> {
    let store = match &config.database {
        Some(db) => SqliteStore::open(db)?,
        None => SqliteStore::open_in_memory()?,
    };
    let cache = ParsedTransferCache::new(store);

    let parsed = cache.store_parsed(&load(path)?)?;
    println!("💾 Cached {} parsed transfers", parsed.len());

    let fixtures = match &config.static_data {
        Some(static_path) => load_transfers(static_path)?,
        None => Vec::new(),
    };
    let merged = cache.merge_with_static(&fixtures)?;
    println!("✓ {} transfers after merging with {} fixtures", merged.len(), fixtures.len());

    // Nothing else reads an in-memory cache after exit
    if config.database.is_none() {
        cache.clear(&NullEventBus)?;
    }
    Ok(())
}
