//! CLI argument definitions for the transfer hub.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use transfer_hub::WindowFilter;

#[derive(Parser)]
#[command(
    name = "transfer-hub",
    version,
    about = "Aggregate, deduplicate and categorize football transfer news"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// JSON config file (feeds, fixtures, thresholds, tracked clubs).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "compact", global = true)]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Confirmed in / out and rumors for one club.
    Categorize {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        club: String,
    },

    /// Counts for every tracked club (or the clubs given).
    Clubs {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        clubs: Vec<String>,
    },

    /// Duplicate report and UI-deduplicated count.
    Dedup {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Gossip older than the staleness threshold; exits 1 when any is found.
    Stale {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Reference time (RFC 3339); defaults to the current time.
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
    },

    /// Transfers in one window.
    Window {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// summer, winter or all
        #[arg(value_parser = parse_window)]
        window: WindowFilter,
    },

    /// Refresh configured feeds and show freshness.
    Status {
        /// Reference time (RFC 3339); defaults to the current time.
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
    },

    /// Merge parsed transfers into the SQLite cache.
    Cache {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_now(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|now| now.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp: {}", e))
}

fn parse_window(raw: &str) -> Result<WindowFilter, String> {
    WindowFilter::parse(raw).ok_or_else(|| "expected summer, winter or all".to_string())
}
