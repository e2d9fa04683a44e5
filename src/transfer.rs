// ⚽ Transfer record - the one entity every pipeline stage works on
// Loaded from static fixtures (JSON/CSV) or handed over by feed adapters

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::normalizer::{normalize_club_name, normalize_player_name};

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Deal announced by a club or a reliable outlet
    Confirmed,

    /// Gossip, links, reported interest
    Rumored,

    /// Agreed but not yet official
    Pending,

    /// Collapsed or turned down (see `rejection_reason`)
    Rejected,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Confirmed => "confirmed",
            TransferStatus::Rumored => "rumored",
            TransferStatus::Pending => "pending",
            TransferStatus::Rejected => "rejected",
        }
    }
}

// ============================================================================
// TRANSFER
// ============================================================================

/// A single transfer record as supplied by one source.
///
/// Club and player names are kept exactly as the source wrote them;
/// comparisons always go through the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    // ========================================================================
    // CORE FIELDS
    // ========================================================================
    /// Unique per source record, not across sources
    #[serde(default)]
    pub id: String,

    pub player_name: String,

    #[serde(default)]
    pub from_club: String,

    #[serde(default)]
    pub to_club: String,

    /// Free text: "£45M", "Free Transfer", "Loan"
    #[serde(default)]
    pub fee: String,

    /// ISO-8601 date or date-time
    #[serde(default)]
    pub date: String,

    /// Provenance label (site name)
    #[serde(default)]
    pub source: String,

    pub status: TransferStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    // ========================================================================
    // ENRICHMENT (display only, never read by the pipeline)
    // ========================================================================
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_clubs: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_image: Option<String>,
}

impl Transfer {
    /// Build a bare record with the core fields set
    pub fn new(
        id: &str,
        player_name: &str,
        from_club: &str,
        to_club: &str,
        date: &str,
        status: TransferStatus,
    ) -> Self {
        Transfer {
            id: id.to_string(),
            player_name: player_name.to_string(),
            from_club: from_club.to_string(),
            to_club: to_club.to_string(),
            fee: String::new(),
            date: date.to_string(),
            source: String::new(),
            status,
            rejection_reason: None,
            date_of_birth: None,
            age: None,
            country: None,
            past_clubs: None,
            player_image: None,
        }
    }

    pub fn with_fee(mut self, fee: &str) -> Self {
        self.fee = fee.to_string();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Parse `date` leniently. Unparseable dates yield `None`, never an error.
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        parse_transfer_date(&self.date)
    }

    /// Normalized player-name key used by every dedup pass
    pub fn player_key(&self) -> String {
        normalize_player_name(&self.player_name)
    }

    /// SHA-256 over the normalized (player, to, from, status) tuple.
    /// Two records from different sources describing the same move share it.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}",
            self.player_key(),
            normalize_club_name(&self.to_club),
            normalize_club_name(&self.from_club),
            self.status.as_str()
        ));
        format!("{:x}", hasher.finalize())
    }

    /// Assign a UUID when the source did not provide an id
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
    }

    pub fn is_loan(&self) -> bool {
        self.fee.to_lowercase().contains("loan")
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (assumed UTC) and `YYYY-MM-DD`.
pub fn parse_transfer_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

// ============================================================================
// LOADING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

/// Detect fixture format from the file extension
pub fn detect_format(path: &Path) -> Result<DataFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "json" => Ok(DataFormat::Json),
        "csv" => Ok(DataFormat::Csv),
        _ => bail!("Unsupported transfer data file: {:?}", path),
    }
}

/// Load a JSON array of transfers
pub fn load_json(path: &Path) -> Result<Vec<Transfer>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transfer file: {:?}", path))?;

    let mut transfers: Vec<Transfer> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transfers JSON: {:?}", path))?;

    for transfer in &mut transfers {
        transfer.ensure_id();
    }

    Ok(transfers)
}

/// Load a CSV fixture (header row uses the same camelCase names as the JSON)
pub fn load_csv(path: &Path) -> Result<Vec<Transfer>> {
    let mut rdr = csv::Reader::from_path(path).context("Failed to open CSV file")?;

    let mut transfers = Vec::new();

    for result in rdr.deserialize::<CsvTransferRow>() {
        let row = result.context("Failed to deserialize transfer")?;
        let mut transfer = row.into_transfer();
        transfer.ensure_id();
        transfers.push(transfer);
    }

    Ok(transfers)
}

/// Load any supported fixture file
pub fn load_transfers(path: &Path) -> Result<Vec<Transfer>> {
    match detect_format(path)? {
        DataFormat::Json => load_json(path),
        DataFormat::Csv => load_csv(path),
    }
}

/// Flat CSV shape; `pastClubs` is a `;`-separated list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvTransferRow {
    #[serde(default)]
    id: String,
    player_name: String,
    #[serde(default)]
    from_club: String,
    #[serde(default)]
    to_club: String,
    #[serde(default)]
    fee: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    source: String,
    status: TransferStatus,
    #[serde(default)]
    rejection_reason: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    past_clubs: Option<String>,
    #[serde(default)]
    player_image: Option<String>,
}

impl CsvTransferRow {
    fn into_transfer(self) -> Transfer {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Transfer {
            id: self.id,
            player_name: self.player_name,
            from_club: self.from_club,
            to_club: self.to_club,
            fee: self.fee,
            date: self.date,
            source: self.source,
            status: self.status,
            rejection_reason: non_empty(self.rejection_reason),
            date_of_birth: non_empty(self.date_of_birth),
            age: self.age,
            country: non_empty(self.country),
            past_clubs: non_empty(self.past_clubs).map(|clubs| {
                clubs
                    .split(';')
                    .map(|club| club.trim().to_string())
                    .filter(|club| !club.is_empty())
                    .collect()
            }),
            player_image: non_empty(self.player_image),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
