// 🏟️ Club Registry - explicit alias → canonical name lookup
//
// Problem solved:
// - "Spurs", "Tottenham", "Tottenham Hotspur" → one club
// - No substring guessing: "City" is not Manchester City
//
// The categorizer still uses the lenient `is_club_match`; this registry is the
// strict lookup for callers that need it (canonical names, slugs, server routes).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalizer::normalize_club_name;
use crate::transfer::Transfer;

// ============================================================================
// CLUB ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubEntry {
    /// The name we display and group by
    pub canonical: String,

    /// Alternative spellings seen in feeds
    pub aliases: Vec<String>,

    /// URL slug used by the site routes
    pub slug: String,
}

impl ClubEntry {
    pub fn new(canonical: &str, aliases: &[&str], slug: &str) -> Self {
        ClubEntry {
            canonical: canonical.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            slug: slug.to_string(),
        }
    }

    /// Every name (canonical + aliases) in normalized form
    fn normalized_names(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(&self.canonical)
            .chain(self.aliases.iter())
            .map(|name| normalize_club_name(name))
    }
}

// ============================================================================
// CLUB REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ClubRegistry {
    entries: Vec<ClubEntry>,

    /// normalized alias → index into `entries`
    index: BTreeMap<String, usize>,
}

impl ClubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the Premier League clubs the site tracks
    pub fn with_defaults() -> Self {
        let mut registry = ClubRegistry::new();

        for entry in [
            ClubEntry::new("Arsenal", &["Arsenal FC", "ARS"], "arsenal"),
            ClubEntry::new("Aston Villa", &["Aston Villa FC", "Villa"], "aston-villa"),
            ClubEntry::new("Bournemouth", &["AFC Bournemouth"], "bournemouth"),
            ClubEntry::new("Brentford", &["Brentford FC"], "brentford"),
            ClubEntry::new("Brighton & Hove Albion", &["Brighton", "Brighton and Hove Albion"], "brightonhovealbion"),
            ClubEntry::new("Burnley", &["Burnley FC"], "burnley"),
            ClubEntry::new("Chelsea", &["Chelsea FC", "CFC"], "chelsea"),
            ClubEntry::new("Crystal Palace", &["Crystal Palace FC", "Palace"], "crystalpalace"),
            ClubEntry::new("Everton", &["Everton FC"], "everton"),
            ClubEntry::new("Fulham", &["Fulham FC"], "fulham"),
            ClubEntry::new("Ipswich Town", &["Ipswich"], "ipswich-town"),
            ClubEntry::new("Leeds United", &["Leeds"], "leeds-united"),
            ClubEntry::new("Leicester City", &["Leicester"], "leicester-city"),
            ClubEntry::new("Liverpool", &["Liverpool FC", "LFC"], "liverpool"),
            ClubEntry::new("Manchester City", &["Man City", "Manchester City FC"], "manchestercity"),
            ClubEntry::new("Manchester United", &["Man Utd", "Man United", "Manchester United FC"], "manchesterunited"),
            ClubEntry::new("Newcastle United", &["Newcastle", "NUFC"], "newcastleunited"),
            ClubEntry::new("Nottingham Forest", &["Nottm Forest", "Nottingham Forest FC"], "nottinghamforest"),
            ClubEntry::new("Sheffield United", &["Sheffield Utd"], "sheffield-united"),
            ClubEntry::new("Sunderland", &["Sunderland AFC"], "sunderland"),
            ClubEntry::new("Tottenham Hotspur", &["Spurs", "Tottenham"], "tottenhamhotspur"),
            ClubEntry::new("West Ham United", &["West Ham"], "westhamunited"),
            ClubEntry::new("Wolverhampton Wanderers", &["Wolves"], "wolverhamptonwanderers"),
        ] {
            registry.register(entry);
        }

        registry
    }

    /// Register a club. Aliases already owned by another club are left alone.
    pub fn register(&mut self, entry: ClubEntry) {
        let position = self.entries.len();
        for key in entry.normalized_names() {
            if key.is_empty() {
                continue;
            }
            self.index.entry(key).or_insert(position);
        }
        self.entries.push(entry);
    }

    fn lookup(&self, name: &str) -> Option<&ClubEntry> {
        self.index
            .get(&normalize_club_name(name))
            .and_then(|&position| self.entries.get(position))
    }

    /// Exact alias lookup (after normalization); no substring matching
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|entry| entry.canonical.as_str())
    }

    pub fn slug(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|entry| entry.slug.as_str())
    }

    /// Resolve a route slug back to the canonical club
    pub fn by_slug(&self, slug: &str) -> Option<&ClubEntry> {
        self.entries.iter().find(|entry| entry.slug == slug)
    }

    /// Strict club equality: same registered club, or identical normalized
    /// names for clubs the registry does not know
    pub fn is_same_club(&self, a: &str, b: &str) -> bool {
        match (self.canonical_name(a), self.canonical_name(b)) {
            (Some(x), Some(y)) => x == y,
            (None, None) => {
                let a = normalize_club_name(a);
                !a.is_empty() && a == normalize_club_name(b)
            }
            _ => false,
        }
    }

    /// Rewrite from/to club names to their canonical form where known
    pub fn canonicalize_transfers(&self, transfers: &[Transfer]) -> Vec<Transfer> {
        transfers
            .iter()
            .map(|transfer| {
                let mut transfer = transfer.clone();
                if let Some(canonical) = self.canonical_name(&transfer.from_club) {
                    transfer.from_club = canonical.to_string();
                }
                if let Some(canonical) = self.canonical_name(&transfer.to_club) {
                    transfer.to_club = canonical.to_string();
                }
                transfer
            })
            .collect()
    }

    pub fn canonical_clubs(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.canonical.clone()).collect()
    }

    /// Club named by a route segment: a slug resolves to the canonical name,
    /// anything else passes through unchanged
    pub fn resolve_route(&self, segment: &str) -> String {
        self.by_slug(segment)
            .map(|entry| entry.canonical.clone())
            .unwrap_or_else(|| segment.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
