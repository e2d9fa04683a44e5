// 📡 Feed adapters - where transfer lists come from
//
// The remote news APIs live outside this crate; anything that can hand over a
// list of transfers implements `FeedAdapter`. Two local adapters ship here:
// in-memory fixtures and JSON/CSV dumps on disk.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::transfer::{load_transfers, Transfer};

/// FeedAdapter - the one required capability of a transfer source
pub trait FeedAdapter: Send + Sync {
    /// Provenance name ("teamtalk", "scoreinside", "static")
    fn name(&self) -> &str;

    /// Fetch the current transfer list. May fail or return nothing.
    fn get_transfers(&self) -> Result<Vec<Transfer>>;
}

// ============================================================================
// STATIC FEED
// ============================================================================

/// Fixed in-memory list (fixtures compiled in or loaded at startup)
pub struct StaticFeed {
    name: String,
    transfers: Vec<Transfer>,
}

impl StaticFeed {
    pub fn new(name: &str, transfers: Vec<Transfer>) -> Self {
        StaticFeed {
            name: name.to_string(),
            transfers,
        }
    }
}

impl FeedAdapter for StaticFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_transfers(&self) -> Result<Vec<Transfer>> {
        Ok(self.transfers.clone())
    }
}

// ============================================================================
// FILE FEED
// ============================================================================

/// Re-reads a JSON or CSV dump on every fetch
pub struct FileFeed {
    name: String,
    path: PathBuf,
}

impl FileFeed {
    pub fn new(name: &str, path: &Path) -> Self {
        FileFeed {
            name: name.to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeedAdapter for FileFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_transfers(&self) -> Result<Vec<Transfer>> {
        let transfers = load_transfers(&self.path)?;
        tracing::debug!(feed = %self.name, count = transfers.len(), path = ?self.path, "Loaded feed file");
        Ok(transfers)
    }
}
