// 🗓️ Transfer windows - date-range filtering only, no window state machine
//
// Summer: 1 June - 31 August
// Winter: January

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::transfer::Transfer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferWindow {
    Summer,
    Winter,
}

/// Which slice of the season a view is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFilter {
    #[default]
    All,
    Summer,
    Winter,
}

impl WindowFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "all" => Some(WindowFilter::All),
            "summer" => Some(WindowFilter::Summer),
            "winter" => Some(WindowFilter::Winter),
            _ => None,
        }
    }
}

/// `None` for undated records and dates outside both windows
pub fn transfer_window_for(transfer: &Transfer) -> Option<TransferWindow> {
    let date = transfer.parsed_date()?;

    match date.month() {
        6..=8 => Some(TransferWindow::Summer),
        1 => Some(TransferWindow::Winter),
        _ => None,
    }
}

/// Summer is the default view and shows everything; winter shows January only
pub fn filter_by_window(transfers: &[Transfer], filter: WindowFilter) -> Vec<Transfer> {
    match filter {
        WindowFilter::All | WindowFilter::Summer => transfers.to_vec(),
        WindowFilter::Winter => transfers
            .iter()
            .filter(|t| transfer_window_for(t) == Some(TransferWindow::Winter))
            .cloned()
            .collect(),
    }
}
