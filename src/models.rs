use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three fields scraped from a listing page, already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetails {
    pub mls_url: String,
    pub img: String,
    pub address: String,
}

/// A listing accepted during a run. `discovered_at` drives the fresh window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    #[serde(flatten)]
    pub listing: ListingDetails,
    pub discovered_at: DateTime<Utc>,
}

/// One ledger value. Entries written by older runs only carry `discoveredAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub discovered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<ListingDetails>,
}

impl LedgerEntry {
    pub fn to_record(&self) -> Option<ListingRecord> {
        self.listing.as_ref().map(|listing| ListingRecord {
            listing: listing.clone(),
            discovered_at: self.discovered_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    MlsUrl,
    Img,
    Address,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::MlsUrl => write!(f, "mlsUrl"),
            MissingField::Img => write!(f, "img"),
            MissingField::Address => write!(f, "address"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Known,
    PreviouslySold,
}

/// Terminal state of one candidate URL within a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingOutcome {
    Skipped(SkipReason),
    Failed(String),
    Sold,
    Rejected(Vec<MissingField>),
    Accepted(ListingRecord),
    Refreshed(ListingRecord),
}
