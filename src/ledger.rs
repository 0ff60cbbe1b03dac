use crate::models::{LedgerEntry, ListingDetails, ListingRecord};
use crate::utils;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Listing URL -> discovery metadata. The single source of truth for
/// "has this URL been seen".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    /// A missing file is an empty ledger; an unreadable one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            crate::debug_println!("Ledger file does not exist yet: {}", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ledger: {}", path.display()))?;
        let ledger: Ledger = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse ledger: {}", path.display()))?;

        Ok(ledger)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize ledger")?;
        utils::write_atomically(path, json.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&LedgerEntry> {
        self.entries.get(url)
    }

    /// Records a first-time acceptance.
    pub fn insert(&mut self, url: &str, record: &ListingRecord) {
        self.entries.insert(
            url.to_string(),
            LedgerEntry {
                discovered_at: record.discovered_at,
                listing: Some(record.listing.clone()),
            },
        );
    }

    /// Updates the listing data of a known URL and returns its record with the
    /// original discovery time. Unknown URLs are inserted as discovered `now`.
    pub fn refresh(&mut self, url: &str, listing: ListingDetails, now: DateTime<Utc>) -> ListingRecord {
        let entry = self
            .entries
            .entry(url.to_string())
            .or_insert_with(|| LedgerEntry {
                discovered_at: now,
                listing: None,
            });
        entry.listing = Some(listing.clone());

        ListingRecord {
            listing,
            discovered_at: entry.discovered_at,
        }
    }

    pub fn remove(&mut self, url: &str) -> Option<LedgerEntry> {
        self.entries.remove(url)
    }

    /// Every entry that carries listing data, oldest discovery first.
    pub fn records(&self) -> Vec<ListingRecord> {
        let mut keyed: Vec<(&String, ListingRecord)> = self
            .entries
            .iter()
            .filter_map(|(url, entry)| entry.to_record().map(|record| (url, record)))
            .collect();
        keyed.sort_by(|(a_url, a), (b_url, b)| {
            a.discovered_at
                .cmp(&b.discovered_at)
                .then_with(|| a_url.cmp(b_url))
        });
        keyed.into_iter().map(|(_, record)| record).collect()
    }
}

/// Append-only set of URLs classified as removed/sold.
#[derive(Debug, Clone, Default)]
pub struct SoldLog {
    urls: HashSet<String>,
    pending: Vec<String>,
}

impl SoldLog {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            crate::debug_println!("Sold log does not exist yet: {}", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sold log: {}", path.display()))?;

        Ok(Self::from_urls(raw.lines()))
    }

    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = urls
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        Self {
            urls,
            pending: Vec::new(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn record(&mut self, url: &str) {
        if self.urls.insert(url.to_string()) {
            self.pending.push(url.to_string());
        }
    }

    /// URLs recorded since load, in classification order.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Appends the pending URLs to `path` and returns how many were written.
    pub fn append_pending(&mut self, path: &Path) -> Result<usize> {
        utils::append_lines(path, &self.pending)?;
        let written = self.pending.len();
        self.pending.clear();
        Ok(written)
    }
}
