//! Storage module for the accessible-site document
//!
//! This module holds the entry records produced by a crawl, the in-memory
//! set of reachable sites, and the JSON file backend that persists it.

mod json;
mod timestamp;
mod traits;

pub use json::{JsonFileStore, SiteDocument};
pub use traits::{load_or_empty, SaveSnapshot, SiteStore, StoreError, StoreResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A link taken from a directory page, not yet probed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    /// Normalized onion host
    #[serde(rename = "domain")]
    pub address: String,

    /// Locator that will be requested
    pub url: String,

    /// Link text as shown in the listing
    pub text: String,
}

/// Outcome recorded for a probed site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteStatus {
    #[serde(rename = "accessible", alias = "reachable")]
    Reachable,
}

/// A site that answered its probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbedEntry {
    #[serde(flatten)]
    pub entry: CandidateEntry,

    pub status: SiteStatus,

    #[serde(with = "timestamp")]
    pub tested_at: DateTime<Utc>,

    /// Seconds until the response headers arrived
    #[serde(rename = "response_time")]
    pub response_time_secs: f64,
}

impl ProbedEntry {
    /// Records a successful probe of `entry`
    pub fn reachable(entry: CandidateEntry, response_time_secs: f64) -> Self {
        Self {
            entry,
            status: SiteStatus::Reachable,
            tested_at: Utc::now(),
            response_time_secs,
        }
    }

    pub fn address(&self) -> &str {
        &self.entry.address
    }
}

/// The accumulated set of reachable sites
///
/// Entries keep insertion order and addresses are unique; the only way to
/// grow the set is [`AccessibleSiteSet::insert`].
#[derive(Debug, Clone, Default)]
pub struct AccessibleSiteSet {
    last_updated: Option<DateTime<Utc>>,
    entries: Vec<ProbedEntry>,
    addresses: HashSet<String>,
}

impl AccessibleSiteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from stored entries, dropping repeated addresses
    ///
    /// The first occurrence of an address wins.
    pub fn from_entries(
        entries: impl IntoIterator<Item = ProbedEntry>,
        last_updated: Option<DateTime<Utc>>,
    ) -> Self {
        let mut set = Self {
            last_updated,
            ..Self::default()
        };
        for entry in entries {
            let address = entry.address().to_string();
            if !set.insert(entry) {
                tracing::warn!("Dropping duplicate stored entry for {}", address);
            }
        }
        set
    }

    /// Appends an entry unless its address is already present
    ///
    /// Returns true if the entry was added.
    pub fn insert(&mut self, entry: ProbedEntry) -> bool {
        if !self.addresses.insert(entry.address().to_string()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    /// Addresses already recorded as reachable
    pub fn known_addresses(&self) -> &HashSet<String> {
        &self.addresses
    }

    pub fn entries(&self) -> &[ProbedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Timestamp of the last successful save or of the loaded document
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub(crate) fn mark_updated(&mut self, at: DateTime<Utc>) {
        self.last_updated = Some(at);
    }
}
