//! JSON file backend for the accessible-site set
//!
//! The document is replaced atomically: it is written to a temporary file
//! in the same directory and then renamed over the target.

use crate::storage::traits::{SaveSnapshot, SiteStore, StoreError, StoreResult};
use crate::storage::{AccessibleSiteSet, ProbedEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The persisted document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDocument {
    #[serde(default, with = "super::timestamp::option")]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub total_accessible_sites: usize,

    #[serde(default)]
    pub accessible_sites: Vec<ProbedEntry>,
}

/// Every shape a stored file may take
///
/// `Legacy` is tried first: derived structs also accept sequences.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Legacy(Vec<ProbedEntry>),
    Current(SiteDocument),
}

impl From<StoredDocument> for AccessibleSiteSet {
    fn from(stored: StoredDocument) -> Self {
        match stored {
            StoredDocument::Current(doc) => {
                if doc.total_accessible_sites != doc.accessible_sites.len() {
                    tracing::warn!(
                        "Stored total ({}) disagrees with entry count ({})",
                        doc.total_accessible_sites,
                        doc.accessible_sites.len()
                    );
                }
                AccessibleSiteSet::from_entries(doc.accessible_sites, doc.last_updated)
            }
            StoredDocument::Legacy(entries) => AccessibleSiteSet::from_entries(entries, None),
        }
    }
}

/// Stores the accessible-site set as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses document text in either the current or the legacy form
    pub fn parse(content: &str) -> StoreResult<AccessibleSiteSet> {
        let stored: StoredDocument = serde_json::from_str(content)?;
        Ok(stored.into())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_atomically(&self, content: &[u8]) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(content).map_err(|e| self.io_error(e))?;
        tmp.flush().map_err(|e| self.io_error(e))?;
        tmp.as_file_mut()
            .sync_all()
            .map_err(|e| self.io_error(e))?;

        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

impl SiteStore for JsonFileStore {
    fn load(&self) -> StoreResult<AccessibleSiteSet> {
        if !self.path.exists() {
            return Ok(AccessibleSiteSet::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        Self::parse(&content)
    }

    fn save(&self, set: &mut AccessibleSiteSet) -> StoreResult<SaveSnapshot> {
        let now = Utc::now();
        let document = SiteDocument {
            last_updated: Some(now),
            total_accessible_sites: set.len(),
            accessible_sites: set.entries().to_vec(),
        };

        let content = serde_json::to_vec_pretty(&document)?;
        self.write_atomically(&content)?;
        set.mark_updated(now);

        tracing::info!(
            "Saved {} accessible sites to {}",
            document.total_accessible_sites,
            self.path.display()
        );

        Ok(SaveSnapshot {
            last_updated: now,
            total_count: document.total_accessible_sites,
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
