//! Storage traits and error types
//!
//! This module defines the trait interface for site stores and the
//! associated error types.

use crate::storage::AccessibleSiteSet;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Metadata of a completed save
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaveSnapshot {
    pub last_updated: DateTime<Utc>,
    pub total_count: usize,
}

/// Trait for site store implementations
///
/// A store holds one document: the full accessible-site set. Saving always
/// rewrites the whole document.
pub trait SiteStore {
    /// Reads the stored set; a missing document is an empty set
    fn load(&self) -> StoreResult<AccessibleSiteSet>;

    /// Rewrites the stored document from `set`
    ///
    /// On success the set's `last_updated` is advanced to the snapshot time.
    fn save(&self, set: &mut AccessibleSiteSet) -> StoreResult<SaveSnapshot>;

    /// Human-readable location of the document, for logs
    fn location(&self) -> String;
}

/// Loads the stored set, falling back to an empty one on any failure
///
/// Failures are logged as errors; a broken document never stops a crawl.
pub fn load_or_empty(store: &dyn SiteStore) -> AccessibleSiteSet {
    match store.load() {
        Ok(set) => {
            tracing::info!(
                "Loaded {} accessible sites from {}",
                set.len(),
                store.location()
            );
            set
        }
        Err(e) => {
            tracing::error!("Error loading existing sites: {}", e);
            AccessibleSiteSet::new()
        }
    }
}
