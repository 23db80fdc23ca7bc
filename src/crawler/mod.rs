//! Crawler module for listing walks and reachability probes
//!
//! This module contains the core crawling logic, including:
//! - Proxied HTTP fetching with retry
//! - Listing page parsing and candidate extraction
//! - Reachability probing
//! - Pacing between requests
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod prober;
mod scheduler;

pub use coordinator::{Coordinator, RunReport};
pub use fetcher::{
    build_http_client, check_connectivity, fetch_listing_page, listing_url, ListingFetch,
    RetryPolicy, RetryingClient, RETRY_STATUSES,
};
pub use parser::extract_entries;
pub use prober::{ProbeOutcome, Prober};
pub use scheduler::{DelayWindow, Pacer};

use crate::config::Config;
use crate::CheckerError;

/// Runs a complete crawl with the JSON file store
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load previously recorded sites
/// 2. Build the proxied HTTP client
/// 3. Check connectivity through the proxy
/// 4. Walk listing pages, probing every candidate
/// 5. Save the accessible sites
///
/// # Returns
///
/// * `Ok(RunReport)` - The run ended (finished or aborted)
/// * `Err(CheckerError)` - Setup or the final save failed
pub async fn crawl(config: Config) -> Result<RunReport, CheckerError> {
    Coordinator::new(config)?.run().await
}
