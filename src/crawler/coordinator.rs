//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the other pieces together:
//! - The connectivity check that gates the whole run
//! - Walking listing pages and extracting candidates
//! - Probing candidates and recording the reachable ones
//! - Pacing between probes and pages
//! - The final save, on every exit path

use crate::config::Config;
use crate::crawler::fetcher::{check_connectivity, fetch_listing_page, RetryingClient};
use crate::crawler::parser::extract_entries;
use crate::crawler::prober::Prober;
use crate::crawler::scheduler::Pacer;
use crate::output::CrawlStatistics;
use crate::state::CrawlPhase;
use crate::storage::{load_or_empty, AccessibleSiteSet, CandidateEntry, JsonFileStore, SiteStore};
use crate::CheckerError;
use std::future::Future;

/// What a finished run did
#[derive(Debug, Clone)]
pub struct RunReport {
    /// `Finished`, or `Aborted` if the connectivity check failed
    pub phase: CrawlPhase,

    /// Counters collected during the run
    pub stats: CrawlStatistics,

    /// Size of the accessible set at the end of the run
    pub total_accessible: usize,

    /// True if the run was stopped by the shutdown signal
    pub interrupted: bool,
}

/// Main crawler coordinator structure
///
/// Owns everything a run needs: configuration, the HTTP client, the pacer,
/// the store, and the in-memory accessible set. Running consumes the
/// coordinator, so the client is released when the run ends.
pub struct Coordinator<S: SiteStore = JsonFileStore> {
    config: Config,
    client: RetryingClient,
    pacer: Pacer,
    store: S,
    sites: AccessibleSiteSet,
    phase: CrawlPhase,
    stats: CrawlStatistics,
}

impl Coordinator<JsonFileStore> {
    /// Creates a coordinator persisting to the configured JSON file
    pub fn new(config: Config) -> Result<Self, CheckerError> {
        let store = JsonFileStore::new(&config.output.sites_path);
        Self::with_store(config, store)
    }
}

impl<S: SiteStore> Coordinator<S> {
    /// Creates a coordinator with an explicit store
    ///
    /// Previously recorded sites are loaded from the store; a store that
    /// cannot be read starts the run with an empty set.
    pub fn with_store(config: Config, store: S) -> Result<Self, CheckerError> {
        let client = RetryingClient::from_config(&config)?;
        let pacer = Pacer::from_config(&config.crawl);
        let sites = load_or_empty(&store);

        Ok(Self {
            config,
            client,
            pacer,
            store,
            sites,
            phase: CrawlPhase::Idle,
            stats: CrawlStatistics::default(),
        })
    }

    /// Replaces the pacer built from configuration
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn sites(&self) -> &AccessibleSiteSet {
        &self.sites
    }

    pub fn stats(&self) -> &CrawlStatistics {
        &self.stats
    }

    /// Runs the crawl until it completes or Ctrl-C is pressed
    pub async fn run(self) -> Result<RunReport, CheckerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs the crawl until it completes or `shutdown` resolves
    ///
    /// Completion, shutdown, and an error escaping the crawl loop all end
    /// in the same final save. Only a failure of that final save is
    /// returned as an error.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<RunReport, CheckerError>
    where
        F: Future,
    {
        self.transition(CrawlPhase::ConnectivityCheck)?;

        if !self.connectivity_ok().await {
            tracing::error!("Cannot proceed without Tor connection");
            self.transition(CrawlPhase::Aborted)?;
            return Ok(self.report(false));
        }
        self.transition(CrawlPhase::Running)?;

        tracing::info!(
            "Starting onion site checker from page {}",
            self.config.crawl.start_page
        );
        tracing::info!("Will check up to {} pages", self.config.crawl.max_pages);

        let mut interrupted = false;
        tokio::select! {
            result = self.crawl_pages() => {
                if let Err(e) = result {
                    tracing::error!("Unexpected error: {}", e);
                }
            }
            _ = shutdown => {
                tracing::info!("Checker interrupted by user");
                interrupted = true;
            }
        }

        self.finish(interrupted)
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), CheckerError> {
        if !self.phase.can_transition_to(next) {
            return Err(CheckerError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase: {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    async fn connectivity_ok(&self) -> bool {
        match check_connectivity(&self.client, &self.config.probe).await {
            Ok(origin) => {
                tracing::info!(
                    "Tor connection successful. Current IP: {}",
                    origin.as_deref().unwrap_or("Unknown")
                );
                true
            }
            Err(e) => {
                tracing::error!("Tor connection test failed: {}", e);
                tracing::error!(
                    "Make sure Tor is running and reachable at {}",
                    self.config.proxy.url()
                );
                false
            }
        }
    }

    /// Walks the listing pages
    ///
    /// A page that cannot be fetched still counts toward the page bound and
    /// is followed immediately by the next page, without a pause.
    async fn crawl_pages(&mut self) -> Result<(), CheckerError> {
        let start_page = self.config.crawl.start_page;
        let max_pages = self.config.crawl.max_pages;

        for offset in 0..max_pages {
            let page = start_page
                .checked_add(u128::from(offset))
                .ok_or(CheckerError::PageOverflow(start_page))?;
            let is_last = offset + 1 == max_pages;

            self.stats.pages_checked += 1;

            let fetched = fetch_listing_page(&self.client, &self.config.directory, page).await;
            let Some(markup) = fetched.into_body() else {
                self.stats.pages_failed += 1;
                tracing::warn!("Failed to fetch page {}, trying next page", page);
                continue;
            };

            let entries = extract_entries(&markup, &self.config.directory.container_id);
            self.stats.sites_found += entries.len() as u64;

            if entries.is_empty() {
                tracing::warn!("No onion sites found on page {}", page);
            } else {
                tracing::info!("Found {} onion sites on page {}", entries.len(), page);
            }

            for entry in &entries {
                self.process_entry(entry).await;
                self.pacer.pause_after_entry().await;
            }

            tracing::info!(
                "Progress: {}/{} pages, {} sites found, {} accessible",
                offset + 1,
                max_pages,
                self.stats.sites_found,
                self.stats.sites_accessible
            );

            if !is_last {
                self.pacer.pause_between_pages().await;
            }
        }

        Ok(())
    }

    /// Probes one candidate and records it if it answered
    async fn process_entry(&mut self, entry: &CandidateEntry) {
        let prober = Prober::new(&self.client, self.config.probe.timeout());
        let outcome = prober.check(entry, self.sites.known_addresses()).await;
        self.stats.record_probe(&outcome);

        if let Some(probed) = outcome.into_entry() {
            if self.sites.insert(probed) {
                self.persist();
            }
        }
    }

    /// Saves the set; a failure is logged and retried by the next save
    fn persist(&mut self) {
        if let Err(e) = self.store.save(&mut self.sites) {
            self.stats.saves_failed += 1;
            tracing::error!("Error saving sites: {}", e);
        }
    }

    fn finish(mut self, interrupted: bool) -> Result<RunReport, CheckerError> {
        self.transition(CrawlPhase::Finished)?;

        self.store.save(&mut self.sites)?;
        tracing::info!(
            "Checker finished. Total accessible sites: {}",
            self.sites.len()
        );
        tracing::info!("Run statistics: {}", self.stats);

        Ok(self.report(interrupted))
    }

    fn report(&self, interrupted: bool) -> RunReport {
        RunReport {
            phase: self.phase,
            stats: self.stats.clone(),
            total_accessible: self.sites.len(),
            interrupted,
        }
    }
}
