//! Reachability prober
//!
//! Requests each candidate once through the proxy and classifies the
//! outcome. Probe failures are values, never errors: one dead site must not
//! stop the crawl.

use crate::crawler::fetcher::RetryingClient;
use crate::storage::{CandidateEntry, ProbedEntry};
use reqwest::StatusCode;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Result of probing one candidate
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The site answered with HTTP 200
    Reachable(ProbedEntry),

    /// The address was already recorded; no request was made
    AlreadyKnown,

    /// The site answered with another status
    Unreachable { status_code: u16 },

    /// The request timed out
    TimedOut,

    /// The proxy could not open a connection to the site
    ConnectionFailed,

    /// Any other transport failure
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable(_))
    }

    pub fn into_entry(self) -> Option<ProbedEntry> {
        match self {
            Self::Reachable(entry) => Some(entry),
            _ => None,
        }
    }
}

/// Probes candidates for reachability
pub struct Prober<'a> {
    client: &'a RetryingClient,
    timeout: Duration,
}

impl<'a> Prober<'a> {
    pub fn new(client: &'a RetryingClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Probes `entry` unless its address is in `known`
    ///
    /// Returns the probed entry when the site answered with HTTP 200.
    pub async fn probe(
        &self,
        entry: &CandidateEntry,
        known: &HashSet<String>,
    ) -> Option<ProbedEntry> {
        self.check(entry, known).await.into_entry()
    }

    /// Probes `entry` and reports exactly what happened
    pub async fn check(&self, entry: &CandidateEntry, known: &HashSet<String>) -> ProbeOutcome {
        let domain = entry.address.as_str();

        if known.contains(domain) {
            tracing::debug!("Already tested {}, skipping", domain);
            return ProbeOutcome::AlreadyKnown;
        }

        tracing::info!("Testing accessibility: {}", domain);

        let started = Instant::now();
        let result = self.client.get(&entry.url, self.timeout).await;
        let elapsed = started.elapsed();

        match result {
            Ok(response) if response.status() == StatusCode::OK => {
                tracing::info!("✓ {} is accessible ({:.2}s)", domain, elapsed.as_secs_f64());
                ProbeOutcome::Reachable(ProbedEntry::reachable(
                    entry.clone(),
                    elapsed.as_secs_f64(),
                ))
            }
            Ok(response) => {
                let status_code = response.status().as_u16();
                tracing::warn!("✗ {} returned HTTP {}", domain, status_code);
                ProbeOutcome::Unreachable { status_code }
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!("✗ {} timed out", domain);
                ProbeOutcome::TimedOut
            }
            Err(e) if e.is_connect() => {
                tracing::warn!("✗ {} connection failed", domain);
                ProbeOutcome::ConnectionFailed
            }
            Err(e) => {
                tracing::warn!("✗ {} error: {}", domain, e);
                ProbeOutcome::Failed(e.to_string())
            }
        }
    }
}
