//! Crawl statistics
//!
//! Counters kept while a run is in progress, and a summary computed from a
//! stored accessible-site set.

use crate::crawler::ProbeOutcome;
use crate::storage::AccessibleSiteSet;
use chrono::{DateTime, Utc};
use std::fmt;

/// Counters for a single crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Listing pages requested, including failed ones
    pub pages_checked: u64,

    /// Listing pages that could not be fetched
    pub pages_failed: u64,

    /// Candidates extracted from listing pages
    pub sites_found: u64,

    /// Candidates skipped because they were already recorded
    pub sites_known: u64,

    /// Candidates that answered with HTTP 200
    pub sites_accessible: u64,

    /// Candidates that were probed and did not answer with HTTP 200
    pub sites_unreachable: u64,

    /// Saves that failed during the run
    pub saves_failed: u64,
}

impl CrawlStatistics {
    /// Counts one probe outcome
    pub fn record_probe(&mut self, outcome: &ProbeOutcome) {
        match outcome {
            ProbeOutcome::Reachable(_) => self.sites_accessible += 1,
            ProbeOutcome::AlreadyKnown => self.sites_known += 1,
            _ => self.sites_unreachable += 1,
        }
    }

    /// Candidates for which a request was actually sent
    pub fn sites_probed(&self) -> u64 {
        self.sites_accessible + self.sites_unreachable
    }
}

impl fmt::Display for CrawlStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages ({} failed), {} sites found, {} accessible, {} unreachable, {} already known",
            self.pages_checked,
            self.pages_failed,
            self.sites_found,
            self.sites_accessible,
            self.sites_unreachable,
            self.sites_known
        )
    }
}

/// Summary of a stored accessible-site set
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub total_sites: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub mean_response_secs: Option<f64>,
    /// Address and response time of the fastest site
    pub fastest: Option<(String, f64)>,
    /// Address and response time of the slowest site
    pub slowest: Option<(String, f64)>,
}

/// Computes a summary of the given set
pub fn summarize(set: &AccessibleSiteSet) -> SiteSummary {
    let entries = set.entries();

    let mean_response_secs = if entries.is_empty() {
        None
    } else {
        let total: f64 = entries.iter().map(|e| e.response_time_secs).sum();
        Some(total / entries.len() as f64)
    };

    let by_time = |a: &&crate::storage::ProbedEntry, b: &&crate::storage::ProbedEntry| {
        a.response_time_secs.total_cmp(&b.response_time_secs)
    };

    let fastest = entries
        .iter()
        .min_by(by_time)
        .map(|e| (e.address().to_string(), e.response_time_secs));
    let slowest = entries
        .iter()
        .max_by(by_time)
        .map(|e| (e.address().to_string(), e.response_time_secs));

    SiteSummary {
        total_sites: entries.len(),
        last_updated: set.last_updated(),
        mean_response_secs,
        fastest,
        slowest,
    }
}

/// Prints a site summary to stdout in a formatted manner
pub fn print_summary(summary: &SiteSummary) {
    println!("=== Accessible Onion Sites ===\n");

    println!("  Total accessible sites: {}", summary.total_sites);
    match summary.last_updated {
        Some(ts) => println!("  Last updated: {}", ts.to_rfc3339()),
        None => println!("  Last updated: unknown"),
    }

    if let Some(mean) = summary.mean_response_secs {
        println!("  Mean response time: {:.2}s", mean);
    }
    if let Some((address, secs)) = &summary.fastest {
        println!("  Fastest: {} ({:.2}s)", address, secs);
    }
    if let Some((address, secs)) = &summary.slowest {
        println!("  Slowest: {} ({:.2}s)", address, secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CandidateEntry, ProbedEntry};

    fn probed(address: &str, secs: f64) -> ProbedEntry {
        ProbedEntry::reachable(
            CandidateEntry {
                address: address.to_string(),
                url: format!("http://{}", address),
                text: String::new(),
            },
            secs,
        )
    }

    #[test]
    fn test_record_probe() {
        let mut stats = CrawlStatistics::default();
        stats.record_probe(&ProbeOutcome::Reachable(probed("a.onion", 1.0)));
        stats.record_probe(&ProbeOutcome::AlreadyKnown);
        stats.record_probe(&ProbeOutcome::TimedOut);
        stats.record_probe(&ProbeOutcome::Unreachable { status_code: 500 });

        assert_eq!(stats.sites_accessible, 1);
        assert_eq!(stats.sites_known, 1);
        assert_eq!(stats.sites_unreachable, 2);
        assert_eq!(stats.sites_probed(), 3);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&AccessibleSiteSet::new());
        assert_eq!(summary.total_sites, 0);
        assert_eq!(summary.mean_response_secs, None);
        assert_eq!(summary.fastest, None);
    }

    #[test]
    fn test_summarize_response_times() {
        let set = AccessibleSiteSet::from_entries(
            vec![probed("a.onion", 1.0), probed("b.onion", 4.0), probed("c.onion", 2.5)],
            None,
        );
        let summary = summarize(&set);

        assert_eq!(summary.total_sites, 3);
        assert_eq!(summary.mean_response_secs, Some(2.5));
        assert_eq!(summary.fastest, Some(("a.onion".to_string(), 1.0)));
        assert_eq!(summary.slowest, Some(("b.onion".to_string(), 4.0)));
    }

    #[test]
    fn test_display() {
        let stats = CrawlStatistics {
            pages_checked: 2,
            pages_failed: 1,
            sites_found: 5,
            sites_accessible: 3,
            ..CrawlStatistics::default()
        };
        let line = stats.to_string();
        assert!(line.starts_with("2 pages (1 failed), 5 sites found, 3 accessible"));
    }
}
