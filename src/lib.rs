//! onion-checker: a reachability sweep over a paginated onion directory
//!
//! This crate walks the pages of an onion link directory through a Tor SOCKS
//! proxy, extracts the listed `.onion` addresses, probes each one, and keeps
//! a JSON document of the sites that answered.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for onion-checker operations
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Tor connectivity check failed: {0}")]
    ConnectivityFailed(String),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Page counter overflowed after page {0}")]
    PageOverflow(u128),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Reasons a listed link is rejected as an onion candidate
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Not an onion link: {0}")]
    NotOnion(String),

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL")]
    MissingDomain,

    #[error("Host is not an onion address: {0}")]
    NonOnionHost(String),
}

/// Result type alias for onion-checker operations
pub type Result<T> = std::result::Result<T, CheckerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::CrawlPhase;
pub use storage::{AccessibleSiteSet, CandidateEntry, ProbedEntry, SiteStatus};
pub use url::{is_onion_host, normalize_onion_href};
