//! Configuration module for onion-checker
//!
//! Settings come from built-in defaults, an optional TOML file, and
//! command-line overrides, in that order. Validation runs last.
//!
//! # Example
//!
//! ```no_run
//! use onion_checker::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("checker.toml")).unwrap();
//! println!("Proxy: {}", config.proxy.url());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, DirectoryConfig, HttpConfig, OutputConfig, ProbeConfig, ProxyConfig,
    RetryConfig, DEFAULT_CONNECTIVITY_URL, DEFAULT_DIRECTORY_URL, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_unvalidated_config_with_hash,
    parse_config,
};
pub use validation::validate;
