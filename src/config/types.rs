use serde::{de, Deserialize, Deserializer};
use std::time::Duration;

/// Default onion directory walked by the checker
pub const DEFAULT_DIRECTORY_URL: &str =
    "http://jptvwdeyknkv6oiwjtr2kxzehfnmcujl7rf7vytaikmwlvze773uiyyd.onion/";

/// Default IP-echo endpoint used for the connectivity check
pub const DEFAULT_CONNECTIVITY_URL: &str = "http://httpbin.org/ip";

/// Browser user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for onion-checker
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub proxy: ProxyConfig,
    pub directory: DirectoryConfig,
    pub probe: ProbeConfig,
    pub retry: RetryConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
    pub http: HttpConfig,
}

/// Proxy the client routes every request through
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProxyConfig {
    /// Proxy scheme; `socks5h` resolves hostnames on the proxy side
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ProxyConfig {
    /// Returns the proxy URL, e.g. `socks5h://127.0.0.1:9050`
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            scheme: "socks5h".to_string(),
            host: "127.0.0.1".to_string(),
            port: 9050,
        }
    }
}

/// The paginated listing being crawled
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DirectoryConfig {
    /// Listing address; the page parameter is appended to its query
    pub base_url: String,

    /// Name of the page query parameter
    pub page_param: String,

    /// Id of the element holding the listed links
    pub container_id: String,

    /// Timeout for a listing page request (seconds)
    pub timeout_secs: u64,
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DIRECTORY_URL.to_string(),
            page_param: "page".to_string(),
            container_id: "link_list".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Reachability probing and the connectivity precondition
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProbeConfig {
    /// Timeout for a single site probe (seconds)
    pub timeout_secs: u64,

    /// IP-echo endpoint requested once before crawling
    pub connectivity_url: String,

    /// Timeout for the connectivity check (seconds)
    pub connectivity_timeout_secs: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_secs(self.connectivity_timeout_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connectivity_url: DEFAULT_CONNECTIVITY_URL.to_string(),
            connectivity_timeout_secs: 30,
        }
    }
}

/// Retry policy applied to idempotent requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Backoff before the first retry; doubles on each further retry (milliseconds)
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
        }
    }
}

/// Crawl bounds and pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// First listing page requested
    ///
    /// TOML integers stop at `i64::MAX`, so larger pages are written as a
    /// decimal string.
    #[serde(deserialize_with = "deserialize_page_number")]
    pub start_page: u128,

    /// Number of listing pages to walk
    pub max_pages: u32,

    /// Lower bound of the pause after each probe (seconds)
    pub min_delay_secs: f64,

    /// Upper bound of the pause after each probe (seconds)
    pub max_delay_secs: f64,

    /// Lower bound of the pause between listing pages (seconds)
    pub min_page_delay_secs: f64,

    /// Upper bound of the pause between listing pages (seconds)
    pub max_page_delay_secs: f64,
}

/// Reads a page number from a TOML integer or a decimal string
fn deserialize_page_number<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PageNumber {
        Integer(u64),
        Text(String),
    }

    match PageNumber::deserialize(deserializer)? {
        PageNumber::Integer(page) => Ok(u128::from(page)),
        PageNumber::Text(text) => text.trim().parse::<u128>().map_err(|e| {
            de::Error::custom(format!("invalid page number '{}': {}", text, e))
        }),
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_page: 1,
            max_pages: 10,
            min_delay_secs: 5.0,
            max_delay_secs: 15.0,
            min_page_delay_secs: 15.0,
            max_page_delay_secs: 30.0,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// JSON document holding the accessible sites
    pub sites_path: String,

    /// Log file written alongside stdout
    pub log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sites_path: "accessible_onion_sites.json".to_string(),
            log_path: "onion_checker.log".to_string(),
        }
    }
}

/// Request headers
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
