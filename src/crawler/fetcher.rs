//! HTTP fetcher implementation
//!
//! This module handles all outbound HTTP for the checker, including:
//! - Building the proxied HTTP client with browser-like headers
//! - Retrying idempotent requests on transient statuses
//! - Fetching directory listing pages
//! - The connectivity check run before crawling

use crate::config::{Config, DirectoryConfig, ProbeConfig, RetryConfig};
use crate::CheckerError;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, DNT, UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{redirect::Policy, Client, Method, Proxy, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Statuses that are retried by default
pub const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Builds the HTTP client used for a whole run
///
/// Every request goes through the configured proxy. With the default
/// `socks5h` scheme, hostnames (including `.onion` names) are resolved by
/// the proxy rather than locally.
///
/// # Example
///
/// ```no_run
/// use onion_checker::config::Config;
/// use onion_checker::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(config.http.user_agent.as_str())
        .default_headers(headers)
        .proxy(Proxy::all(config.proxy.url())?)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// When and how often a request is retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Pause before the first retry; doubled for every further retry
    pub initial_backoff: Duration,

    /// Response statuses that trigger a retry
    pub retry_statuses: Vec<StatusCode>,
}

impl RetryPolicy {
    /// Returns true for methods that are safe to send more than once
    pub fn allows_method(&self, method: &Method) -> bool {
        matches!(
            *method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE | Method::TRACE
        )
    }

    pub fn retries_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Backoff to wait after the given (1-based) failed attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            retry_statuses: RETRY_STATUSES.to_vec(),
        }
    }
}

/// An HTTP client that retries transient failures
///
/// Only idempotent methods are retried, and only when the response status
/// is one of the policy's retry statuses. Transport errors are returned
/// immediately. Once the attempts are used up the last response is
/// returned as-is.
#[derive(Debug, Clone)]
pub struct RetryingClient {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds the proxied client and retry policy from configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            RetryPolicy::from(&config.retry),
        ))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn get(&self, url: &str, timeout: Duration) -> Result<Response, reqwest::Error> {
        self.execute(Method::GET, url, timeout).await
    }

    /// Sends a request, retrying according to the policy
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
    ) -> Result<Response, reqwest::Error> {
        let retryable = self.policy.allows_method(&method);
        let mut attempt = 1;

        loop {
            let response = self
                .client
                .request(method.clone(), url)
                .timeout(timeout)
                .send()
                .await?;

            let status = response.status();
            if !retryable || attempt >= self.policy.max_attempts || !self.policy.retries_status(status)
            {
                return Ok(response);
            }

            let backoff = self.policy.backoff_for(attempt);
            tracing::debug!(
                "{} {} returned HTTP {} (attempt {}/{}), retrying in {:?}",
                method,
                url,
                status.as_u16(),
                attempt,
                self.policy.max_attempts,
                backoff
            );
            drop(response);
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// Result of fetching one listing page
#[derive(Debug)]
pub enum ListingFetch {
    /// The page was served
    Page {
        /// Requested listing URL
        url: String,
        /// Page markup
        body: String,
    },

    /// The directory answered with a status other than 200
    HttpError { status_code: u16 },

    /// The request did not complete (timeout, proxy failure, bad URL, ...)
    NetworkError { error: String },
}

impl ListingFetch {
    /// Returns the markup if the page was served
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Page { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Builds the URL of a listing page by appending the page parameter
///
/// ```
/// use onion_checker::config::DirectoryConfig;
/// use onion_checker::crawler::listing_url;
///
/// let directory = DirectoryConfig {
///     base_url: "http://listing.onion/".to_string(),
///     ..DirectoryConfig::default()
/// };
/// let url = listing_url(&directory, 42).unwrap();
/// assert_eq!(url.as_str(), "http://listing.onion/?page=42");
/// ```
pub fn listing_url(directory: &DirectoryConfig, page: u128) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&directory.base_url)?;
    url.query_pairs_mut()
        .append_pair(&directory.page_param, &page.to_string());
    Ok(url)
}

/// Fetches one directory listing page
///
/// Failures are logged here and reported as values; the caller skips the
/// page either way.
pub async fn fetch_listing_page(
    client: &RetryingClient,
    directory: &DirectoryConfig,
    page: u128,
) -> ListingFetch {
    let url = match listing_url(directory, page) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Invalid listing URL for page {}: {}", page, e);
            return ListingFetch::NetworkError {
                error: e.to_string(),
            };
        }
    };

    tracing::info!("Fetching listing page: {}", page);

    let response = match client.get(url.as_str(), directory.timeout()).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Error fetching page {}: {}", page, e);
            return ListingFetch::NetworkError {
                error: e.to_string(),
            };
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        tracing::warn!(
            "Failed to fetch page {}: HTTP {}",
            page,
            status.as_u16()
        );
        return ListingFetch::HttpError {
            status_code: status.as_u16(),
        };
    }

    match response.text().await {
        Ok(body) => ListingFetch::Page {
            url: url.to_string(),
            body,
        },
        Err(e) => {
            tracing::error!("Error reading page {}: {}", page, e);
            ListingFetch::NetworkError {
                error: e.to_string(),
            }
        }
    }
}

/// Verifies that requests get through the proxy
///
/// Requests the IP-echo endpoint once. Returns the exit address reported in
/// the `origin` field, if the endpoint supplied one.
pub async fn check_connectivity(
    client: &RetryingClient,
    probe: &ProbeConfig,
) -> Result<Option<String>, CheckerError> {
    let url = probe.connectivity_url.as_str();

    let response = client
        .get(url, probe.connectivity_timeout())
        .await
        .map_err(|source| CheckerError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(CheckerError::ConnectivityFailed(format!(
            "{} returned HTTP {}",
            url,
            status.as_u16()
        )));
    }

    let body = response.text().await.map_err(|source| CheckerError::Http {
        url: url.to_string(),
        source,
    })?;

    let origin = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("origin")?.as_str().map(str::to_string));

    Ok(origin)
}
