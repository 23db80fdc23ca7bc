use crate::config::types::{
    Config, CrawlConfig, DirectoryConfig, OutputConfig, ProbeConfig, ProxyConfig, RetryConfig,
};
use crate::ConfigError;
use url::Url;

const PROXY_SCHEMES: [&str; 4] = ["socks5", "socks5h", "http", "https"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_proxy_config(&config.proxy)?;
    validate_directory_config(&config.directory)?;
    validate_probe_config(&config.probe)?;
    validate_retry_config(&config.retry)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if !PROXY_SCHEMES.contains(&config.scheme.as_str()) {
        return Err(ConfigError::Validation(format!(
            "proxy scheme must be one of {:?}, got '{}'",
            PROXY_SCHEMES, config.scheme
        )));
    }

    if config.host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "proxy host cannot be empty".to_string(),
        ));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation(
            "proxy port must be non-zero".to_string(),
        ));
    }

    Ok(())
}

/// Validates the directory being crawled
fn validate_directory_config(config: &DirectoryConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    if config.page_param.is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    if config.container_id.is_empty() {
        return Err(ConfigError::Validation(
            "container_id cannot be empty".to_string(),
        ));
    }

    validate_timeout("directory timeout_secs", config.timeout_secs)
}

/// Validates probe configuration
fn validate_probe_config(config: &ProbeConfig) -> Result<(), ConfigError> {
    validate_http_url("connectivity_url", &config.connectivity_url)?;
    validate_timeout("probe timeout_secs", config.timeout_secs)?;
    validate_timeout(
        "connectivity_timeout_secs",
        config.connectivity_timeout_secs,
    )
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates crawl bounds and delay windows
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    validate_delay_window("delay", config.min_delay_secs, config.max_delay_secs)?;
    validate_delay_window(
        "page delay",
        config.min_page_delay_secs,
        config.max_page_delay_secs,
    )
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.sites_path.is_empty() {
        return Err(ConfigError::Validation(
            "sites_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

fn validate_timeout(field: &str, secs: u64) -> Result<(), ConfigError> {
    if secs < 1 {
        return Err(ConfigError::Validation(format!(
            "{} must be >= 1 second, got {}",
            field, secs
        )));
    }
    Ok(())
}

fn validate_delay_window(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} bounds must be finite and non-negative, got {}..{}",
            name, min, max
        )));
    }

    if min > max {
        return Err(ConfigError::Validation(format!(
            "minimum {} ({}) exceeds maximum {} ({})",
            name, min, name, max
        )));
    }

    Ok(())
}
