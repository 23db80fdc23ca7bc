use url::Url;

/// Host suffix of the anonymizing network's addresses
pub const ONION_SUFFIX: &str = ".onion";

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use onion_checker::url::extract_domain;
///
/// let url = Url::parse("http://ABC.onion/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("abc.onion".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if the host belongs to the onion network
pub fn is_onion_host(host: &str) -> bool {
    host.len() > ONION_SUFFIX.len() && host.to_ascii_lowercase().ends_with(ONION_SUFFIX)
}
