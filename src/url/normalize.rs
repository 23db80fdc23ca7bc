use crate::url::domain::{extract_domain, is_onion_host, ONION_SUFFIX};
use crate::{UrlError, UrlResult};
use url::Url;

/// Scheme prefixed to links that are written without one
const DEFAULT_SCHEME: &str = "http://";

/// A listed link that passed onion normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLink {
    /// Lowercased onion host
    pub address: String,

    /// The link as it will be requested
    pub url: String,
}

/// Normalizes a directory link into an onion candidate
///
/// # Normalization Steps
///
/// 1. Keep the link only if it ends with `.onion` or contains `.onion/`
/// 2. If it carries no `http://`/`https://` scheme, strip leading slashes
///    and prefix `http://`
/// 3. Parse the result and take its host
/// 4. Keep the link only if the network location is an onion host
///    (an explicit port disqualifies it)
///
/// The returned `url` is the normalized text itself, not the re-serialized
/// parse, so `abc.onion` maps to `http://abc.onion` without a trailing slash.
///
/// # Examples
///
/// ```
/// use onion_checker::url::normalize_onion_href;
///
/// let link = normalize_onion_href("abc.onion").unwrap();
/// assert_eq!(link.address, "abc.onion");
/// assert_eq!(link.url, "http://abc.onion");
///
/// assert!(normalize_onion_href("notonion.com").is_err());
/// ```
pub fn normalize_onion_href(href: &str) -> UrlResult<NormalizedLink> {
    let href = href.trim();

    let onion_path = format!("{}/", ONION_SUFFIX);
    if !href.ends_with(ONION_SUFFIX) && !href.contains(&onion_path) {
        return Err(UrlError::NotOnion(href.to_string()));
    }

    let normalized = if has_http_scheme(href) {
        href.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, href.trim_start_matches('/'))
    };

    let parsed = Url::parse(&normalized).map_err(|e| UrlError::Parse(e.to_string()))?;
    let address = extract_domain(&parsed).ok_or(UrlError::MissingDomain)?;

    if parsed.port().is_some() || !is_onion_host(&address) {
        return Err(UrlError::NonOnionHost(address));
    }

    Ok(NormalizedLink {
        address,
        url: normalized,
    })
}

fn has_http_scheme(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
