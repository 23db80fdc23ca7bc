//! HTML parser for directory listing pages
//!
//! Finds the listing container and turns the links inside it into onion
//! candidates. Parsing never fails: anything unusable yields fewer (or no)
//! entries and a log line.

use crate::storage::CandidateEntry;
use crate::url::normalize_onion_href;
use scraper::{Html, Selector};

/// Extracts onion candidates from a listing page
///
/// # Extraction Rules
///
/// - Only links inside the element whose id is `container_id` are read
/// - Only `<a>` elements with an `href` are considered
/// - The href must normalize to an onion host (see
///   [`normalize_onion_href`])
/// - The entry text is the link's visible text, trimmed
///
/// Entries keep listing order. Repeated addresses are kept; the prober
/// skips addresses that were already found reachable.
///
/// # Example
///
/// ```
/// use onion_checker::crawler::extract_entries;
///
/// let html = r#"<div id="link_list"><a href="abc.onion"> ABC </a></div>"#;
/// let entries = extract_entries(html, "link_list");
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].address, "abc.onion");
/// assert_eq!(entries[0].url, "http://abc.onion");
/// assert_eq!(entries[0].text, "ABC");
/// ```
pub fn extract_entries(html: &str, container_id: &str) -> Vec<CandidateEntry> {
    let document = Html::parse_document(html);

    let container_selector = match Selector::parse(&format!("[id=\"{}\"]", container_id)) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::warn!("Invalid container id '{}': {:?}", container_id, e);
            return Vec::new();
        }
    };

    let Some(container) = document.select(&container_selector).next() else {
        tracing::warn!("Could not find element with id='{}'", container_id);
        return Vec::new();
    };

    let Ok(link_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for element in container.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match normalize_onion_href(href) {
            Ok(link) => entries.push(CandidateEntry {
                address: link.address,
                url: link.url,
                text: element.text().collect::<String>().trim().to_string(),
            }),
            Err(e) => tracing::trace!("Skipping link {}: {}", href, e),
        }
    }

    entries
}
