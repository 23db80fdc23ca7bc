//! URL handling for onion links
//!
//! Normalizes the links found in directory listings and decides whether
//! they point at onion hosts.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_onion_host, ONION_SUFFIX};
pub use normalize::{normalize_onion_href, NormalizedLink};
