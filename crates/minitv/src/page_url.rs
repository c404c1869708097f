//! Recognize miniTV page URLs and pull out the page identifier.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{ExtractError, ExtractResult, PageId};

/// Pattern for supported page URLs. Repeated slashes before the id are
/// tolerated since the provider itself serves them.
pub const VALID_URL: &str = r"^https?://(?:www\.)?amazon\.in/minitv/tp/+(?P<id>[a-z0-9-]+)";

fn valid_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VALID_URL).expect("page url regex is valid"))
}

/// Whether `url` points at a page this extractor handles.
pub fn is_suitable(url: &str) -> bool {
    valid_url_re().is_match(url)
}

/// Extract the page identifier from a supported URL.
pub fn page_id(url: &str) -> ExtractResult<PageId> {
    valid_url_re()
        .captures(url)
        .and_then(|caps| caps.name("id"))
        .map(|m| PageId(m.as_str().to_string()))
        .ok_or_else(|| ExtractError::UnsupportedUrl(url.to_string()))
}
