//! Hosting page context

use crate::error::{HubError, HubResult};
use reqwest::Url;

/// Read the transaction identifier from the page URL's query string.
///
/// # Errors
/// [`HubError::MissingParameter`] when the parameter is absent or empty,
/// [`HubError::Config`] when `page_url` is not a URL.
pub fn identifier_from_page_url(page_url: &str, param: &str) -> HubResult<String> {
    let url = Url::parse(page_url)
        .map_err(|e| HubError::Config(format!("invalid page URL {page_url:?}: {e}")))?;
    url.query_pairs()
        .find(|(name, _)| name == param)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| HubError::MissingParameter {
            name: param.to_string(),
        })
}
