//! Shared HTTP client construction for the out-of-band services.

use std::time::Duration;

use crate::version::user_agent;

/// Client with the crate's User-Agent and the given overall request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Ok(value) = reqwest::header::HeaderValue::from_str(&user_agent()) {
        headers.insert(reqwest::header::USER_AGENT, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
}

/// Trim a trailing slash so paths can be appended with `format!`.
pub fn base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
