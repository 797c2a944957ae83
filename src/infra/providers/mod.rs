//! Production provider clients.
//!
//! Thin `reqwest` wrappers mapping each external API's wire format onto the
//! domain types. All clients share one connection pool; timeouts live here,
//! not in the engine.

mod github;
mod twitter;
mod vimeo;
mod youtube;

use std::time::Duration;

pub use github::GitHubClient;
pub use twitter::TwitterClient;
pub use vimeo::VimeoClient;
pub use youtube::YouTubeClient;

use crate::enrichment::ProviderError;

/// Build the shared HTTP client used by every provider.
pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}

/// Map a response status onto the provider error taxonomy.
pub(crate) fn expect_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound);
    }
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }
    Ok(response)
}
