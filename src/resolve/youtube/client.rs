//! YouTube Data API HTTP client
//!
//! Search costs 100 quota units per call; the default daily quota allows
//! roughly 100 searches, so `quotaExceeded` is an expected condition.

use std::time::Duration;

use reqwest::StatusCode;

use super::{adapter, dto};
use crate::model::{MediaCandidates, Track};
use crate::resolve::ResolutionFailure;

/// Number of candidates requested per search
const MAX_RESULTS: &str = "5";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// YouTube search client
pub struct YouTubeClient {
    api_key: String,
    http_client: reqwest::Client,
    base_url: String,
}

impl YouTubeClient {
    /// Create a new client with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            api_key: api_key.into(),
            http_client,
            base_url: "https://www.googleapis.com/youtube/v3/search".to_string(),
        }
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Search embeddable videos for a track
    pub async fn search(&self, track: &Track) -> Result<MediaCandidates, ResolutionFailure> {
        let response = self.send_search_request(&adapter::search_query(track)).await?;
        adapter::to_candidates(response)
    }

    /// Send the HTTP request and parse the response
    async fn send_search_request(
        &self,
        query: &str,
    ) -> Result<dto::SearchResponse, ResolutionFailure> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("videoEmbeddable", "true"),
                ("maxResults", MAX_RESULTS),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ResolutionFailure::ProviderError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        response
            .json::<dto::SearchResponse>()
            .await
            .map_err(|e| ResolutionFailure::ProviderError(e.to_string()))
    }
}

/// Map a non-success status and its body to a failure.
///
/// YouTube reports both bad keys and exhausted quota as 403; only the first
/// error's `reason` tells them apart.
fn classify_error(status: StatusCode, body: &str) -> ResolutionFailure {
    let reason = serde_json::from_str::<dto::ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error.errors.into_iter().next())
        .and_then(|d| d.reason);

    match status {
        StatusCode::FORBIDDEN if reason.as_deref() == Some("quotaExceeded") => {
            ResolutionFailure::QuotaExceeded
        }
        StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN => ResolutionFailure::InvalidCredential,
        _ => ResolutionFailure::ProviderError(format!("YouTube API error {}", status.as_u16())),
    }
}
