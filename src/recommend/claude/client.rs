//! Anthropic Messages HTTP client
//!
//! Handles communication with `POST /v1/messages`.
//! Authentication is the `x-api-key` header; `anthropic-version` is required.

use std::time::Duration;

use reqwest::StatusCode;

use super::{adapter, dto};
use crate::model::Track;
use crate::recommend::RecommendationFailure;

const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Claude recommendation client
pub struct ClaudeClient {
    api_key: String,
    http_client: reqwest::Client,
    base_url: String,
}

impl ClaudeClient {
    /// Create a new client with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http_client: build_http_client(),
            base_url: "https://api.anthropic.com/v1/messages".to_string(),
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

    /// Ask for the next track for `mood`, given what has been played.
    pub async fn next_track(
        &self,
        mood: &str,
        history: &[Track],
    ) -> Result<Track, RecommendationFailure> {
        let response = self
            .send_messages_request(&adapter::build_request(mood, history))
            .await?;
        adapter::to_track(response)
    }

    /// Send the HTTP request and parse the response
    async fn send_messages_request(
        &self,
        body: &dto::MessagesRequest,
    ) -> Result<dto::MessagesResponse, RecommendationFailure> {
        let response = self
            .http_client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| RecommendationFailure::ProviderError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        response
            .json::<dto::MessagesResponse>()
            .await
            .map_err(|e| RecommendationFailure::ProviderError(e.to_string()))
    }
}

fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .gzip(true)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Map a non-success status and its body to a failure.
fn classify_error(status: StatusCode, body: &str) -> RecommendationFailure {
    if status == StatusCode::UNAUTHORIZED {
        return RecommendationFailure::InvalidCredential;
    }

    match serde_json::from_str::<dto::ErrorResponse>(body) {
        Ok(err) => RecommendationFailure::ProviderError(err.error.message),
        Err(_) => RecommendationFailure::ProviderError(format!(
            "Claude API error {}",
            status.as_u16()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ClaudeClient::new("sk-test");
        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url, "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_client_with_custom_url() {
        let client = ClaudeClient::with_base_url("key", "http://localhost:8080");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_unauthorized_is_invalid_credential() {
        assert_eq!(
            classify_error(StatusCode::UNAUTHORIZED, "{}"),
            RecommendationFailure::InvalidCredential
        );
    }

    #[test]
    fn test_api_message_is_surfaced() {
        let body = r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        assert_eq!(
            classify_error(StatusCode::from_u16(529).unwrap(), body),
            RecommendationFailure::ProviderError("Overloaded".to_string())
        );
    }

    #[test]
    fn test_unreadable_error_body() {
        assert_eq!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>"),
            RecommendationFailure::ProviderError("Claude API error 500".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_provider_error() {
        let client = ClaudeClient::with_base_url("key", "http://127.0.0.1:9");
        let result = client.next_track("calm", &[]).await;
        assert!(matches!(result, Err(RecommendationFailure::ProviderError(_))));
    }
}
