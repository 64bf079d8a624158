//! Anthropic Messages API Data Transfer Objects
//!
//! These types match what the Messages API accepts and returns.
//! DO NOT use these types outside the claude module - convert to domain types.
//!
//! Example response:
//! ```json
//! {
//!   "id": "msg_01...",
//!   "type": "message",
//!   "role": "assistant",
//!   "content": [{"type": "text", "text": "{\"title\": \"...\", \"artist\": \"...\", \"year\": 1959}"}],
//!   "stop_reason": "end_turn"
//! }
//! ```

use serde::{Deserialize, Serialize};

/// POST /v1/messages body
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
}

/// A single conversation turn
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Successful response
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

/// One block of assistant output. Only `text` blocks carry a `text` field.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: String,
}
