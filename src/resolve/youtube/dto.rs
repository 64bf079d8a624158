//! YouTube Data API Data Transfer Objects
//!
//! These types match what `search.list` returns.
//! DO NOT use these types outside the youtube module - convert to domain types.
//!
//! Example response (trimmed):
//! ```json
//! {
//!   "kind": "youtube#searchListResponse",
//!   "items": [
//!     {"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": "zqNTltOGh5c"}}
//!   ]
//! }
//! ```

use serde::Deserialize;

/// search.list response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: ItemId,
}

/// Result id. `videoId` is only present when `kind` is `youtube#video`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemId {
    pub kind: Option<String>,
    pub video_id: Option<String>,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: Option<u16>,
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub reason: Option<String>,
    pub domain: Option<String>,
}
