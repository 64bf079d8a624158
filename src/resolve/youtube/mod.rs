//! YouTube Data API v3 integration
//!
//! Resolves a track by searching embeddable videos for "<artist> - <title>".
//! The top results, in YouTube's relevance order, become the track's media
//! candidates.
//!
//! API docs: https://developers.google.com/youtube/v3/docs/search/list

pub mod dto;
mod adapter;
mod client;

pub use adapter::{search_query, to_candidates, watch_url};
pub use client::YouTubeClient;
