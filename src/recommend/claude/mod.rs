//! Anthropic Messages API integration
//!
//! Asks a small Claude model to act as a DJ: given the mood and the tracks
//! already played, reply with one JSON object naming the next track.
//!
//! API docs: https://docs.anthropic.com/en/api/messages

pub mod dto;
mod adapter;
mod client;

pub use adapter::{build_request, to_track};
pub use client::ClaudeClient;
