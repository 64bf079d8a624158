//! Adapter layer: domain inputs to a Messages request, response to a [`Track`].

use super::dto;
use crate::model::Track;
use crate::recommend::{RecommendationFailure, decode};

/// Small, fast model; one short JSON object is all we need back.
pub const MODEL: &str = "claude-haiku-4-5-20251001";

const MAX_TOKENS: u32 = 400;

const SYSTEM_PROMPT: &str = "You are an expert DJ with an encyclopedic knowledge of music. \
You are given a mood and the list of tracks already played. Suggest exactly ONE track that \
fits the mood perfectly, varying artists and eras. Reply ONLY with valid JSON, no markdown, \
no explanation: {\"title\": \"...\", \"artist\": \"...\", \"year\": 2003}";

/// Build the request for one recommendation.
pub fn build_request(mood: &str, history: &[Track]) -> dto::MessagesRequest {
    dto::MessagesRequest {
        model: MODEL.to_string(),
        max_tokens: MAX_TOKENS,
        system: SYSTEM_PROMPT.to_string(),
        messages: vec![dto::Message {
            role: "user".to_string(),
            content: user_prompt(mood, history),
        }],
    }
}

fn user_prompt(mood: &str, history: &[Track]) -> String {
    let played = if history.is_empty() {
        "(none)".to_string()
    } else {
        history
            .iter()
            .map(|t| format!("- {} - {}", t.artist, t.title))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!("Mood: \"{}\"\n\nAlready played:\n{}\n\nNext track?", mood, played)
}

/// Extract the track from the first text block of a response.
pub fn to_track(response: dto::MessagesResponse) -> Result<Track, RecommendationFailure> {
    let text = response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| RecommendationFailure::ProviderError("empty response".to_string()))?;

    decode::parse_track(&text)
}
