//! Defensive decoding of a recommended track from provider text.
//!
//! Generative providers are asked for bare JSON but sometimes wrap it in
//! prose or markdown fences. Two strategies are tried in order:
//! 1. parse the whole (trimmed) text as JSON
//! 2. parse the largest embedded `{ ... }` fragment (first `{` to last `}`)
//!
//! If both fail the result is `ProviderError("unparsable response")`.

use serde::Deserialize;
use serde_json::Value;

use super::RecommendationFailure;
use crate::model::Track;

/// Raw payload shape. `year` is kept loose because models emit `1959`,
/// `"1959"` or `null` interchangeably.
#[derive(Debug, Deserialize)]
struct TrackPayload {
    title: String,
    artist: String,
    #[serde(default)]
    year: Option<Value>,
}

/// Parse provider text into a [`Track`].
pub fn parse_track(text: &str) -> Result<Track, RecommendationFailure> {
    let cleaned = text.trim();

    let payload = serde_json::from_str::<TrackPayload>(cleaned)
        .ok()
        .or_else(|| {
            embedded_fragment(cleaned).and_then(|frag| serde_json::from_str(frag).ok())
        })
        .ok_or_else(|| RecommendationFailure::ProviderError("unparsable response".to_string()))?;

    let title = payload.title.trim();
    let artist = payload.artist.trim();
    if title.is_empty() || artist.is_empty() {
        return Err(RecommendationFailure::ProviderError(
            "response missing title or artist".to_string(),
        ));
    }

    Ok(Track::new(title, artist, payload.year.as_ref().and_then(lenient_year)))
}

/// Largest `{...}` span in `text`, if any.
fn embedded_fragment(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn lenient_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
