//! Adapter layer: search results to [`MediaCandidates`].

use super::dto;
use crate::model::{MediaCandidates, MediaHandle, Track};
use crate::resolve::ResolutionFailure;

/// Free-text query for a track.
pub fn search_query(track: &Track) -> String {
    format!("{} - {}", track.artist, track.title)
}

/// Playable URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Keep video results in relevance order; no videos means `NoResults`.
pub fn to_candidates(response: dto::SearchResponse) -> Result<MediaCandidates, ResolutionFailure> {
    let handles = response
        .items
        .into_iter()
        .filter_map(|item| item.id.video_id)
        .filter(|id| !id.is_empty())
        .map(|id| MediaHandle::new(watch_url(&id)))
        .collect();

    MediaCandidates::new(handles).ok_or(ResolutionFailure::NoResults)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(video_id: Option<&str>) -> dto::SearchItem {
        dto::SearchItem {
            id: dto::ItemId {
                kind: Some("youtube#video".to_string()),
                video_id: video_id.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_query_format() {
        let track = Track::new("Blue in Green", "Miles Davis", Some(1959));
        assert_eq!(search_query(&track), "Miles Davis - Blue in Green");
    }

    #[test]
    fn test_candidates_keep_relevance_order() {
        let response = dto::SearchResponse {
            items: vec![item(Some("h1")), item(None), item(Some("h2"))],
        };
        let candidates = to_candidates(response).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates.primary().as_str(),
            "https://www.youtube.com/watch?v=h1"
        );
    }

    #[test]
    fn test_empty_results_are_no_results() {
        let response = dto::SearchResponse { items: vec![] };
        assert_eq!(to_candidates(response), Err(ResolutionFailure::NoResults));

        let only_channels = dto::SearchResponse {
            items: vec![item(None)],
        };
        assert_eq!(to_candidates(only_channels), Err(ResolutionFailure::NoResults));
    }
}
