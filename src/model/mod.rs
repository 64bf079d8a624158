//! Core data models shared by the gateways and the scheduler.
//!
//! - [`Track`]: a recommended song identity (not itself playable)
//! - [`MediaHandle`]: opaque pointer to a playable resource
//! - [`MediaCandidates`]: the non-empty, relevance-ordered handles a track resolved to
//! - [`Resolved`]: a track together with its candidates, ready to occupy a slot

use std::collections::VecDeque;
use std::fmt;

/// A song identity produced by the recommendation gateway.
///
/// Identity is structural (title + artist); there is no numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            year,
        }
    }

    /// Whether two tracks name the same song, ignoring case and year.
    pub fn same_song(&self, other: &Track) -> bool {
        self.title.trim().eq_ignore_ascii_case(other.title.trim())
            && self.artist.trim().eq_ignore_ascii_case(other.artist.trim())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)?;
        if let Some(year) = self.year {
            write!(f, " ({})", year)?;
        }
        Ok(())
    }
}

/// Opaque token identifying a playable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaHandle(String);

impl MediaHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty ordered list of media handles for one track.
///
/// The first element is the primary candidate; the rest form the fallback
/// pool, consumed only when the playback device rejects the active handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCandidates {
    primary: MediaHandle,
    fallback: Vec<MediaHandle>,
}

impl MediaCandidates {
    /// Build from a provider-ordered list. Returns `None` for an empty list.
    pub fn new(handles: Vec<MediaHandle>) -> Option<Self> {
        let mut iter = handles.into_iter();
        let primary = iter.next()?;
        Some(Self {
            primary,
            fallback: iter.collect(),
        })
    }

    pub fn primary(&self) -> &MediaHandle {
        &self.primary
    }

    pub fn len(&self) -> usize {
        1 + self.fallback.len()
    }

    /// Split into the primary handle and the fallback pool.
    pub fn into_parts(self) -> (MediaHandle, VecDeque<MediaHandle>) {
        (self.primary, self.fallback.into())
    }
}

/// A track with its resolved media, the unit that fills a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub track: Track,
    pub candidates: MediaCandidates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_reject_empty() {
        assert!(MediaCandidates::new(vec![]).is_none());
    }

    #[test]
    fn test_candidates_preserve_order() {
        let candidates = MediaCandidates::new(vec![
            MediaHandle::new("a"),
            MediaHandle::new("b"),
            MediaHandle::new("c"),
        ])
        .unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates.primary().as_str(), "a");

        let (primary, fallback) = candidates.into_parts();
        assert_eq!(primary.as_str(), "a");
        assert_eq!(
            fallback.iter().map(MediaHandle::as_str).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
    }

    #[test]
    fn test_track_display() {
        let track = Track::new("Blue in Green", "Miles Davis", Some(1959));
        assert_eq!(track.to_string(), "Miles Davis - Blue in Green (1959)");

        let undated = Track::new("So What", "Miles Davis", None);
        assert_eq!(undated.to_string(), "Miles Davis - So What");
    }

    #[test]
    fn test_same_song_ignores_case_and_year() {
        let a = Track::new("So What", "Miles Davis", Some(1959));
        let b = Track::new("so what ", "MILES DAVIS", None);
        assert!(a.same_song(&b));
        assert!(!a.same_song(&Track::new("Freddie Freeloader", "Miles Davis", None)));
    }
}
