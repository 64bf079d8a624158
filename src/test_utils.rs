//! Test fixtures shared across modules.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{resolved, complete_config};
//!
//! let next = resolved("Blue in Green", &["h1", "h2"]);
//! let config = complete_config();
//! ```

use crate::config::Config;
use crate::model::{MediaCandidates, MediaHandle, Resolved, Track};

/// Candidates in the given order. Panics on an empty list.
pub fn candidates(handles: &[&str]) -> MediaCandidates {
    MediaCandidates::new(handles.iter().map(|h| MediaHandle::new(*h)).collect())
        .expect("at least one handle")
}

/// A track titled `title` by "Artist", resolved to `handles`.
pub fn resolved(title: &str, handles: &[&str]) -> Resolved {
    Resolved {
        track: Track::new(title, "Artist", None),
        candidates: candidates(handles),
    }
}

/// Config with a key for every default provider.
pub fn complete_config() -> Config {
    let mut config = Config::default();
    config.credentials.set("claude", "sk-ant-test");
    config.credentials.set("youtube", "AIza-test");
    config
}
