//! Display state published to the presentation layer.

use crate::model::Track;
use crate::player::Progress;

use super::machine::Phase;

/// What the `next` slot shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NextView {
    #[default]
    Empty,
    Loading,
    Ready(Track),
    Error(String),
}

/// Snapshot of a session, rebuilt after every scheduler step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionView {
    pub phase: Phase,
    pub mood: String,
    pub now: Option<Track>,
    /// Now-slot status line ("Loading", error text, ...)
    pub status: Option<String>,
    pub next: NextView,
    pub paused: bool,
    pub progress: Option<Progress>,
}

impl SessionView {
    /// Same content ignoring playback position.
    pub fn same_display(&self, other: &SessionView) -> bool {
        self.phase == other.phase
            && self.mood == other.mood
            && self.now == other.now
            && self.status == other.status
            && self.next == other.next
            && self.paused == other.paused
    }
}
