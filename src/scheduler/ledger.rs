//! Session mood and bounded play history.

use std::collections::VecDeque;

use crate::model::Track;

/// Default number of retained history entries.
pub const DEFAULT_CAPACITY: usize = 50;

/// Mood plus a FIFO log of tracks that have left the `now` slot.
#[derive(Debug, Clone)]
pub struct Ledger {
    mood: String,
    played: VecDeque<Track>,
    capacity: usize,
}

impl Ledger {
    pub fn new(capacity: usize) -> Self {
        Self {
            mood: String::new(),
            played: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Start a brand-new session: history is cleared, mood replaced.
    pub fn reset(&mut self, mood: impl Into<String>) {
        self.mood = mood.into();
        self.played.clear();
    }

    pub fn mood(&self) -> &str {
        &self.mood
    }

    /// Replace the mood mid-session without touching history.
    pub fn set_mood(&mut self, mood: impl Into<String>) {
        self.mood = mood.into();
    }

    /// Append to the tail, evicting from the head once over capacity.
    pub fn record_played(&mut self, track: Track) {
        self.played.push_back(track);
        while self.played.len() > self.capacity {
            self.played.pop_front();
        }
    }

    /// The last `limit` played tracks in playback order, followed by
    /// `current` when given, so a provider never repeats what is on air.
    pub fn recent_history(&self, limit: usize, current: Option<&Track>) -> Vec<Track> {
        let skip = self.played.len().saturating_sub(limit);
        self.played
            .iter()
            .skip(skip)
            .chain(current)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.played.len()
    }

    pub fn is_empty(&self) -> bool {
        self.played.is_empty()
    }

    /// Most recently recorded track.
    pub fn latest(&self) -> Option<&Track> {
        self.played.back()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The ledger never exceeds its cap and keeps the newest entries in order
        #[test]
        fn ledger_is_bounded_fifo(capacity in 1usize..20, count in 0usize..80) {
            let mut ledger = Ledger::new(capacity);
            for n in 0..count {
                ledger.record_played(Track::new(n.to_string(), "A", None));
            }

            prop_assert!(ledger.len() <= capacity);
            let expected: Vec<String> = (count.saturating_sub(capacity)..count)
                .map(|n| n.to_string())
                .collect();
            let actual: Vec<String> = ledger
                .recent_history(capacity, None)
                .into_iter()
                .map(|t| t.title)
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
