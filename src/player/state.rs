//! Playback position snapshot and time formatting.

use std::time::Duration;

/// Where playback is within the active media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Current position in the track
    pub position: Duration,
    /// Total duration of the track
    pub duration: Duration,
}

impl Progress {
    /// Snapshot for a known duration; `None` while the duration is unknown.
    pub fn new(position: Duration, duration: Duration) -> Option<Self> {
        if duration.is_zero() {
            None
        } else {
            Some(Self {
                position: position.min(duration),
                duration,
            })
        }
    }

    /// Get position as a fraction (0.0 - 1.0).
    pub fn fraction(&self) -> f32 {
        self.position.as_secs_f32() / self.duration.as_secs_f32()
    }

    /// Format position as MM:SS.
    pub fn position_str(&self) -> String {
        format_duration(self.position)
    }

    /// Format duration as MM:SS.
    pub fn duration_str(&self) -> String {
        format_duration(self.duration)
    }
}

/// Format a duration as MM:SS or HH:MM:SS.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
