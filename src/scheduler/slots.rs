//! The `now` / `next` slot pair and the in-flight bookkeeping for `next`.

use std::collections::VecDeque;

use crate::model::{MediaHandle, Resolved, Track};

/// Identifies one recommend+resolve fetch. Strictly increasing per session.
pub type Ticket = u64;

/// What is on air.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowSlot {
    pub track: Track,
    /// Handle currently loaded on the device
    pub active: MediaHandle,
    /// Remaining candidates, tried in order if the active one fails
    pub fallback: VecDeque<MediaHandle>,
}

impl NowSlot {
    pub fn new(resolved: Resolved) -> Self {
        let (active, fallback) = resolved.candidates.into_parts();
        Self {
            track: resolved.track,
            active,
            fallback,
        }
    }

    /// Make the next fallback candidate active, if any remain.
    pub fn advance_fallback(&mut self) -> Option<MediaHandle> {
        let handle = self.fallback.pop_front()?;
        self.active = handle.clone();
        Some(handle)
    }
}

/// Lookahead slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NextSlot {
    #[default]
    Empty,
    Loading,
    Ready(Resolved),
    /// Fetch failed; carries a hint for the listener
    Error(String),
}

impl NextSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Take a ready result, leaving the slot empty. Other states are left alone.
    pub fn take_ready(&mut self) -> Option<Resolved> {
        match std::mem::take(self) {
            Self::Ready(resolved) => Some(resolved),
            other => {
                *self = other;
                None
            }
        }
    }
}

/// The single operation allowed to write `next`.
///
/// Only the fetch whose ticket matches may land; anything else is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextOp {
    #[default]
    Idle,
    Prefetching(Ticket),
    Rerolling(Ticket),
}

impl NextOp {
    pub fn is_rerolling(self) -> bool {
        matches!(self, Self::Rerolling(_))
    }
}
