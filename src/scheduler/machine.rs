//! Playback scheduling state machine.
//!
//! [`Session::apply`] maps one [`Event`] to a list of [`Effect`]s and never
//! performs I/O itself. The driver executes the effects and feeds their
//! outcomes back in as further events.
//!
//! # Logical cancellation
//!
//! Every fetch is tagged with a [`Ticket`]. The `now` slot remembers the
//! ticket it is waiting for, and the `next` slot tracks its single in-flight
//! operation as a [`NextOp`]. A completion carrying any other ticket is
//! stale and dropped. A reroll replaces a running prefetch; a prefetch
//! requested while a reroll runs is skipped. Whichever operation currently
//! owns `next` is the only one whose result can land there.
//!
//! Device end and error reports are checked the same way against the
//! [`LoadId`] of the active load, so a report about replaced media cannot
//! advance the session a second time.

use std::time::Duration;
use tracing::{debug, info, warn};

use super::ledger::Ledger;
use super::slots::{NextOp, NextSlot, NowSlot, Ticket};
use super::view::{NextView, SessionView};
use crate::config::SchedulerConfig;
use crate::error::{FailureKind, FetchFailure};
use crate::model::{MediaHandle, Resolved, Track};
use crate::player::{DeviceEvent, LoadId, Progress};

pub const STATUS_STARTING: &str = "Finding the first track";
pub const STATUS_LOADING: &str = "Loading";
pub const STATUS_FALLBACK: &str = "Media failed, trying an alternate source";
pub const STATUS_EXHAUSTED: &str = "Media unavailable, moving on";
pub const STATUS_QUOTA: &str = "Video search quota exhausted for today";
pub const STATUS_NO_RESULTS: &str = "No results, trying another track";
pub const STATUS_BAD_KEY: &str = "API key rejected, check your settings";

pub const HINT_PREFETCH_FAILED: &str = "Failed - press reroll";
pub const HINT_REROLL_FAILED: &str = "Failed - try again";

/// Listener commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Reset everything and play for a new mood
    StartSession(String),
    /// Bias upcoming picks without touching what plays now
    ChangeMood(String),
    /// Replace the `next` pick
    Reroll,
    /// Move to the `next` pick now
    Skip,
    TogglePause,
    /// Seek to a fraction (0.0 - 1.0) of the current track
    Seek(f32),
}

/// Why a fetch was issued; decides which slot its result may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    /// First track of a session
    Start,
    /// Replacement for `now` when nothing usable is queued
    Reconcile,
    /// Automatic lookahead for `next`
    Prefetch,
    /// Listener-requested replacement for `next`
    Reroll,
}

/// Input for one recommend+resolve sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub mood: String,
    pub history: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(Command),
    Fetched {
        ticket: Ticket,
        purpose: FetchPurpose,
        outcome: Result<Resolved, FetchFailure>,
    },
    Device(DeviceEvent),
    /// An [`Effect::Load`] was accepted by the device
    Loaded(Option<LoadId>),
    /// A delay requested through [`Effect::ScheduleRetry`] elapsed
    RetryDue { epoch: u64 },
}

/// Side effects for the driver to carry out, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch {
        ticket: Ticket,
        purpose: FetchPurpose,
        request: FetchRequest,
    },
    Load(MediaHandle),
    Play,
    Pause,
    Seek(f32),
    StartProgress,
    StopProgress,
    /// Deliver `RetryDue { epoch }` after `delay`
    ScheduleRetry { delay: Duration, epoch: u64 },
    /// Credentials were rejected; the listener must fix settings
    PromptCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No session, nothing loaded
    #[default]
    Idle,
    /// Fetching the first track of a session
    LoadingNow,
    Playing,
    /// The active handle failed and an alternate one is loading
    AwaitingFallback,
    /// Fetching a replacement for `now` outside the `next` slot
    Reconciling,
}

/// The single owned state of a listening session.
#[derive(Debug)]
pub struct Session {
    ledger: Ledger,
    history_limit: usize,
    no_results_retry: Duration,
    reconcile_pause: Duration,

    phase: Phase,
    now: Option<NowSlot>,
    next: NextSlot,
    next_op: NextOp,
    now_fetch: Option<Ticket>,
    last_ticket: Ticket,

    pending_retry: Option<(u64, FetchPurpose)>,
    retry_epoch: u64,

    device_ready: bool,
    pending_load: Option<MediaHandle>,
    active_load: Option<LoadId>,
    paused: bool,
    status: Option<String>,
}

impl Session {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            ledger: Ledger::new(config.history_limit),
            history_limit: config.history_limit,
            no_results_retry: config.no_results_retry(),
            reconcile_pause: config.reconcile_pause(),
            phase: Phase::Idle,
            now: None,
            next: NextSlot::Empty,
            next_op: NextOp::Idle,
            now_fetch: None,
            last_ticket: 0,
            pending_retry: None,
            retry_epoch: 0,
            device_ready: false,
            pending_load: None,
            active_load: None,
            paused: false,
            status: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn now(&self) -> Option<&NowSlot> {
        self.now.as_ref()
    }

    pub fn next(&self) -> &NextSlot {
        &self.next
    }

    pub fn next_op(&self) -> NextOp {
        self.next_op
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn view(&self, progress: Option<Progress>) -> SessionView {
        SessionView {
            phase: self.phase,
            mood: self.ledger.mood().to_string(),
            now: self.now.as_ref().map(|n| n.track.clone()),
            status: self.status.clone(),
            next: match &self.next {
                NextSlot::Empty => NextView::Empty,
                NextSlot::Loading => NextView::Loading,
                NextSlot::Ready(resolved) => NextView::Ready(resolved.track.clone()),
                NextSlot::Error(hint) => NextView::Error(hint.clone()),
            },
            paused: self.paused,
            progress: progress.filter(|_| self.now.is_some()),
        }
    }

    /// Advance the session by one event.
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        let mut fx = Vec::new();
        match event {
            Event::Command(command) => self.on_command(command, &mut fx),
            Event::Fetched {
                ticket,
                purpose,
                outcome,
            } => self.on_fetched(ticket, purpose, outcome, &mut fx),
            Event::Device(event) => self.on_device(event, &mut fx),
            Event::Loaded(load) => self.active_load = load,
            Event::RetryDue { epoch } => self.on_retry_due(epoch, &mut fx),
        }
        fx
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn on_command(&mut self, command: Command, fx: &mut Vec<Effect>) {
        match command {
            Command::StartSession(mood) => self.start_session(&mood, fx),
            Command::ChangeMood(mood) => self.change_mood(&mood, fx),
            Command::Reroll => self.reroll(fx),
            Command::Skip => {
                if self.phase == Phase::Idle {
                    debug!("Skip ignored: no session");
                    return;
                }
                info!("Skipping");
                self.advance(fx);
            }
            Command::TogglePause => {
                if self.now.is_none() {
                    return;
                }
                self.paused = !self.paused;
                fx.push(if self.paused {
                    Effect::Pause
                } else {
                    Effect::Play
                });
            }
            Command::Seek(fraction) => {
                if self.now.is_none() || !fraction.is_finite() {
                    return;
                }
                fx.push(Effect::Seek(fraction.clamp(0.0, 1.0)));
            }
        }
    }

    fn start_session(&mut self, mood: &str, fx: &mut Vec<Effect>) {
        let mood = mood.trim();
        if mood.is_empty() {
            debug!("Start ignored: blank mood");
            return;
        }
        info!("Starting session: {:?}", mood);

        if self.now.is_some() && !self.paused {
            fx.push(Effect::Pause);
        }
        fx.push(Effect::StopProgress);

        self.ledger.reset(mood);
        self.now = None;
        self.next = NextSlot::Empty;
        self.next_op = NextOp::Idle;
        self.pending_load = None;
        self.paused = false;
        self.phase = Phase::LoadingNow;
        self.status = Some(STATUS_STARTING.to_string());
        self.start_now_fetch(FetchPurpose::Start, fx);
    }

    fn change_mood(&mut self, mood: &str, fx: &mut Vec<Effect>) {
        if self.phase == Phase::Idle {
            debug!("Mood change ignored: no session");
            return;
        }
        let mood = mood.trim();
        if mood.is_empty() || mood == self.ledger.mood() {
            return;
        }
        info!("Mood changed to {:?}", mood);
        self.ledger.set_mood(mood);
        self.prefetch(fx);
    }

    fn reroll(&mut self, fx: &mut Vec<Effect>) {
        if self.phase == Phase::Idle {
            debug!("Reroll ignored: no session");
            return;
        }
        if self.next_op.is_rerolling() {
            debug!("Reroll ignored: one is already running");
            return;
        }
        let ticket = self.issue_ticket();
        if let NextOp::Prefetching(old) = self.next_op {
            debug!("Reroll {} supersedes prefetch {}", ticket, old);
        }
        info!("Rerolling next track");
        self.next_op = NextOp::Rerolling(ticket);
        self.next = NextSlot::Loading;
        fx.push(self.fetch(ticket, FetchPurpose::Reroll));
    }

    // ------------------------------------------------------------------
    // Slot transitions
    // ------------------------------------------------------------------

    fn issue_ticket(&mut self) -> Ticket {
        self.last_ticket += 1;
        self.last_ticket
    }

    fn fetch(&self, ticket: Ticket, purpose: FetchPurpose) -> Effect {
        let current = self.now.as_ref().map(|n| &n.track);
        Effect::Fetch {
            ticket,
            purpose,
            request: FetchRequest {
                mood: self.ledger.mood().to_string(),
                history: self.ledger.recent_history(self.history_limit, current),
            },
        }
    }

    fn start_now_fetch(&mut self, purpose: FetchPurpose, fx: &mut Vec<Effect>) {
        let ticket = self.issue_ticket();
        if let Some(old) = self.now_fetch.replace(ticket) {
            debug!("Now-slot fetch {} superseded by {}", old, ticket);
        }
        self.pending_retry = None;
        fx.push(self.fetch(ticket, purpose));
    }

    fn prefetch(&mut self, fx: &mut Vec<Effect>) {
        if self.next_op.is_rerolling() {
            debug!("Prefetch skipped: reroll in flight");
            return;
        }
        let ticket = self.issue_ticket();
        if let NextOp::Prefetching(old) = self.next_op {
            debug!("Prefetch {} superseded by {}", old, ticket);
        }
        self.next_op = NextOp::Prefetching(ticket);
        self.next = NextSlot::Loading;
        fx.push(self.fetch(ticket, FetchPurpose::Prefetch));
    }

    /// Skip or natural end: promote `next` if ready, otherwise reconcile.
    fn advance(&mut self, fx: &mut Vec<Effect>) {
        fx.push(Effect::StopProgress);

        if let Some(resolved) = self.next.take_ready() {
            if let Some(ticket) = self.now_fetch.take() {
                debug!("Dropping now-slot fetch {} after promotion", ticket);
            }
            self.pending_retry = None;
            self.install_now(resolved, fx);
        } else {
            info!("Next track not ready, fetching a replacement");
            self.phase = Phase::Reconciling;
            self.status = Some(STATUS_LOADING.to_string());
            self.start_now_fetch(FetchPurpose::Reconcile, fx);
        }
    }

    /// Put a resolved track on air and refill `next`.
    fn install_now(&mut self, resolved: Resolved, fx: &mut Vec<Effect>) {
        if let Some(previous) = self.now.take() {
            self.ledger.record_played(previous.track);
        }
        let slot = NowSlot::new(resolved);
        info!("Now playing: {}", slot.track);
        let handle = slot.active.clone();
        self.now = Some(slot);
        self.phase = Phase::Playing;
        self.status = None;
        self.paused = false;
        self.load(handle, fx);
        self.prefetch(fx);
    }

    fn load(&mut self, handle: MediaHandle, fx: &mut Vec<Effect>) {
        if self.device_ready {
            self.active_load = None;
            fx.push(Effect::Load(handle));
        } else {
            debug!("Device not ready, holding {}", handle);
            self.pending_load = Some(handle);
        }
    }

    fn schedule_retry(&mut self, delay: Duration, purpose: FetchPurpose, fx: &mut Vec<Effect>) {
        self.retry_epoch += 1;
        self.pending_retry = Some((self.retry_epoch, purpose));
        fx.push(Effect::ScheduleRetry {
            delay,
            epoch: self.retry_epoch,
        });
    }

    /// Stop the session after a failure that needs the listener.
    fn halt(&mut self, status: String, fx: &mut Vec<Effect>) {
        warn!("Session halted: {}", status);
        fx.push(Effect::StopProgress);
        if self.now.is_some() && !self.paused {
            fx.push(Effect::Pause);
        }
        self.phase = Phase::Idle;
        self.now = None;
        self.next = NextSlot::Empty;
        self.next_op = NextOp::Idle;
        self.now_fetch = None;
        self.pending_retry = None;
        self.pending_load = None;
        self.status = Some(status);
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    fn on_fetched(
        &mut self,
        ticket: Ticket,
        purpose: FetchPurpose,
        outcome: Result<Resolved, FetchFailure>,
        fx: &mut Vec<Effect>,
    ) {
        match purpose {
            FetchPurpose::Start | FetchPurpose::Reconcile => {
                if self.now_fetch != Some(ticket) {
                    debug!("Discarding stale {:?} fetch {}", purpose, ticket);
                    return;
                }
                self.now_fetch = None;
                match outcome {
                    Ok(resolved) => self.install_now(resolved, fx),
                    Err(failure) => self.now_fetch_failed(purpose, failure, fx),
                }
            }
            FetchPurpose::Prefetch | FetchPurpose::Reroll => {
                let owner = if purpose == FetchPurpose::Prefetch {
                    NextOp::Prefetching(ticket)
                } else {
                    NextOp::Rerolling(ticket)
                };
                if self.next_op != owner {
                    debug!("Discarding stale {:?} fetch {}", purpose, ticket);
                    return;
                }
                self.next_op = NextOp::Idle;
                let hint = if purpose == FetchPurpose::Prefetch {
                    HINT_PREFETCH_FAILED
                } else {
                    HINT_REROLL_FAILED
                };
                match outcome {
                    Ok(resolved)
                        if self
                            .now
                            .as_ref()
                            .is_some_and(|now| now.track.same_song(&resolved.track)) =>
                    {
                        warn!("{:?} picked the current track again: {}", purpose, resolved.track);
                        self.next = NextSlot::Error(hint.to_string());
                    }
                    Ok(resolved) => {
                        info!("Up next: {}", resolved.track);
                        self.next = NextSlot::Ready(resolved);
                    }
                    Err(failure) => {
                        warn!("{:?} failed: {}", purpose, failure);
                        self.next = NextSlot::Error(hint.to_string());
                    }
                }
            }
        }
    }

    fn now_fetch_failed(
        &mut self,
        purpose: FetchPurpose,
        failure: FetchFailure,
        fx: &mut Vec<Effect>,
    ) {
        warn!("{:?} failed: {}", purpose, failure);
        match failure.kind() {
            FailureKind::NoResults => {
                self.status = Some(STATUS_NO_RESULTS.to_string());
                self.schedule_retry(self.no_results_retry, purpose, fx);
            }
            FailureKind::InvalidCredential => {
                self.halt(STATUS_BAD_KEY.to_string(), fx);
                fx.push(Effect::PromptCredentials);
            }
            FailureKind::QuotaExceeded => self.halt(STATUS_QUOTA.to_string(), fx),
            FailureKind::Provider(detail) => self.halt(format!("Error: {}", detail), fx),
        }
    }

    fn on_retry_due(&mut self, epoch: u64, fx: &mut Vec<Effect>) {
        match self.pending_retry {
            Some((pending, purpose)) if pending == epoch => {
                info!("Retrying {:?}", purpose);
                self.start_now_fetch(purpose, fx);
            }
            _ => debug!("Ignoring stale retry {}", epoch),
        }
    }

    // ------------------------------------------------------------------
    // Device events
    // ------------------------------------------------------------------

    fn on_device(&mut self, event: DeviceEvent, fx: &mut Vec<Effect>) {
        match event {
            DeviceEvent::Ready => {
                self.device_ready = true;
                if let Some(handle) = self.pending_load.take() {
                    self.active_load = None;
                    fx.push(Effect::Load(handle));
                }
            }
            DeviceEvent::Playing => {
                self.paused = false;
                match self.phase {
                    Phase::AwaitingFallback => {
                        info!("Alternate source is playing");
                        self.phase = Phase::Playing;
                        self.status = None;
                        fx.push(Effect::StartProgress);
                    }
                    Phase::Playing => fx.push(Effect::StartProgress),
                    _ => {}
                }
            }
            DeviceEvent::Paused => self.paused = true,
            DeviceEvent::Ended(load) if self.is_stale(load) => {
                debug!("Ignoring end of replaced media {:?}", load);
            }
            DeviceEvent::Error(load, detail) if self.is_stale(load) => {
                debug!("Ignoring error from replaced media {:?}: {}", load, detail);
            }
            DeviceEvent::Ended(_) => match self.phase {
                Phase::Playing | Phase::AwaitingFallback => {
                    info!("Track ended");
                    self.advance(fx);
                }
                _ => debug!("Ignoring end of media in {:?}", self.phase),
            },
            DeviceEvent::Error(_, detail) => self.on_media_error(&detail, fx),
        }
    }

    /// A report tagged with a load other than the active one.
    fn is_stale(&self, load: Option<LoadId>) -> bool {
        matches!((load, self.active_load), (Some(from), Some(active)) if from != active)
    }

    /// Walk the fallback pool; once it is empty, reconcile after a pause.
    fn on_media_error(&mut self, detail: &str, fx: &mut Vec<Effect>) {
        if !matches!(self.phase, Phase::Playing | Phase::AwaitingFallback) {
            debug!("Ignoring device error in {:?}: {}", self.phase, detail);
            return;
        }
        let Some(now) = self.now.as_mut() else {
            return;
        };
        warn!("Media {} failed: {}", now.active, detail);

        match now.advance_fallback() {
            Some(handle) => {
                info!("Trying alternate source {} ({} left)", handle, now.fallback.len());
                self.phase = Phase::AwaitingFallback;
                self.status = Some(STATUS_FALLBACK.to_string());
                self.load(handle, fx);
            }
            None => {
                warn!("Every source for {} failed", now.track);
                fx.push(Effect::StopProgress);
                self.phase = Phase::Reconciling;
                self.status = Some(STATUS_EXHAUSTED.to_string());
                self.schedule_retry(self.reconcile_pause, FetchPurpose::Reconcile, fx);
            }
        }
    }
}
