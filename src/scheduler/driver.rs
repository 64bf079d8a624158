//! Async event loop that runs a [`Session`] against real collaborators.
//!
//! One task owns the session, the playback device and the progress
//! observer. Gateway calls run as spawned tasks that post their outcome
//! back over an internal channel, so a slow provider never blocks
//! listener commands or device events.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::machine::{Command, Effect, Event, FetchPurpose, FetchRequest, Session};
use super::slots::Ticket;
use super::view::SessionView;
use crate::config::SchedulerConfig;
use crate::error::FetchFailure;
use crate::model::Resolved;
use crate::player::{DeviceError, DeviceEvent, PlaybackDevice, Progress, ProgressObserver};
use crate::recommend::Recommender;
use crate::resolve::Resolver;

/// Out-of-band messages for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A provider rejected its API key and the session halted
    CredentialsRejected,
}

/// Presentation-side end of a running scheduler.
pub struct SchedulerHandle {
    pub commands: mpsc::UnboundedSender<Command>,
    pub view: watch::Receiver<SessionView>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

pub struct Scheduler {
    session: Session,
    recommender: Arc<dyn Recommender>,
    resolver: Arc<dyn Resolver>,
    device: Box<dyn PlaybackDevice>,
    observer: ProgressObserver,
    progress: Option<Progress>,

    commands: mpsc::UnboundedReceiver<Command>,
    internal_tx: mpsc::UnboundedSender<Event>,
    internal_rx: mpsc::UnboundedReceiver<Event>,
    view_tx: watch::Sender<SessionView>,
    notice_tx: mpsc::UnboundedSender<Notice>,
}

/// What woke the loop up.
enum Wake {
    Event(Event),
    ProgressTick,
    Shutdown,
}

impl Scheduler {
    pub fn new(
        config: &SchedulerConfig,
        recommender: Arc<dyn Recommender>,
        resolver: Arc<dyn Resolver>,
        device: Box<dyn PlaybackDevice>,
    ) -> (Self, SchedulerHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let session = Session::new(config);
        let (view_tx, view) = watch::channel(session.view(None));

        let scheduler = Self {
            session,
            recommender,
            resolver,
            device,
            observer: ProgressObserver::new(config.progress_interval()),
            progress: None,
            commands,
            internal_tx,
            internal_rx,
            view_tx,
            notice_tx,
        };
        let handle = SchedulerHandle {
            commands: command_tx,
            view,
            notices,
        };
        (scheduler, handle)
    }

    /// Run until every command sender is dropped.
    ///
    /// Fails only when the device's event channel closes.
    pub async fn run(
        mut self,
        mut device_events: mpsc::Receiver<DeviceEvent>,
    ) -> Result<(), DeviceError> {
        info!("Scheduler started");
        loop {
            let wake = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => Wake::Event(Event::Command(command)),
                    None => Wake::Shutdown,
                },
                event = device_events.recv() => match event {
                    Some(event) => Wake::Event(Event::Device(event)),
                    None => {
                        warn!("Playback device went away");
                        return Err(DeviceError::Disconnected);
                    }
                },
                Some(event) = self.internal_rx.recv() => Wake::Event(event),
                _ = self.observer.tick() => Wake::ProgressTick,
            };

            match wake {
                Wake::Event(event) => self.dispatch(event).await,
                Wake::ProgressTick => self.sample_progress().await,
                Wake::Shutdown => {
                    info!("Scheduler stopped");
                    return Ok(());
                }
            }
        }
    }

    /// Apply an event and everything it causes, then publish the view.
    async fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in self.session.apply(event) {
                if let Some(feedback) = self.execute(effect).await {
                    queue.push_back(feedback);
                }
            }
        }
        self.publish();
    }

    /// Carry out one effect. A load reports its id back; a failed load comes
    /// back as a device error.
    async fn execute(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Fetch {
                ticket,
                purpose,
                request,
            } => self.spawn_fetch(ticket, purpose, request),
            Effect::Load(handle) => {
                debug!("Loading {}", handle);
                return match self.device.load(&handle).await {
                    Ok(load) => Some(Event::Loaded(load)),
                    Err(e) => {
                        warn!("Load of {} failed: {}", handle, e);
                        Some(Event::Device(DeviceEvent::Error(None, e.to_string())))
                    }
                };
            }
            Effect::Play => {
                if let Err(e) = self.device.play().await {
                    warn!("Resume failed: {}", e);
                }
            }
            Effect::Pause => {
                if let Err(e) = self.device.pause().await {
                    warn!("Pause failed: {}", e);
                }
            }
            Effect::Seek(fraction) => self.seek(fraction).await,
            Effect::StartProgress => self.observer.start(),
            Effect::StopProgress => {
                self.observer.stop();
                self.progress = None;
            }
            Effect::ScheduleRetry { delay, epoch } => {
                debug!("Retry {} in {:?}", epoch, delay);
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Event::RetryDue { epoch });
                });
            }
            Effect::PromptCredentials => {
                let _ = self.notice_tx.send(Notice::CredentialsRejected);
            }
        }
        None
    }

    fn spawn_fetch(&self, ticket: Ticket, purpose: FetchPurpose, request: FetchRequest) {
        debug!(
            "Fetch {} ({:?}) for {:?} with {} history entries",
            ticket,
            purpose,
            request.mood,
            request.history.len()
        );
        let recommender = Arc::clone(&self.recommender);
        let resolver = Arc::clone(&self.resolver);
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let outcome = fetch(recommender.as_ref(), resolver.as_ref(), &request).await;
            let _ = tx.send(Event::Fetched {
                ticket,
                purpose,
                outcome,
            });
        });
    }

    async fn seek(&mut self, fraction: f32) {
        let duration = match self.device.duration().await {
            Ok(d) if !d.is_zero() => d,
            Ok(_) => {
                debug!("Seek ignored: duration unknown");
                return;
            }
            Err(e) => {
                warn!("Seek failed: {}", e);
                return;
            }
        };
        if let Err(e) = self.device.seek(duration.mul_f32(fraction)).await {
            warn!("Seek failed: {}", e);
        }
    }

    async fn sample_progress(&mut self) {
        match self.observer.sample(self.device.as_mut()).await {
            Ok(progress) => {
                if progress != self.progress {
                    self.progress = progress;
                    self.publish();
                }
            }
            Err(e) => debug!("Progress poll failed: {}", e),
        }
    }

    fn publish(&self) {
        let view = self.session.view(self.progress);
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

/// Recommend, then resolve the recommended track.
async fn fetch(
    recommender: &dyn Recommender,
    resolver: &dyn Resolver,
    request: &FetchRequest,
) -> Result<Resolved, FetchFailure> {
    let track = recommender.recommend(&request.mood, &request.history).await?;
    let candidates = resolver.resolve(&track).await?;
    debug!("Resolved {} to {} candidate(s)", track, candidates.len());
    Ok(Resolved { track, candidates })
}
