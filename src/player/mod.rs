//! Playback device abstraction and progress observation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Scheduler (event loop)                       │
//! │   issues load/play/pause/seek, polls position while active      │
//! └───────────────┬─────────────────────────────────▲───────────────┘
//!                 │ PlaybackDevice (async calls)    │ DeviceEvent (mpsc)
//!                 ▼                                 │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Device implementation (mpv)                    │
//! │      JSON IPC over a Unix socket, events from a reader task     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Devices report asynchronous happenings (ready, playing, ended, error)
//! on an inbound channel rather than through callbacks, so the scheduler
//! can treat them as ordinary events. End and error reports name the
//! [`LoadId`] they belong to when the device knows it, so a report about
//! media that has since been replaced can be told apart from one about the
//! active media.

#[cfg(unix)]
pub mod mpv;
mod progress;
mod state;

pub use progress::ProgressObserver;
pub use state::{Progress, format_duration};

use async_trait::async_trait;
use std::time::Duration;

use crate::model::MediaHandle;

/// Device-assigned identity of one `load`.
pub type LoadId = u64;

/// Something the device reports without being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Device can accept `load` calls
    Ready,
    /// Audio is flowing
    Playing,
    /// Playback was paused
    Paused,
    /// Media played to its natural end
    Ended(Option<LoadId>),
    /// Media failed to load or play
    Error(Option<LoadId>, String),
}

/// A media playback device.
///
/// `load` replaces whatever is active and starts playback immediately. It
/// returns the id later end and error reports will carry, if the device
/// tracks one.
#[async_trait]
pub trait PlaybackDevice: Send {
    async fn load(&mut self, handle: &MediaHandle) -> Result<Option<LoadId>, DeviceError>;
    async fn play(&mut self) -> Result<(), DeviceError>;
    async fn pause(&mut self) -> Result<(), DeviceError>;
    async fn seek(&mut self, position: Duration) -> Result<(), DeviceError>;
    /// Playback position of the active media (zero when nothing is loaded)
    async fn current_time(&mut self) -> Result<Duration, DeviceError>;
    /// Total length of the active media (zero when unknown)
    async fn duration(&mut self) -> Result<Duration, DeviceError>;
}

/// Device errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to start player: {0}")]
    Spawn(String),

    #[error("Player connection closed")]
    Disconnected,

    #[error("Player did not answer in time")]
    Timeout,

    #[error("Player rejected command: {0}")]
    Command(String),

    #[error("Player IO error: {0}")]
    Io(String),
}

/// In-memory device for scheduler tests.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// A call the scheduler made on the device.
    #[derive(Debug, Clone, PartialEq)]
    pub enum DeviceCall {
        Load(String),
        Play,
        Pause,
        Seek(Duration),
    }

    #[derive(Debug, Default)]
    struct Shared {
        calls: Vec<DeviceCall>,
        position: Duration,
        duration: Duration,
        failing_loads: usize,
    }

    /// Records every call; position, duration and load failures are set
    /// through the [`FakeDeviceHandle`]. Successful loads get ids 1, 2, 3...
    /// counting every attempted load.
    pub struct FakeDevice {
        shared: Arc<Mutex<Shared>>,
    }

    /// Test-side view into a [`FakeDevice`].
    #[derive(Clone)]
    pub struct FakeDeviceHandle {
        shared: Arc<Mutex<Shared>>,
    }

    impl FakeDevice {
        pub fn new() -> (Self, FakeDeviceHandle) {
            let shared = Arc::new(Mutex::new(Shared::default()));
            (
                Self {
                    shared: Arc::clone(&shared),
                },
                FakeDeviceHandle { shared },
            )
        }
    }

    impl FakeDeviceHandle {
        pub fn calls(&self) -> Vec<DeviceCall> {
            self.shared.lock().calls.clone()
        }

        /// Handles passed to `load`, in order.
        pub fn loads(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    DeviceCall::Load(h) => Some(h),
                    _ => None,
                })
                .collect()
        }

        pub fn set_timeline(&self, position: Duration, duration: Duration) {
            let mut shared = self.shared.lock();
            shared.position = position;
            shared.duration = duration;
        }

        /// Make the next `count` loads fail.
        pub fn fail_loads(&self, count: usize) {
            self.shared.lock().failing_loads = count;
        }
    }

    #[async_trait]
    impl PlaybackDevice for FakeDevice {
        async fn load(&mut self, handle: &MediaHandle) -> Result<Option<LoadId>, DeviceError> {
            let mut shared = self.shared.lock();
            shared
                .calls
                .push(DeviceCall::Load(handle.as_str().to_string()));
            if shared.failing_loads > 0 {
                shared.failing_loads -= 1;
                return Err(DeviceError::Command("loading failed".to_string()));
            }
            let attempts = shared
                .calls
                .iter()
                .filter(|c| matches!(c, DeviceCall::Load(_)))
                .count();
            Ok(Some(attempts as LoadId))
        }

        async fn play(&mut self) -> Result<(), DeviceError> {
            self.shared.lock().calls.push(DeviceCall::Play);
            Ok(())
        }

        async fn pause(&mut self) -> Result<(), DeviceError> {
            self.shared.lock().calls.push(DeviceCall::Pause);
            Ok(())
        }

        async fn seek(&mut self, position: Duration) -> Result<(), DeviceError> {
            self.shared.lock().calls.push(DeviceCall::Seek(position));
            Ok(())
        }

        async fn current_time(&mut self) -> Result<Duration, DeviceError> {
            Ok(self.shared.lock().position)
        }

        async fn duration(&mut self) -> Result<Duration, DeviceError> {
            Ok(self.shared.lock().duration)
        }
    }
}
