//! Progress observer - polls playback position while a track is active.
//!
//! Purely derived: it reads the device and produces [`Progress`] snapshots,
//! never touching scheduling state. The owner must `stop()` it before a slot
//! promotion so no position is reported against a handle being replaced.

use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

use super::{DeviceError, PlaybackDevice, Progress};

pub struct ProgressObserver {
    period: Duration,
    interval: Option<Interval>,
}

impl ProgressObserver {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Begin polling. Restarting an active observer resets its cadence.
    pub fn start(&mut self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    /// Resolves at the next poll time; never resolves while stopped.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Read the device's position; `None` while its duration is unknown.
    pub async fn sample(
        &self,
        device: &mut dyn PlaybackDevice,
    ) -> Result<Option<Progress>, DeviceError> {
        let position = device.current_time().await?;
        let duration = device.duration().await?;
        Ok(Progress::new(position, duration))
    }
}
