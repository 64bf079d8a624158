//! mpv playback device over JSON IPC.
//!
//! mpv runs idle with `--input-ipc-server` pointing at a per-process Unix
//! socket. Commands are newline-delimited JSON objects tagged with a
//! `request_id`; replies carry the same id. Unsolicited lines carry an
//! `event` field and are translated into [`DeviceEvent`]s by a reader task.
//!
//! YouTube URLs are handed straight to mpv, which resolves them through
//! its youtube-dl/yt-dlp hook.
//!
//! `loadfile` replies with the new playlist entry's id (mpv 0.33+), and
//! `end-file` events carry the id of the entry that ended. That id is the
//! device's [`LoadId`].
//!
//! Protocol docs: https://mpv.io/manual/stable/#json-ipc

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{DeviceError, DeviceEvent, LoadId, PlaybackDevice};
use crate::config::PlayerConfig;
use crate::model::MediaHandle;

/// Observation id for the `pause` property
const OBS_PAUSE: u64 = 1;

/// How long to wait for mpv to create its IPC socket
const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

type PendingReplies = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// A running mpv process driven over IPC.
pub struct MpvDevice {
    child: Child,
    writer: OwnedWriteHalf,
    pending: PendingReplies,
    next_request_id: u64,
    reader: JoinHandle<()>,
    socket_path: PathBuf,
}

impl MpvDevice {
    /// Start mpv and connect to it. Emits [`DeviceEvent::Ready`] once usable.
    pub async fn spawn(
        config: &PlayerConfig,
        events: mpsc::Sender<DeviceEvent>,
    ) -> Result<Self, DeviceError> {
        let socket_path =
            std::env::temp_dir().join(format!("livedj-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        info!("Starting {:?} with IPC socket {:?}", config.mpv_path, socket_path);
        let mut child = Command::new(&config.mpv_path)
            .arg("--idle=yes")
            .arg("--no-video")
            .arg("--no-terminal")
            .arg("--ytdl-format=bestaudio/best")
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .args(&config.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DeviceError::Spawn(format!("{}: {}", config.mpv_path.display(), e)))?;

        let stream = connect(&mut child, &socket_path).await?;
        let (read_half, writer) = stream.into_split();
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_loop(read_half, Arc::clone(&pending), events.clone()));

        let mut device = Self {
            child,
            writer,
            pending,
            next_request_id: 1,
            reader,
            socket_path,
        };

        device
            .request(json!(["observe_property", OBS_PAUSE, "pause"]))
            .await?;
        events
            .send(DeviceEvent::Ready)
            .await
            .map_err(|_| DeviceError::Disconnected)?;

        Ok(device)
    }

    /// Send one command and wait for its reply's `data`.
    async fn request(&mut self, command: Value) -> Result<Value, DeviceError> {
        let id = self.next_request_id;
        self.next_request_id += 1;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let mut line = json!({ "command": command, "request_id": id }).to_string();
        line.push('\n');
        if let Err(e) = self.writer.write_all(line.as_bytes()).await {
            self.pending.lock().remove(&id);
            return Err(DeviceError::Io(e.to_string()));
        }

        let reply = match tokio::time::timeout(REPLY_TIMEOUT, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(DeviceError::Disconnected),
            Err(_) => {
                self.pending.lock().remove(&id);
                return Err(DeviceError::Timeout);
            }
        };

        match reply.get("error").and_then(Value::as_str) {
            Some("success") => Ok(reply.get("data").cloned().unwrap_or(Value::Null)),
            Some(other) => Err(DeviceError::Command(other.to_string())),
            None => Err(DeviceError::Command("malformed reply".to_string())),
        }
    }

    /// Read a time property in seconds. Unavailable (nothing loaded) reads as zero.
    async fn seconds_property(&mut self, name: &str) -> Result<Duration, DeviceError> {
        match self.request(json!(["get_property", name])).await {
            Ok(value) => Ok(value
                .as_f64()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .unwrap_or(Duration::ZERO)),
            Err(DeviceError::Command(msg)) if msg == "property unavailable" => Ok(Duration::ZERO),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl PlaybackDevice for MpvDevice {
    async fn load(&mut self, handle: &MediaHandle) -> Result<Option<LoadId>, DeviceError> {
        debug!("mpv: loadfile {}", handle);
        let reply = self
            .request(json!(["loadfile", handle.as_str(), "replace"]))
            .await?;
        self.request(json!(["set_property", "pause", false])).await?;
        Ok(entry_id(&reply))
    }

    async fn play(&mut self) -> Result<(), DeviceError> {
        self.request(json!(["set_property", "pause", false])).await?;
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), DeviceError> {
        self.request(json!(["set_property", "pause", true])).await?;
        Ok(())
    }

    async fn seek(&mut self, position: Duration) -> Result<(), DeviceError> {
        self.request(json!(["seek", position.as_secs_f64(), "absolute"]))
            .await?;
        Ok(())
    }

    async fn current_time(&mut self) -> Result<Duration, DeviceError> {
        self.seconds_property("time-pos").await
    }

    async fn duration(&mut self) -> Result<Duration, DeviceError> {
        self.seconds_property("duration").await
    }
}

impl Drop for MpvDevice {
    fn drop(&mut self) {
        self.reader.abort();
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Wait for mpv to create its socket, bailing out if the process exits first.
async fn connect(child: &mut Child, socket_path: &Path) -> Result<UnixStream, DeviceError> {
    for _ in 0..CONNECT_ATTEMPTS {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(DeviceError::Spawn(format!("mpv exited early ({})", status)));
        }
        match UnixStream::connect(socket_path).await {
            Ok(stream) => return Ok(stream),
            Err(_) => tokio::time::sleep(CONNECT_BACKOFF).await,
        }
    }
    Err(DeviceError::Spawn("mpv IPC socket did not appear".to_string()))
}

/// Route replies to waiting requests and translate events.
async fn read_loop(
    read_half: OwnedReadHalf,
    pending: PendingReplies,
    events: mpsc::Sender<DeviceEvent>,
) {
    let mut lines = BufReader::new(read_half).lines();
    let mut mapper = EventMapper::default();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("mpv: IPC connection closed");
                break;
            }
            Err(e) => {
                warn!("mpv: IPC read failed: {}", e);
                break;
            }
        };

        let Ok(value) = serde_json::from_str::<Value>(&line) else {
            debug!("mpv: ignoring non-JSON line {:?}", line);
            continue;
        };

        if let Some(id) = value.get("request_id").and_then(Value::as_u64) {
            if let Some(tx) = pending.lock().remove(&id) {
                let _ = tx.send(value);
            }
            continue;
        }

        if let Some(event) = mapper.map(&value) {
            debug!("mpv: {:?}", event);
            if events.send(event).await.is_err() {
                break;
            }
        }
    }
}

/// Translates raw mpv events, tracking pause so a seek while paused
/// (which also fires `playback-restart`) is not reported as playing.
#[derive(Debug, Default)]
struct EventMapper {
    paused: bool,
}

impl EventMapper {
    fn map(&mut self, value: &Value) -> Option<DeviceEvent> {
        match value.get("event").and_then(Value::as_str)? {
            "playback-restart" if !self.paused => Some(DeviceEvent::Playing),
            "property-change" if value.get("name").and_then(Value::as_str) == Some("pause") => {
                let paused = value.get("data").and_then(Value::as_bool)?;
                if paused == self.paused {
                    return None;
                }
                self.paused = paused;
                Some(if paused {
                    DeviceEvent::Paused
                } else {
                    DeviceEvent::Playing
                })
            }
            "end-file" => match value.get("reason").and_then(Value::as_str) {
                Some("eof") => Some(DeviceEvent::Ended(entry_id(value))),
                Some("error") => Some(DeviceEvent::Error(
                    entry_id(value),
                    value
                        .get("file_error")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                )),
                _ => None,
            },
            _ => None,
        }
    }
}

fn entry_id(value: &Value) -> Option<LoadId> {
    value.get("playlist_entry_id").and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_all(lines: &[&str]) -> Vec<DeviceEvent> {
        let mut mapper = EventMapper::default();
        lines
            .iter()
            .filter_map(|l| mapper.map(&serde_json::from_str(l).unwrap()))
            .collect()
    }

    #[test]
    fn test_end_file_reasons() {
        let events = map_all(&[
            r#"{"event": "end-file", "reason": "stop", "playlist_entry_id": 1}"#,
            r#"{"event": "end-file", "reason": "eof", "playlist_entry_id": 2}"#,
            r#"{"event": "end-file", "reason": "error", "file_error": "loading failed"}"#,
        ]);
        assert_eq!(
            events,
            vec![
                DeviceEvent::Ended(Some(2)),
                DeviceEvent::Error(None, "loading failed".to_string())
            ]
        );
    }

    #[test]
    fn test_loadfile_reply_entry_id() {
        assert_eq!(entry_id(&json!({ "playlist_entry_id": 7 })), Some(7));
        assert_eq!(entry_id(&Value::Null), None);
    }

    #[test]
    fn test_pause_tracking() {
        let events = map_all(&[
            r#"{"event": "playback-restart"}"#,
            r#"{"event": "property-change", "id": 1, "name": "pause", "data": true}"#,
            r#"{"event": "playback-restart"}"#,
            r#"{"event": "property-change", "id": 1, "name": "pause", "data": false}"#,
            r#"{"event": "property-change", "id": 1, "name": "pause", "data": false}"#,
        ]);
        assert_eq!(
            events,
            vec![DeviceEvent::Playing, DeviceEvent::Paused, DeviceEvent::Playing]
        );
    }

    #[test]
    fn test_unrelated_events_ignored() {
        let events = map_all(&[
            r#"{"event": "start-file", "playlist_entry_id": 1}"#,
            r#"{"event": "file-loaded"}"#,
            r#"{"event": "property-change", "name": "volume", "data": 50}"#,
            r#"{"event": "idle"}"#,
        ]);
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_fails() {
        let config = PlayerConfig {
            mpv_path: PathBuf::from("/nonexistent/livedj-test-mpv"),
            extra_args: vec![],
        };
        let (tx, _rx) = mpsc::channel(4);
        assert!(matches!(
            MpvDevice::spawn(&config, tx).await,
            Err(DeviceError::Spawn(_))
        ));
    }
}
