/// mpv IPC driver and the `AudioSink` the player talks to.
///
/// Architecture:
///
/// ```text
///   MpvSink::play(url)
///         │
///         └── MpvDriver::spawn_and_connect()   (first use, or after mpv died)
///                 ├── writer_task   ← receives PendingRequest via mpsc, serialises → socket
///                 └── reader_task   ← reads JSON lines from socket
///                                        ├── response (has request_id) → matched oneshot::Sender
///                                        └── event                     → event_tx channel
/// ```
///
/// `play()` awaits mpv's reply to `loadfile`, so a refused source surfaces as
/// a `PlaybackError`. mpv accepts `loadfile` before it opens the URL, so a
/// source that fails later arrives as an `end-file` event instead (see
/// `MpvEvent::load_failure`). `pause()`/`stop()` are fire-and-forget but are
/// queued on the writer channel before they return, so they keep call order.
///
/// Platform notes:
/// - Unix:   Unix domain sockets
/// - Windows: Named pipes  \\.\pipe\<name>
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use podcast_proto::error::PlaybackError;
use podcast_proto::platform;
use podcast_proto::player::AudioSink;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

const IPC_TIMEOUT: Duration = Duration::from_secs(5);

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct PendingRequest {
    req_id: u64,
    payload: String, // serialised JSON line (already has '\n')
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// An unsolicited mpv message (no request_id).
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// Returns the event name, e.g. "end-file", "start-file", "file-loaded".
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }

    fn end_reason(&self) -> Option<&str> {
        if self.event_name() != Some("end-file") {
            return None;
        }
        self.raw.get("reason")?.as_str()
    }

    /// The loaded episode played to its end (not replaced, not stopped).
    pub fn is_end_of_file(&self) -> bool {
        self.end_reason() == Some("eof")
    }

    /// mpv gave up on the loaded source. Returns mpv's `file_error` text when
    /// it sends one.
    pub fn load_failure(&self) -> Option<String> {
        let reason = self.end_reason()?;
        if reason != "error" && reason != "network" {
            return None;
        }
        let detail = self
            .raw
            .get("file_error")
            .and_then(|e| e.as_str())
            .unwrap_or(reason);
        Some(detail.to_string())
    }
}

// ── public handle ─────────────────────────────────────────────────────────────

/// Cloneable handle to the mpv writer task.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

/// A request already on the writer channel, waiting for mpv's reply.
pub struct Queued {
    req_id: u64,
    reply: oneshot::Receiver<anyhow::Result<Value>>,
}

impl Queued {
    pub async fn reply(self) -> anyhow::Result<Value> {
        let req_id = self.req_id;
        tokio::time::timeout(IPC_TIMEOUT, self.reply)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }
}

fn request(command: Value) -> anyhow::Result<(PendingRequest, Queued)> {
    let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
    let msg = json!({ "command": command, "request_id": req_id });
    let mut raw = serde_json::to_string(&msg)?;
    raw.push('\n');

    let (reply_tx, reply_rx) = oneshot::channel();
    let pending = PendingRequest {
        req_id,
        payload: raw,
        reply: reply_tx,
    };
    Ok((pending, Queued { req_id, reply: reply_rx }))
}

impl MpvHandle {
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let (pending, queued) = request(command)?;
        self.tx
            .send(pending)
            .await
            .map_err(|_| anyhow::anyhow!("mpv writer task gone"))?;
        queued.reply().await
    }

    /// Put `command` on the writer channel without yielding. Anything sent
    /// after this returns reaches mpv after it.
    pub fn enqueue(&self, command: Value) -> anyhow::Result<Queued> {
        let (pending, queued) = request(command)?;
        self.tx.try_send(pending).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => anyhow::anyhow!("mpv writer queue full"),
            mpsc::error::TrySendError::Closed(_) => anyhow::anyhow!("mpv writer task gone"),
        })?;
        Ok(queued)
    }

    pub async fn load(&self, url: &str, volume: f32) -> anyhow::Result<()> {
        debug!("mpv: loadfile {}", url);
        self.send(json!(["loadfile", url, "replace"])).await?;
        let vol_pct = (volume * 100.0).clamp(0.0, 100.0);
        let _ = self.send(json!(["set_property", "volume", vol_pct])).await;
        self.set_pause(false).await
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    /// True when mpv has nothing loaded (never started, stopped, or finished).
    pub async fn is_idle(&self) -> anyhow::Result<bool> {
        let resp = self.send(json!(["get_property", "idle-active"])).await?;
        Ok(resp["data"].as_bool().unwrap_or(true))
    }
}

// ── driver ────────────────────────────────────────────────────────────────────

/// Owns the mpv child process. The process is killed when the driver drops.
pub struct MpvDriver {
    socket_name: String,
    process: Option<tokio::process::Child>,
    volume: f32,
}

impl MpvDriver {
    pub fn new(volume: f32) -> Self {
        Self {
            socket_name: platform::mpv_socket_name(),
            process: None,
            volume,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(ref mut child) = self.process else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!("mpv process exited: {}", status);
                false
            }
            Err(e) => {
                warn!("mpv process_alive check failed: {}", e);
                false
            }
        }
    }

    fn spawn_process(&mut self) -> anyhow::Result<()> {
        let mpv_binary =
            platform::find_mpv_binary().ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;

        let vol_arg = format!(
            "--volume={}",
            (self.volume * 100.0).clamp(0.0, 100.0).round() as i64
        );

        let stderr_path = platform::data_dir().join("mpv-stderr.log");
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;
        info!("mpv: logging stderr to {:?}", stderr_path);

        let child = tokio::process::Command::new(&mpv_binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg(platform::mpv_socket_arg())
            .arg("--quiet")
            .arg(vol_arg)
            .stdout(std::process::Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: spawned {:?} pid {:?}", mpv_binary, child.id());
        self.process = Some(child);
        Ok(())
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }

        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        self.spawn_process()?;

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if socket_path.exists() {
                break;
            }
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to IPC socket");
        let (read_half, write_half) = stream.into_split();
        Ok(start_io_tasks(BufReader::new(read_half), write_half, event_tx))
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }

        self.spawn_process()?;

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe_path) {
                info!("mpv: connected to named pipe");
                let (read_half, write_half) = tokio::io::split(client);
                return Ok(start_io_tasks(BufReader::new(read_half), write_half, event_tx));
            }
        }
        anyhow::bail!("mpv named pipe did not appear")
    }
}

fn start_io_tasks<R, W>(
    reader: BufReader<R>,
    writer: W,
    event_tx: mpsc::Sender<MpvEvent>,
) -> MpvHandle
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    // req_id → reply channel. Writer inserts, reader resolves.
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(writer, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(reader, pending, event_tx));

    MpvHandle { tx: cmd_tx }
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, event_tx: mpsc::Sender<MpvEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line).await;
        let closed_reason = match read {
            Ok(0) => "mpv IPC connection closed".to_string(),
            Err(e) => format!("mpv IPC read error: {}", e),
            Ok(_) => {
                route_line(line.trim(), &pending, &event_tx).await;
                continue;
            }
        };

        debug!("mpv reader: {}", closed_reason);
        let mut map = pending.lock().await;
        for (_, tx) in map.drain() {
            let _ = tx.send(Err(anyhow::anyhow!(closed_reason.clone())));
        }
        break;
    }
}

async fn route_line(line: &str, pending: &PendingMap, event_tx: &mpsc::Sender<MpvEvent>) {
    if line.is_empty() {
        return;
    }
    let val: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            debug!("mpv reader: invalid json '{}': {}", line, e);
            return;
        }
    };

    let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) else {
        debug!("mpv reader: event {}", line);
        let _ = event_tx.send(MpvEvent { raw: val }).await;
        return;
    };

    let Some(tx) = pending.lock().await.remove(&req_id) else {
        debug!("mpv reader: response for unknown req={}", req_id);
        return;
    };
    let result = match val["error"].as_str() {
        Some("success") => Ok(val),
        other => Err(anyhow::anyhow!("mpv error: {}", other.unwrap_or("unknown error"))),
    };
    let _ = tx.send(result);
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register before writing so the reader can match the reply
        pending.lock().await.insert(req.req_id, req.reply);
        debug!("mpv writer: send req={} payload={}", req.req_id, req.payload.trim());
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

// ── AudioSink ─────────────────────────────────────────────────────────────────

/// Plays episodes through a lazily spawned mpv.
pub struct MpvSink {
    driver: MpvDriver,
    handle: Option<MpvHandle>,
    event_tx: mpsc::Sender<MpvEvent>,
    loaded_url: Option<String>,
    volume: f32,
}

impl MpvSink {
    pub fn new(volume: f32, event_tx: mpsc::Sender<MpvEvent>) -> Self {
        Self {
            driver: MpvDriver::new(volume),
            handle: None,
            event_tx,
            loaded_url: None,
            volume,
        }
    }

    async fn connected(&mut self) -> anyhow::Result<MpvHandle> {
        if let Some(handle) = &self.handle {
            if self.driver.process_alive() {
                return Ok(handle.clone());
            }
            warn!("mpv: process gone, respawning");
        }
        let handle = self.driver.spawn_and_connect(self.event_tx.clone()).await?;
        self.handle = Some(handle.clone());
        self.loaded_url = None;
        Ok(handle)
    }

    async fn start(&mut self, url: &str) -> anyhow::Result<()> {
        let handle = self.connected().await?;

        // Same episode still loaded: resume where it was paused
        if self.loaded_url.as_deref() == Some(url) && !handle.is_idle().await? {
            debug!("mpv: resuming {}", url);
            return handle.set_pause(false).await;
        }

        handle.load(url, self.volume).await?;
        self.loaded_url = Some(url.to_string());
        Ok(())
    }

    /// Queue `command` now; only the wait for mpv's reply runs detached.
    fn fire(&self, what: &'static str, command: Value) {
        let Some(handle) = &self.handle else {
            return;
        };
        let queued = match handle.enqueue(command) {
            Ok(queued) => queued,
            Err(e) => {
                warn!("mpv: {} failed: {}", what, e);
                return;
            }
        };
        tokio::spawn(async move {
            if let Err(e) = queued.reply().await {
                warn!("mpv: {} failed: {}", what, e);
            }
        });
    }
}

impl AudioSink for MpvSink {
    async fn play(&mut self, url: &str) -> Result<(), PlaybackError> {
        self.start(url)
            .await
            .map_err(|e| PlaybackError::new(format!("{:#}", e)))
    }

    fn pause(&mut self) {
        self.fire("pause", json!(["set_property", "pause", true]));
    }

    fn stop(&mut self) {
        self.loaded_url = None;
        self.fire("stop", json!(["stop"]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_file_detection() {
        let eof = MpvEvent {
            raw: json!({"event": "end-file", "reason": "eof", "playlist_entry_id": 1}),
        };
        let replaced = MpvEvent {
            raw: json!({"event": "end-file", "reason": "stop"}),
        };
        let started = MpvEvent {
            raw: json!({"event": "start-file"}),
        };
        assert!(eof.is_end_of_file());
        assert!(!replaced.is_end_of_file());
        assert!(!started.is_end_of_file());
        assert_eq!(started.event_name(), Some("start-file"));
        assert_eq!(eof.load_failure(), None);
        assert_eq!(replaced.load_failure(), None);
    }

    #[test]
    fn test_load_failure_detection() {
        let unplayable = MpvEvent {
            raw: json!({"event": "end-file", "reason": "error", "file_error": "unrecognized file format"}),
        };
        let unreachable = MpvEvent {
            raw: json!({"event": "end-file", "reason": "network"}),
        };
        let bare_error = MpvEvent {
            raw: json!({"event": "end-file", "reason": "error"}),
        };
        assert_eq!(unplayable.load_failure().as_deref(), Some("unrecognized file format"));
        assert_eq!(unreachable.load_failure().as_deref(), Some("network"));
        assert_eq!(bare_error.load_failure().as_deref(), Some("error"));
        assert!(!unplayable.is_end_of_file());
    }

    #[tokio::test]
    async fn test_reply_routed_by_request_id() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let (ok_tx, ok_rx) = oneshot::channel();
        let (err_tx, err_rx) = oneshot::channel();
        pending.lock().await.insert(7, ok_tx);
        pending.lock().await.insert(8, err_tx);

        route_line(r#"{"request_id":7,"error":"success","data":true}"#, &pending, &event_tx).await;
        route_line(r#"{"request_id":8,"error":"loading failed"}"#, &pending, &event_tx).await;
        route_line(r#"{"event":"end-file","reason":"eof"}"#, &pending, &event_tx).await;
        route_line("not json", &pending, &event_tx).await;

        assert_eq!(ok_rx.await.unwrap().unwrap()["data"], true);
        let err = err_rx.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("loading failed"));
        assert!(event_rx.recv().await.unwrap().is_end_of_file());
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_pause_is_queued_before_a_quick_resume() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(8);
        let (event_tx, _event_rx) = mpsc::channel(1);
        let mut sink = MpvSink::new(0.5, event_tx);
        let handle = MpvHandle { tx: cmd_tx };
        sink.handle = Some(handle.clone());

        sink.pause();
        let resume = tokio::spawn(async move { handle.set_pause(false).await });
        tokio::task::yield_now().await;

        let first = cmd_rx.recv().await.unwrap();
        let second = cmd_rx.recv().await.unwrap();
        assert!(first.payload.contains(r#"["set_property","pause",true]"#), "{}", first.payload);
        assert!(second.payload.contains(r#"["set_property","pause",false]"#), "{}", second.payload);

        let _ = second.reply.send(Ok(json!({"error": "success"})));
        assert!(resume.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_pause_without_mpv_is_noop() {
        let (event_tx, _event_rx) = mpsc::channel(1);
        let mut sink = MpvSink::new(0.5, event_tx);
        sink.pause();
        sink.stop();
        assert!(sink.handle.is_none());
        assert!(sink.loaded_url.is_none());
    }
}
