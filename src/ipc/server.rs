//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications of
//! session events to subscribed clients. Submissions and mute changes are
//! forwarded to the dialogue controller; status and transcript are served
//! from a view kept current by [`Server::track`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::chat::ChatEntry;
use crate::events::SessionEvent;
use crate::session::KioskInput;

use super::protocol::{KioskStatus, Notification, Request, Response};

const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Shared,
    shutdown_tx: broadcast::Sender<()>,
}

/// State handed to every client handler
#[derive(Clone)]
struct Shared {
    view: Arc<RwLock<SessionView>>,
    inputs: mpsc::Sender<KioskInput>,
    events: broadcast::Sender<SessionEvent>,
}

/// The server's mirror of the session
struct SessionView {
    status: KioskStatus,
    transcript: Vec<ChatEntry>,
    start_time: std::time::Instant,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        initial: KioskStatus,
        inputs: mpsc::Sender<KioskInput>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let view = Arc::new(RwLock::new(SessionView {
            status: initial,
            transcript: Vec::new(),
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared: Shared {
                view,
                inputs,
                events,
            },
            shutdown_tx,
        })
    }

    /// Fold a session event into the served status and transcript
    pub async fn track(&self, event: &SessionEvent) {
        let mut view = self.shared.view.write().await;
        match event {
            SessionEvent::StageChanged { from, to } => {
                view.status.stage = *to;
                info!(%from, %to, "IPC server: stage updated");
            }
            SessionEvent::ClipStarted { topic, .. } => {
                view.status.speaking = true;
                view.status.active_topic = Some(topic.clone());
            }
            SessionEvent::ClipFinished { .. } | SessionEvent::PlaybackFailed { .. } => {
                view.status.speaking = false;
                view.status.active_topic = None;
            }
            SessionEvent::ChatAppended { entry } => {
                view.transcript.push(entry.clone());
                view.status.chat_entries = view.transcript.len();
            }
            SessionEvent::MuteChanged { muted } => {
                view.status.muted = *muted;
            }
            SessionEvent::TopicUnavailable { .. } | SessionEvent::Typing { .. } => {}
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = self.shared.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        tokio::select! {
                            result = Self::handle_client(reader, writer, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client<R, W>(mut reader: R, writer: W, shared: Shared) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let writer = Arc::new(Mutex::new(writer));
        let mut forwarder: Option<tokio::task::JoinHandle<()>> = None;

        let result = loop {
            let msg_buf = match read_message(&mut reader).await {
                Ok(Some(buf)) => buf,
                Ok(None) => {
                    debug!("client disconnected");
                    break Ok(());
                }
                Err(e) => break Err(e),
            };

            let mut subscribe = false;
            let response = match serde_json::from_slice::<Request>(&msg_buf) {
                Ok(request) => {
                    debug!(?request, "received request");
                    subscribe = matches!(request, Request::Subscribe);
                    Self::process_request(request, &shared).await
                }
                Err(e) => {
                    warn!(?e, "failed to parse request");
                    Response::Error {
                        code: "bad_request".to_string(),
                        message: e.to_string(),
                    }
                }
            };

            // The reply must be on the wire before any notification.
            let events = (subscribe && forwarder.is_none()).then(|| shared.events.subscribe());
            {
                let mut writer = writer.lock().await;
                if let Err(e) = write_message(&mut *writer, &response).await {
                    break Err(e);
                }
            }

            if let Some(events) = events {
                debug!("client subscribed to notifications");
                forwarder = Some(tokio::spawn(forward_events(events, Arc::clone(&writer))));
            }
        };

        if let Some(forwarder) = forwarder {
            forwarder.abort();
        }
        result
    }

    /// Process a request and return a response
    async fn process_request(request: Request, shared: &Shared) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut view = shared.view.write().await;
                view.status.uptime_secs = view.start_time.elapsed().as_secs();
                Response::Status(view.status.clone())
            }

            Request::GetTranscript => {
                let view = shared.view.read().await;
                Response::Transcript {
                    entries: view.transcript.clone(),
                }
            }

            Request::Submit { text } => {
                if text.trim().is_empty() {
                    return Response::Error {
                        code: "empty_input".to_string(),
                        message: "nothing to submit".to_string(),
                    };
                }
                Self::forward(shared, KioskInput::Submit(text), Response::Accepted).await
            }

            Request::SetMuted { muted } => {
                info!(muted, "mute set via IPC");
                Self::forward(shared, KioskInput::SetMuted(muted), Response::Muted { muted }).await
            }

            // The controller flips the switch; the new value arrives as MuteChanged.
            Request::ToggleMute => {
                info!("mute toggled via IPC");
                Self::forward(shared, KioskInput::ToggleMute, Response::Accepted).await
            }

            Request::Subscribe => Response::Subscribed,
        }
    }

    async fn forward(shared: &Shared, input: KioskInput, ok: Response) -> Response {
        match shared.inputs.send(input).await {
            Ok(()) => ok,
            Err(_) => Response::Error {
                code: "unavailable".to_string(),
                message: "dialogue controller is not running".to_string(),
            },
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Push session events to a subscribed client until it goes away
async fn forward_events<W>(mut events: broadcast::Receiver<SessionEvent>, writer: Arc<Mutex<W>>)
where
    W: AsyncWrite + Unpin,
{
    loop {
        match events.recv().await {
            Ok(event) => {
                let notification = Notification::SessionEvent { event };
                let mut writer = writer.lock().await;
                if write_message(&mut *writer, &notification).await.is_err() {
                    debug!("subscriber gone");
                    return;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

/// Read one length-prefixed message; `None` on clean disconnect
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        anyhow::bail!("message too large: {len} bytes");
    }

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;
    Ok(Some(msg_buf))
}

/// Send a length-prefixed JSON message
pub async fn write_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TopicId;
    use crate::session::Stage;
    use tokio::net::UnixStream;

    struct Harness {
        server: Arc<Server>,
        inputs_rx: mpsc::Receiver<KioskInput>,
        events_tx: broadcast::Sender<SessionEvent>,
        socket: PathBuf,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("kiosk.sock");
        let (inputs_tx, inputs_rx) = mpsc::channel(8);
        let (events_tx, _) = broadcast::channel(16);
        let server = Server::new(&socket, KioskStatus::new(true), inputs_tx, events_tx.clone()).unwrap();
        Harness {
            server: Arc::new(server),
            inputs_rx,
            events_tx,
            socket,
            _dir: dir,
        }
    }

    async fn roundtrip(stream: &mut UnixStream, request: &Request) -> serde_json::Value {
        write_message(stream, request).await.unwrap();
        let buf = read_message(stream).await.unwrap().unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    fn serve(server: &Arc<Server>) {
        let server = Arc::clone(server);
        tokio::spawn(async move {
            let _ = server.run().await;
        });
    }

    #[tokio::test]
    async fn test_ping() {
        let h = harness();
        serve(&h.server);

        let mut stream = UnixStream::connect(&h.socket).await.unwrap();
        let reply = roundtrip(&mut stream, &Request::Ping).await;
        assert_eq!(reply["type"], "pong");
    }

    #[tokio::test]
    async fn test_submit_is_forwarded() {
        let mut h = harness();
        serve(&h.server);

        let mut stream = UnixStream::connect(&h.socket).await.unwrap();
        let reply = roundtrip(
            &mut stream,
            &Request::Submit {
                text: "12345".to_string(),
            },
        )
        .await;
        assert_eq!(reply["type"], "accepted");
        assert_eq!(
            h.inputs_rx.recv().await,
            Some(KioskInput::Submit("12345".to_string()))
        );

        let reply = roundtrip(
            &mut stream,
            &Request::Submit {
                text: "  ".to_string(),
            },
        )
        .await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["code"], "empty_input");
    }

    #[tokio::test]
    async fn test_each_toggle_is_forwarded_to_controller() {
        let mut h = harness();
        serve(&h.server);

        let mut stream = UnixStream::connect(&h.socket).await.unwrap();
        let first = roundtrip(&mut stream, &Request::ToggleMute).await;
        let second = roundtrip(&mut stream, &Request::ToggleMute).await;
        assert_eq!(first["type"], "accepted");
        assert_eq!(second["type"], "accepted");

        assert_eq!(h.inputs_rx.recv().await, Some(KioskInput::ToggleMute));
        assert_eq!(h.inputs_rx.recv().await, Some(KioskInput::ToggleMute));
    }

    #[tokio::test]
    async fn test_set_muted_is_forwarded() {
        let mut h = harness();
        serve(&h.server);

        let mut stream = UnixStream::connect(&h.socket).await.unwrap();
        let reply = roundtrip(&mut stream, &Request::SetMuted { muted: false }).await;
        assert_eq!(reply["type"], "muted");
        assert_eq!(reply["muted"], false);
        assert_eq!(h.inputs_rx.recv().await, Some(KioskInput::SetMuted(false)));
    }

    #[tokio::test]
    async fn test_status_and_transcript_follow_events() {
        let h = harness();
        serve(&h.server);

        h.server
            .track(&SessionEvent::StageChanged {
                from: Stage::Greeting,
                to: Stage::AwaitingZip,
            })
            .await;
        h.server
            .track(&SessionEvent::ClipStarted {
                topic: TopicId::from("zip"),
                looped: false,
                muted: true,
            })
            .await;
        h.server
            .track(&SessionEvent::ChatAppended {
                entry: ChatEntry::user("12345"),
            })
            .await;

        let mut stream = UnixStream::connect(&h.socket).await.unwrap();
        let status = roundtrip(&mut stream, &Request::GetStatus).await;
        assert_eq!(status["stage"], "awaiting_zip");
        assert_eq!(status["speaking"], true);
        assert_eq!(status["active_topic"], "zip");
        assert_eq!(status["chat_entries"], 1);

        let transcript = roundtrip(&mut stream, &Request::GetTranscript).await;
        assert_eq!(transcript["entries"][0]["text"], "12345");
        assert_eq!(transcript["entries"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let h = harness();
        serve(&h.server);

        let mut stream = UnixStream::connect(&h.socket).await.unwrap();
        let reply = roundtrip(&mut stream, &Request::Subscribe).await;
        assert_eq!(reply["type"], "subscribed");

        h.events_tx
            .send(SessionEvent::MuteChanged { muted: false })
            .unwrap();

        let buf = read_message(&mut stream).await.unwrap().unwrap();
        let notification: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(notification["type"], "session_event");
        assert_eq!(notification["event"]["type"], "mute_changed");
    }

    #[tokio::test]
    async fn test_subscribe_reply_precedes_notifications() {
        let h = harness();
        serve(&h.server);

        let events_tx = h.events_tx.clone();
        let publisher = tokio::spawn(async move {
            loop {
                let _ = events_tx.send(SessionEvent::Typing { active: true });
                tokio::task::yield_now().await;
            }
        });

        let mut stream = UnixStream::connect(&h.socket).await.unwrap();
        let reply = roundtrip(&mut stream, &Request::Subscribe).await;
        assert_eq!(reply["type"], "subscribed");

        let buf = read_message(&mut stream).await.unwrap().unwrap();
        let notification: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(notification["event"]["type"], "typing");

        publisher.abort();
    }

    #[tokio::test]
    async fn test_malformed_request_gets_error() {
        let h = harness();
        serve(&h.server);

        let mut stream = UnixStream::connect(&h.socket).await.unwrap();
        write_message(&mut stream, &serde_json::json!({"type": "dance"}))
            .await
            .unwrap();
        let buf = read_message(&mut stream).await.unwrap().unwrap();
        let reply: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(reply["code"], "bad_request");
    }
}
