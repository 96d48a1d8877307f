//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications for
//! gate events, planned commands and engine directives to subscribed
//! clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::dispatch;
use crate::intent;
use crate::state::{GateInput, GateState, SessionToken};

use super::framing::{read_frame, write_message};
use super::protocol::{DaemonStatus, Notification, Request, Response};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    context: ClientContext,
    shutdown_tx: broadcast::Sender<()>,
}

/// Shared server state
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

/// Everything a client handler needs
#[derive(Clone)]
struct ClientContext {
    state: Arc<RwLock<ServerState>>,
    gate_tx: mpsc::Sender<GateInput>,
    notify_tx: broadcast::Sender<Notification>,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        status: DaemonStatus,
        gate_tx: mpsc::Sender<GateInput>,
        notify_tx: broadcast::Sender<Notification>,
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
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))
                .context("failed to restrict socket permissions")?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status,
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            context: ClientContext {
                state,
                gate_tx,
                notify_tx,
            },
            shutdown_tx,
        })
    }

    /// Update the gate state reported by `get_status`
    pub async fn set_gate_state(&self, state: GateState, session: Option<SessionToken>) {
        let mut server_state = self.context.state.write().await;
        let old_state = server_state.status.state;
        server_state.status.state = state;
        server_state.status.session = session;

        if old_state != state {
            debug!(from = %old_state, to = %state, "IPC server: gate state updated");
        }
    }

    /// Count a finalized command
    pub async fn record_command(&self) {
        self.context.state.write().await.status.commands_finalized += 1;
    }

    /// Push a notification to every subscribed client
    pub fn publish(&self, notification: Notification) {
        if self.context.notify_tx.send(notification).is_err() {
            debug!("no subscribed clients");
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let context = self.context.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, context) => {
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
    async fn handle_client(stream: UnixStream, context: ClientContext) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        // Frames are read on their own task so that a partially received
        // request is never dropped while a notification is being sent
        let (frame_tx, mut frame_rx) = mpsc::channel::<Vec<u8>>(16);
        let read_task = tokio::spawn(async move {
            loop {
                match read_frame(&mut reader).await {
                    Ok(Some(frame)) => {
                        if frame_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("client disconnected");
                        break;
                    }
                    Err(e) => {
                        warn!(?e, "dropping client after framing error");
                        break;
                    }
                }
            }
        });

        let mut notify_rx: Option<broadcast::Receiver<Notification>> = None;

        let result = loop {
            tokio::select! {
                frame = frame_rx.recv() => {
                    let Some(frame) = frame else {
                        break Ok(());
                    };

                    let response = match serde_json::from_slice::<Request>(&frame) {
                        Ok(request) => {
                            debug!(?request, "received request");
                            if request == Request::Subscribe && notify_rx.is_none() {
                                notify_rx = Some(context.notify_tx.subscribe());
                                debug!("client subscribed to notifications");
                            }
                            Self::process_request(request, &context).await
                        }
                        Err(e) => {
                            debug!(?e, "malformed request");
                            Response::error("bad_request", e.to_string())
                        }
                    };

                    if let Err(e) = write_message(&mut writer, &response).await {
                        break Err(e);
                    }
                }

                notification = next_notification(&mut notify_rx), if notify_rx.is_some() => {
                    match notification {
                        Ok(notification) => {
                            if let Err(e) = write_message(&mut writer, &notification).await {
                                break Err(e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "subscriber lagged, notifications dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            notify_rx = None;
                        }
                    }
                }
            }
        };

        read_task.abort();
        result
    }

    /// Process a request and return a response
    async fn process_request(request: Request, context: &ClientContext) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = context.state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Subscribe => Response::Subscribed,

            Request::Classify { text } => {
                let command = intent::classify(&text);
                let action = dispatch::plan(&command, Local::now());
                info!(kind = %command.kind(), "classified via IPC");
                Response::Classified { command, action }
            }

            request => match request.into_gate_input() {
                Some(input) => match context.gate_tx.send(input).await {
                    Ok(()) => Response::Accepted,
                    Err(_) => Response::error("gate_unavailable", "wake word gate is not running"),
                },
                None => Response::error("bad_request", "unsupported request"),
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

async fn next_notification(
    notify_rx: &mut Option<broadcast::Receiver<Notification>>,
) -> Result<Notification, broadcast::error::RecvError> {
    match notify_rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
