//! trushna-daemon: Wake-word gated voice command daemon
//!
//! Provides:
//! - A wake-word gate over an external continuous speech recognizer
//! - Deterministic intent classification of finalized commands
//! - Action planning for the assistant front end
//! - IPC server for front end and speech engine communication
//!
//! Not in scope:
//! - Audio capture or speech recognition itself (done by the engine client)
//! - Text-to-speech and generative backends (driven by the front end)

mod config;
mod dispatch;
mod events;
mod intent;
mod ipc;
mod lifecycle;
mod reminder;
mod state;

use anyhow::Result;
use chrono::Local;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::GateEvent;
use crate::intent::{rule_order, IntentKind, RULE_TABLE_VERSION};
use crate::ipc::{DaemonStatus, Notification, RemoteEngine, Server};
use crate::lifecycle::ShutdownSignal;
use crate::state::{GateInput, GateState, WakeWordGate};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "trushna-daemon starting");

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        wake_phrase = ?config.wake_phrase,
        timeout_ms = config.command_timeout.as_millis() as u64,
        "configuration loaded"
    );
    info!(
        version = RULE_TABLE_VERSION,
        kinds = IntentKind::ALL.len(),
        rules = ?rule_order(),
        "intent rule table loaded"
    );

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // IPC clients -> gate
    let (gate_tx, gate_rx) = mpsc::channel::<GateInput>(64);
    // Gate -> event router
    let (event_tx, mut event_rx) = broadcast::channel::<GateEvent>(64);
    // Daemon -> subscribed clients
    let (notify_tx, _) = broadcast::channel::<Notification>(256);

    let engine = RemoteEngine::new(notify_tx.clone(), gate_tx.downgrade());
    let mut gate = WakeWordGate::new(
        config.wake_phrase.as_deref(),
        config.command_timeout,
        engine,
        event_tx,
    );

    let status = DaemonStatus {
        wake_phrase: gate.wake_phrase().map(str::to_owned),
        command_timeout_ms: config.command_timeout.as_millis() as u64,
        ..DaemonStatus::default()
    };
    let server = Server::new(&config.socket_path, status, gate_tx, notify_tx)?;
    let server_for_events = &server;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the gate (processes client and engine input)
        _ = gate.run(gate_rx) => {
            info!("wake word gate exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Route gate events to status, planning and subscribers
        _ = async {
            loop {
                match event_rx.recv().await {
                    Ok(event) => route_event(server_for_events, event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "gate event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("gate event router exited");
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(signal) => info!(signal, "shutdown signal received"),
                Err(e) => error!(?e, "signal handling failed"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    gate.stop();
    server.shutdown().await;

    info!("trushna-daemon stopped");

    Ok(())
}

/// Apply one gate event to the server and forward it to subscribers
async fn route_event(server: &Server, event: GateEvent) {
    match &event {
        GateEvent::StateChanged { session, to, .. } => {
            let session = (*to != GateState::Idle).then_some(*session);
            server.set_gate_state(*to, session).await;
        }
        GateEvent::CommandFinalized { session, text } => {
            let command = intent::classify(text);
            let action = dispatch::plan(&command, Local::now());
            info!(
                %session,
                kind = %command.kind(),
                reply = ?action.reply(),
                "command classified"
            );

            server.record_command().await;
            server.publish(Notification::Gate(event.clone()));
            server.publish(Notification::Command { command, action });
            return;
        }
        GateEvent::WakeDetected { .. }
        | GateEvent::Transcript { .. }
        | GateEvent::Error { .. } => {}
    }

    server.publish(Notification::Gate(event));
}
