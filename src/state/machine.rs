//! Core wake-word gate implementation
//!
//! Consumes recognizer events and command timeouts and decides when
//! recognized text becomes a command. All mutable state lives in one
//! `WakeWordGate` owned by a single task; inputs are serialized through
//! its channel and the timeout deadline is awaited in the same loop.

use std::future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::events::GateEvent;
use crate::intent::canonicalize_command;

use super::engine::{CaptureEngine, RecognitionEvent, SessionToken};
use super::error::CaptureError;
use super::timeout::CommandTimeoutSupervisor;

/// The three states of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Not capturing
    #[default]
    Idle,
    /// Capturing, waiting for the wake phrase (or any command when none is configured)
    Listening,
    /// Wake phrase heard, waiting for the command body
    Awake,
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateState::Idle => write!(f, "Idle"),
            GateState::Listening => write!(f, "Listening"),
            GateState::Awake => write!(f, "Awake"),
        }
    }
}

/// Inputs accepted by the gate's run loop
#[derive(Debug, Clone)]
pub enum GateInput {
    Start,
    Stop,
    Recognition(RecognitionEvent),
    EngineError {
        session: SessionToken,
        kind: String,
        message: String,
    },
    EngineEnded {
        session: SessionToken,
    },
    EngineAvailability {
        available: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct GateSession {
    token: SessionToken,
    state: GateState,
    entered_at: Instant,
}

/// How the engine is released when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    Stop,
    Abort,
    /// The engine already ended on its own
    Detached,
}

/// Wake-word gated capture state machine
pub struct WakeWordGate<E> {
    /// Canonical wake phrase, `None` when every final result is a command
    wake_phrase: Option<String>,
    engine: E,
    /// Active session; `None` means Idle
    session: Option<GateSession>,
    last_token: u64,
    supervisor: CommandTimeoutSupervisor,
    engine_available: bool,
    unsupported_reported: bool,
    event_tx: broadcast::Sender<GateEvent>,
}

impl<E: CaptureEngine> WakeWordGate<E> {
    /// Create a new gate in the Idle state
    pub fn new(
        wake_phrase: Option<&str>,
        command_timeout: Duration,
        engine: E,
        event_tx: broadcast::Sender<GateEvent>,
    ) -> Self {
        let wake_phrase = wake_phrase
            .map(canonicalize_command)
            .filter(|phrase| !phrase.is_empty());

        Self {
            wake_phrase,
            engine,
            session: None,
            last_token: 0,
            supervisor: CommandTimeoutSupervisor::new(command_timeout),
            engine_available: true,
            unsupported_reported: false,
            event_tx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> GateState {
        self.session
            .map(|session| session.state)
            .unwrap_or(GateState::Idle)
    }

    /// Token of the active session, if any
    pub fn session(&self) -> Option<SessionToken> {
        self.session.map(|session| session.token)
    }

    /// Canonical wake phrase, if one is configured
    pub fn wake_phrase(&self) -> Option<&str> {
        self.wake_phrase.as_deref()
    }

    /// The capture engine driven by this gate
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the gate, processing inputs and command timeouts until the
    /// input channel closes
    pub async fn run(&mut self, mut input_rx: mpsc::Receiver<GateInput>) {
        info!(
            wake_phrase = ?self.wake_phrase,
            timeout_ms = self.supervisor.duration().as_millis() as u64,
            "wake word gate started in Idle state"
        );

        loop {
            // Expiry depends only on the clock, not on how busy the queue is
            if let Some(session) = self.supervisor.take_expired(Instant::now()) {
                self.on_timer_expired(session);
                continue;
            }

            let deadline = self.supervisor.deadline();

            tokio::select! {
                biased;

                input = input_rx.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },

                () = wait_for(deadline) => {
                    if let Some(session) = self.supervisor.take_expired(Instant::now()) {
                        self.on_timer_expired(session);
                    }
                }
            }
        }

        self.stop();
        info!("wake word gate stopped");
    }

    /// Dispatch a single input to its transition
    pub fn handle(&mut self, input: GateInput) {
        match input {
            GateInput::Start => self.start(),
            GateInput::Stop => self.stop(),
            GateInput::Recognition(event) => self.on_recognition(event),
            GateInput::EngineError {
                session,
                kind,
                message,
            } => self.on_engine_error(session, &kind, &message),
            GateInput::EngineEnded { session } => self.on_engine_ended(session),
            GateInput::EngineAvailability { available } => self.set_engine_available(available),
        }
    }

    /// Begin a fresh session, ending the current one first
    pub fn start(&mut self) {
        self.end_session(Release::Stop);

        if !self.engine_available {
            if self.unsupported_reported {
                debug!("start ignored, capture engine unavailable");
            } else {
                self.unsupported_reported = true;
                self.report(None, CaptureError::UnsupportedEnvironment);
            }
            return;
        }

        self.last_token += 1;
        let token = SessionToken(self.last_token);
        self.session = Some(GateSession {
            token,
            state: GateState::Listening,
            entered_at: Instant::now(),
        });
        self.engine.start(token);

        info!(
            session = %token,
            from = %GateState::Idle,
            to = %GateState::Listening,
            "state transition"
        );
        self.emit(GateEvent::StateChanged {
            session: token,
            from: GateState::Idle,
            to: GateState::Listening,
        });
    }

    /// End the current session; a no-op when already Idle
    pub fn stop(&mut self) {
        if !self.end_session(Release::Stop) {
            debug!("stop requested while idle");
        }
    }

    /// Handle an interim or final recognizer result
    pub fn on_recognition(&mut self, event: RecognitionEvent) {
        let Some(session) = self.active_session(event.session) else {
            debug!(session = %event.session, "dropping result from inactive session");
            return;
        };

        if !event.is_final {
            let text = self.live_transcript(session.state, &event.text);
            self.emit(GateEvent::Transcript {
                session: session.token,
                text,
            });
            return;
        }

        let text = canonicalize_command(&event.text);
        if text.is_empty() {
            debug!(session = %session.token, "ignoring empty final result");
            return;
        }

        match session.state {
            GateState::Listening => self.on_final_while_listening(session, text),
            GateState::Awake => self.finalize(session, text),
            GateState::Idle => {}
        }
    }

    /// Handle an engine-reported capture error
    pub fn on_engine_error(&mut self, session: SessionToken, kind: &str, message: &str) {
        let Some(active) = self.active_session(session) else {
            debug!(%session, kind, "dropping error from inactive session");
            return;
        };

        let error = CaptureError::from_engine(kind, message, active.state == GateState::Awake);
        self.fail(active.token, error);
    }

    /// Handle the engine ending a session on its own
    pub fn on_engine_ended(&mut self, session: SessionToken) {
        if self.active_session(session).is_none() {
            debug!(%session, "ignoring end of inactive session");
            return;
        }

        info!(%session, "capture ended by engine");
        self.end_session(Release::Detached);
    }

    /// Handle expiry of the command timeout
    pub fn on_timer_expired(&mut self, session: SessionToken) {
        match self.active_session(session) {
            Some(active) if active.state == GateState::Awake => {
                self.fail(active.token, CaptureError::CommandTimeout);
            }
            _ => debug!(%session, "ignoring stale command timeout"),
        }
    }

    /// Record whether the capture engine can be used at all
    pub fn set_engine_available(&mut self, available: bool) {
        if available {
            if !self.engine_available {
                info!("capture engine available");
            }
            self.engine_available = true;
            self.unsupported_reported = false;
            return;
        }

        self.engine_available = false;
        if !self.unsupported_reported {
            self.unsupported_reported = true;
            self.report(self.session(), CaptureError::UnsupportedEnvironment);
        }
        self.end_session(Release::Detached);
    }

    fn on_final_while_listening(&mut self, session: GateSession, text: String) {
        let Some(phrase) = self.wake_phrase.as_deref() else {
            return self.finalize(session, text);
        };

        let Some(index) = text.find(phrase) else {
            // Without the phrase the utterance still counts as a command
            debug!(session = %session.token, "no wake phrase in final result");
            return self.finalize(session, text);
        };

        let trailing = text[index + phrase.len()..].trim().to_string();

        info!(session = %session.token, "wake phrase detected");
        self.emit(GateEvent::WakeDetected {
            session: session.token,
        });

        if trailing.is_empty() {
            self.transition_to(GateState::Awake);
            self.supervisor.arm(session.token);
        } else {
            self.finalize(session, trailing);
        }
    }

    /// Publish the canonical command and end the session
    fn finalize(&mut self, session: GateSession, text: String) {
        let text = canonicalize_command(&text);
        info!(session = %session.token, command = %text, "command finalized");
        self.emit(GateEvent::CommandFinalized {
            session: session.token,
            text,
        });
        self.end_session(Release::Stop);
    }

    fn fail(&mut self, session: SessionToken, error: CaptureError) {
        self.report(Some(session), error);
        self.end_session(Release::Abort);
    }

    fn report(&self, session: Option<SessionToken>, error: CaptureError) {
        warn!(session = ?session, category = ?error.category(), %error, "capture error");
        self.emit(GateEvent::Error {
            session,
            category: error.category(),
            message: error.to_string(),
        });
    }

    /// Common exit path: cancel the timeout, release the engine, go Idle
    ///
    /// Returns false when there was no session to end.
    fn end_session(&mut self, release: Release) -> bool {
        self.supervisor.cancel();

        let Some(session) = self.session.take() else {
            return false;
        };

        match release {
            Release::Stop => self.engine.stop(session.token),
            Release::Abort => self.engine.abort(session.token),
            Release::Detached => {}
        }

        info!(
            session = %session.token,
            from = %session.state,
            to = %GateState::Idle,
            duration_ms = session.entered_at.elapsed().as_millis() as u64,
            "state transition"
        );
        self.emit(GateEvent::StateChanged {
            session: session.token,
            from: session.state,
            to: GateState::Idle,
        });
        true
    }

    /// Move the active session to another capturing state
    fn transition_to(&mut self, new_state: GateState) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let old_state = session.state;
        let duration_ms = session.entered_at.elapsed().as_millis() as u64;
        session.state = new_state;
        session.entered_at = Instant::now();
        let token = session.token;

        info!(
            session = %token,
            from = %old_state,
            to = %new_state,
            duration_ms,
            "state transition"
        );
        self.emit(GateEvent::StateChanged {
            session: token,
            from: old_state,
            to: new_state,
        });
    }

    fn active_session(&self, token: SessionToken) -> Option<GateSession> {
        self.session.filter(|session| session.token == token)
    }

    /// Text to show while the user is still speaking
    fn live_transcript(&self, state: GateState, text: &str) -> String {
        let text = text.trim();
        let Some(phrase) = self.wake_phrase.as_deref() else {
            return text.to_string();
        };

        match state {
            GateState::Awake => match text.get(..phrase.len()) {
                Some(head) if head.to_lowercase() == phrase => {
                    text[phrase.len()..].trim_start().to_string()
                }
                _ => text.to_string(),
            },
            GateState::Listening if text.to_lowercase() == phrase => String::new(),
            _ => text.to_string(),
        }
    }

    fn emit(&self, event: GateEvent) {
        debug!(%event, "emitting gate event");
        let _ = self.event_tx.send(event);
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}
