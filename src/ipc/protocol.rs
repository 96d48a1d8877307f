//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::dispatch::Action;
use crate::events::GateEvent;
use crate::intent::{Command, RULE_TABLE_VERSION};
use crate::state::{GateInput, GateState, RecognitionEvent, SessionToken, DEFAULT_COMMAND_TIMEOUT};

/// Requests from clients to the daemon
///
/// Front ends use `start`/`stop`/`classify`; the speech engine bridge
/// reports recognizer callbacks with the `recognition` and `engine_*`
/// variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to gate, command and engine notifications
    Subscribe,

    /// Begin a capture session
    Start,

    /// End the current capture session
    Stop,

    /// Interim or final recognizer result
    Recognition {
        session: SessionToken,
        is_final: bool,
        text: String,
    },

    /// Recognizer failure, `kind` as reported by the engine
    EngineError {
        session: SessionToken,
        kind: String,
        #[serde(default)]
        message: String,
    },

    /// Recognizer stopped on its own
    EngineEnded { session: SessionToken },

    /// Whether a recognizer exists on the engine side at all
    EngineAvailability { available: bool },

    /// Classify and plan text directly, bypassing the gate
    Classify { text: String },
}

impl Request {
    /// Gate input carried by this request, if any
    pub fn into_gate_input(self) -> Option<GateInput> {
        match self {
            Request::Start => Some(GateInput::Start),
            Request::Stop => Some(GateInput::Stop),
            Request::Recognition {
                session,
                is_final,
                text,
            } => Some(GateInput::Recognition(RecognitionEvent {
                session,
                is_final,
                text,
            })),
            Request::EngineError {
                session,
                kind,
                message,
            } => Some(GateInput::EngineError {
                session,
                kind,
                message,
            }),
            Request::EngineEnded { session } => Some(GateInput::EngineEnded { session }),
            Request::EngineAvailability { available } => {
                Some(GateInput::EngineAvailability { available })
            }
            Request::GetStatus | Request::Ping | Request::Subscribe | Request::Classify { .. } => {
                None
            }
        }
    }
}

/// Responses from daemon to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Input queued for the gate
    Accepted,

    /// Result of a `classify` request
    Classified { command: Command, action: Action },

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Instruction for the speech engine bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum EngineDirective {
    Start { session: SessionToken },
    Stop { session: SessionToken },
    Abort { session: SessionToken },
}

/// Push notification from daemon to subscribed clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    /// Gate event occurred
    Gate(GateEvent),

    /// A finalized command was classified and planned
    Command { command: Command, action: Action },

    /// The gate wants the engine started, stopped or aborted
    Engine(EngineDirective),
}

/// Full daemon status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Current gate state
    pub state: GateState,

    /// Active capture session
    pub session: Option<SessionToken>,

    /// Canonical wake phrase, absent when disabled
    pub wake_phrase: Option<String>,

    pub command_timeout_ms: u64,

    pub rule_table_version: u32,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// Commands finalized by the gate since startup
    pub commands_finalized: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: GateState::default(),
            session: None,
            wake_phrase: None,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT.as_millis() as u64,
            rule_table_version: RULE_TABLE_VERSION,
            uptime_secs: 0,
            commands_finalized: 0,
        }
    }
}
