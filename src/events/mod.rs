//! Events module for gate notifications
//!
//! Every observable effect of the wake-word gate is published as one of
//! these events on a broadcast channel.

use serde::{Deserialize, Serialize};

use crate::state::{ErrorCategory, GateState, SessionToken};

/// Events emitted by the wake-word gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateEvent {
    /// The gate moved between states
    StateChanged {
        session: SessionToken,
        from: GateState,
        to: GateState,
    },

    /// The wake phrase was heard in a final result
    WakeDetected { session: SessionToken },

    /// Live transcript for display, derived from interim results
    Transcript { session: SessionToken, text: String },

    /// A command was captured, in canonical form
    CommandFinalized { session: SessionToken, text: String },

    /// Capture ended with an error; always followed by a return to Idle
    Error {
        /// Absent when no session was active (e.g. unsupported environment)
        session: Option<SessionToken>,
        category: ErrorCategory,
        message: String,
    },
}

impl std::fmt::Display for GateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateEvent::StateChanged { session, from, to } => {
                write!(f, "STATE_CHANGED {session} ({from} -> {to})")
            }
            GateEvent::WakeDetected { session } => write!(f, "WAKE_DETECTED {session}"),
            GateEvent::Transcript { session, text } => {
                write!(f, "TRANSCRIPT {session} {text:?}")
            }
            GateEvent::CommandFinalized { session, text } => {
                write!(f, "COMMAND_FINALIZED {session} {text:?}")
            }
            GateEvent::Error {
                category, message, ..
            } => write!(f, "ERROR {category:?}: {message}"),
        }
    }
}
