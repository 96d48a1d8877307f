//! Boundary types for the external speech capture engine

use serde::{Deserialize, Serialize};

/// Identifies one capture session
///
/// Incremented on every `start()`. The engine tags each event with the
/// token of the session that produced it so that trailing events from a
/// stopped session can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub u64);

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One recognizer callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionEvent {
    pub session: SessionToken,
    pub is_final: bool,
    pub text: String,
}

/// Control surface of a continuous, interim-results-enabled recognizer
pub trait CaptureEngine: Send {
    /// Begin capturing; every event must carry `session`
    fn start(&mut self, session: SessionToken);

    /// Stop capturing, letting the engine flush what it has
    fn stop(&mut self, session: SessionToken);

    /// Stop capturing and discard pending results
    fn abort(&mut self, session: SessionToken);
}
