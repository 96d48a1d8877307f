//! Wake-word gate state machine
//!
//! Three states:
//! - Idle: Not capturing
//! - Listening: Capturing, waiting for the wake phrase
//! - Awake: Wake phrase heard, waiting for the command under a timeout

mod engine;
mod error;
mod machine;
mod timeout;

pub use engine::{CaptureEngine, RecognitionEvent, SessionToken};
pub use error::ErrorCategory;
pub use machine::{GateInput, GateState, WakeWordGate};
pub use timeout::DEFAULT_COMMAND_TIMEOUT;
