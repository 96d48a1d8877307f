//! Capture engine driven over IPC
//!
//! The recognizer runs in a separate process (the front end or a speech
//! bridge). The gate's start/stop/abort calls are published as engine
//! directives to subscribed clients, which answer with `recognition` and
//! `engine_*` requests.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::state::{CaptureEngine, GateInput, SessionToken};

use super::protocol::{EngineDirective, Notification};

/// `CaptureEngine` backed by the notification channel
pub struct RemoteEngine {
    notify_tx: broadcast::Sender<Notification>,
    /// Weak so the gate's input channel still closes once every client
    /// handle is gone
    gate_tx: mpsc::WeakSender<GateInput>,
}

impl RemoteEngine {
    pub fn new(
        notify_tx: broadcast::Sender<Notification>,
        gate_tx: mpsc::WeakSender<GateInput>,
    ) -> Self {
        Self { notify_tx, gate_tx }
    }

    fn direct(&self, directive: EngineDirective) -> bool {
        debug!(?directive, "sending engine directive");
        self.notify_tx
            .send(Notification::Engine(directive))
            .is_ok()
    }
}

impl CaptureEngine for RemoteEngine {
    fn start(&mut self, session: SessionToken) {
        if self.direct(EngineDirective::Start { session }) {
            return;
        }

        // Nobody is listening for directives, so no recognizer will ever
        // answer this session
        warn!(%session, "no engine client connected");
        if let Some(gate_tx) = self.gate_tx.upgrade() {
            if gate_tx
                .try_send(GateInput::EngineAvailability { available: false })
                .is_err()
            {
                warn!("gate input queue full, engine loss not reported");
            }
        }
    }

    fn stop(&mut self, session: SessionToken) {
        self.direct(EngineDirective::Stop { session });
    }

    fn abort(&mut self, session: SessionToken) {
        self.direct(EngineDirective::Abort { session });
    }
}
