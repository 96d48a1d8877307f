//! Command timeout supervision
//!
//! Holds at most one deadline. The gate's run loop awaits the deadline
//! alongside its input channel, so there is no detached timer task that
//! could outlive the session that armed it.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::engine::SessionToken;

/// Default time to wait for a command after the wake phrase
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(7000);

#[derive(Debug, Clone, Copy)]
struct ArmedTimer {
    session: SessionToken,
    deadline: Instant,
}

/// Single-shot deadline bounding the wait for a command body
#[derive(Debug)]
pub struct CommandTimeoutSupervisor {
    duration: Duration,
    armed: Option<ArmedTimer>,
}

impl CommandTimeoutSupervisor {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            armed: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Arm the deadline for `session`, replacing any previous one
    pub fn arm(&mut self, session: SessionToken) -> Instant {
        if let Some(previous) = self.armed.take() {
            debug!(session = %previous.session, "superseding armed command timeout");
        }

        let deadline = Instant::now() + self.duration;
        self.armed = Some(ArmedTimer { session, deadline });
        debug!(%session, timeout_ms = self.duration.as_millis() as u64, "command timeout armed");
        deadline
    }

    /// Drop the deadline, returning whether one was armed
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(timer) => {
                debug!(session = %timer.session, "command timeout cancelled");
                true
            }
            None => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|timer| timer.deadline)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Disarm and return the session if the deadline has passed
    pub fn take_expired(&mut self, now: Instant) -> Option<SessionToken> {
        match self.armed {
            Some(timer) if now >= timer.deadline => {
                self.armed = None;
                Some(timer.session)
            }
            _ => None,
        }
    }
}

impl Default for CommandTimeoutSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_duration() {
        let supervisor = CommandTimeoutSupervisor::default();
        assert_eq!(supervisor.duration(), Duration::from_millis(7000));
        assert!(!supervisor.is_armed());
        assert!(supervisor.deadline().is_none());
    }

    #[test]
    fn test_expiry_only_after_deadline() {
        let mut supervisor = CommandTimeoutSupervisor::new(Duration::from_millis(100));
        let deadline = supervisor.arm(SessionToken(1));

        assert_eq!(supervisor.take_expired(deadline - Duration::from_millis(1)), None);
        assert!(supervisor.is_armed());

        assert_eq!(supervisor.take_expired(deadline), Some(SessionToken(1)));
        assert!(!supervisor.is_armed());

        // Single-shot
        assert_eq!(supervisor.take_expired(deadline + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_rearm_supersedes_previous() {
        let mut supervisor = CommandTimeoutSupervisor::new(Duration::from_millis(100));
        let first = supervisor.arm(SessionToken(1));
        let second = supervisor.arm(SessionToken(2));

        assert!(second >= first);
        assert_eq!(supervisor.take_expired(second), Some(SessionToken(2)));
        assert_eq!(supervisor.take_expired(second), None);
    }

    #[test]
    fn test_cancel() {
        let mut supervisor = CommandTimeoutSupervisor::new(Duration::from_millis(100));
        assert!(!supervisor.cancel());

        let deadline = supervisor.arm(SessionToken(3));
        assert!(supervisor.cancel());
        assert!(!supervisor.cancel());
        assert_eq!(supervisor.take_expired(deadline), None);
    }
}
