//! Session State
//!
//! Owned by the engine for one connection. The challenge (authdata) is
//! set once by `POW` and binds every identity answer to this session.

use crate::error::{ProtocolViolation, SessionError};
use derive_more::Display;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    #[display("connecting")]
    Connecting,
    #[display("authenticating")]
    Authenticating,
    #[display("terminated(success={success})")]
    Terminated { success: bool },
}

/// How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    Success,
    Failure(SessionError),
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Success)
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            SessionOutcome::Success => None,
            SessionOutcome::Failure(e) => Some(e),
        }
    }
}

/// Session entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    challenge: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
            challenge: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transport is up; commands may now be read
    pub fn begin(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Authenticating;
        }
    }

    /// Record the `POW` challenge; allowed once per session
    pub fn set_challenge(&mut self, challenge: &str) -> Result<(), ProtocolViolation> {
        if self.challenge.is_some() {
            return Err(ProtocolViolation::ChallengeAlreadySet);
        }
        if challenge.is_empty() {
            return Err(ProtocolViolation::EmptyChallenge);
        }
        self.challenge = Some(challenge.to_string());
        Ok(())
    }

    /// Challenge for an identity answer requested by `command`
    pub fn challenge_for(&self, command: &str) -> Result<&str, ProtocolViolation> {
        self.challenge
            .as_deref()
            .ok_or_else(|| ProtocolViolation::ChallengeNotSet(command.to_string()))
    }

    pub fn terminate(&mut self, success: bool) {
        self.state = SessionState::Terminated { success };
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated { .. })
    }
}
