//! Protocol Error Types
//!
//! Every error raised inside the session loop resolves to a failed
//! [`crate::domain::session::SessionOutcome`]. [`SessionErrorKind`] is the
//! coarse classification used for logging and exit status.

use derive_more::Display;
use platform::tls::TlsError;
use pow::PowError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Session result type alias
pub type SessionResult<T> = Result<T, SessionError>;

/// Transport result type alias
pub type TransportResult<T> = Result<T, TransportError>;

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionErrorKind {
    /// TCP or TLS was never established
    #[display("connection")]
    Connection,
    /// Peer closed the stream or I/O failed mid-session
    #[display("stream-closed")]
    StreamClosed,
    /// Peer sent something the protocol does not allow
    #[display("protocol")]
    Protocol,
    /// Proof of work could not be produced
    #[display("pow-failed")]
    PowFailed,
    /// Peer ended the session with `ERROR`
    #[display("peer-rejected")]
    PeerRejected,
}

/// Line transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("Line is not valid UTF-8")]
    InvalidUtf8,

    #[error("I/O timed out after {0:?}")]
    TimedOut(Duration),
}

/// Protocol rule broken by the peer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("{command} expects {expected} argument(s), got {actual}")]
    WrongArity {
        command: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid difficulty: {0:?}")]
    InvalidDifficulty(String),

    #[error("Invalid index in command {0:?}")]
    InvalidIndex(String),

    #[error("{command}: index {index} out of range 1..={available}")]
    IndexOutOfRange {
        command: String,
        index: usize,
        available: usize,
    },

    #[error("{0} received before POW")]
    ChallengeNotSet(String),

    #[error("POW received twice in one session")]
    ChallengeAlreadySet,

    #[error("POW challenge is empty")]
    EmptyChallenge,
}

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// TCP connect to the peer failed
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// TCP connect or TLS handshake did not finish in time
    #[error("Connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// TLS configuration could not be built
    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    /// TLS handshake failed
    #[error("TLS handshake with {addr} failed: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Host is not usable as a TLS server name
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),

    /// End of stream or empty line
    #[error("Peer closed connection")]
    PeerClosed,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// Peer sent `ERROR <reason>`
    #[error("Peer reported error: {0}")]
    PeerError(String),

    #[error(transparent)]
    Pow(#[from] PowError),
}

impl SessionError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::Connect { .. }
            | SessionError::ConnectTimeout { .. }
            | SessionError::Tls(_)
            | SessionError::Handshake { .. }
            | SessionError::InvalidServerName(_) => SessionErrorKind::Connection,
            SessionError::PeerClosed => SessionErrorKind::StreamClosed,
            SessionError::Transport(TransportError::LineTooLong { .. })
            | SessionError::Transport(TransportError::InvalidUtf8) => SessionErrorKind::Protocol,
            SessionError::Transport(_) => SessionErrorKind::StreamClosed,
            SessionError::Protocol(_) => SessionErrorKind::Protocol,
            SessionError::PeerError(_) => SessionErrorKind::PeerRejected,
            SessionError::Pow(_) => SessionErrorKind::PowFailed,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let kind = self.kind();
        match self {
            SessionError::Pow(e) => e.log(),
            SessionError::PeerError(reason) => {
                tracing::error!(%kind, reason = %reason, "Peer reported an error");
            }
            SessionError::PeerClosed => {
                tracing::warn!(%kind, "Connection closed by peer");
            }
            SessionError::Protocol(violation) => {
                tracing::warn!(%kind, violation = %violation, "Protocol violation");
            }
            _ => {
                tracing::error!(%kind, error = %self, "Session error");
            }
        }
    }
}
