//! Line Protocol Client
//!
//! Challenge/response session over a line-oriented stream: the peer issues
//! commands, the client answers, proving work before releasing identity data.
//!
//! Clean Architecture structure:
//! - `domain/` - Commands, identity profile, session state, transport trait
//! - `application/` - Protocol engine and configuration
//! - `infra/` - TLS connection and line stream

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::ProtocolConfig;
pub use application::engine::ProtocolEngine;
pub use domain::command::{Command, IdentityField, Request};
pub use domain::identity::{Identity, IdentityError};
pub use domain::session::{Session, SessionOutcome, SessionState};
pub use domain::transport::LineTransport;
pub use error::{ProtocolViolation, SessionError, SessionErrorKind, SessionResult, TransportError};
pub use infra::tls::{ConnectTarget, connect_tls};
pub use infra::transport::LineStream;

#[cfg(test)]
mod tests;
