//! Domain Layer - Protocol vocabulary
//!
//! Commands, identity data, session state and the transport interface.

pub mod command;
pub mod identity;
pub mod session;
pub mod transport;
