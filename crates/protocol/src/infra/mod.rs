//! Infrastructure Layer - Network I/O
//!
//! TLS connection setup and the line stream over it.

pub mod tls;
pub mod transport;
