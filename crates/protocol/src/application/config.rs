//! Application Configuration
//!
//! Configuration for the protocol engine.

use std::time::Duration;

/// Protocol engine configuration
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Reply to `HELO`
    pub helo_ack: String,
    /// Reply to `END`
    pub end_ack: String,
    /// Deadline for one `POW` solve
    pub pow_timeout: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            helo_ack: "TOAKUEI".to_string(),
            end_ack: "OK".to_string(),
            pow_timeout: Duration::from_secs(4 * 60 * 60),
        }
    }
}

impl ProtocolConfig {
    pub fn with_helo_ack(mut self, ack: impl Into<String>) -> Self {
        self.helo_ack = ack.into();
        self
    }

    pub fn with_pow_timeout(mut self, timeout: Duration) -> Self {
        self.pow_timeout = timeout;
        self
    }
}
