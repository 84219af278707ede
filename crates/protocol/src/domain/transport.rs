//! Line Transport Trait
//!
//! Interface for newline-delimited I/O. Implementation is in the infra layer.

use crate::error::TransportResult;

/// Line-oriented duplex stream
#[trait_variant::make(LineTransport: Send)]
pub trait LocalLineTransport {
    /// Next line without its terminator and surrounding whitespace, `None` at end of stream
    async fn read_line(&mut self) -> TransportResult<Option<String>>;

    /// Write `line` followed by `\n` and flush
    async fn write_line(&mut self, line: &str) -> TransportResult<()>;
}
