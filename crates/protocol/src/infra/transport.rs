//! Line Stream
//!
//! [`LineTransport`] over any async byte stream. Reads are bounded by a
//! maximum line length and every operation by an optional I/O timeout.

use crate::domain::transport::LineTransport;
use crate::error::{TransportError, TransportResult};
use std::future::Future;
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};

/// Longest accepted line, terminator excluded
pub const DEFAULT_MAX_LINE: usize = 64 * 1024;

/// Default per-operation timeout
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Newline-delimited reader/writer pair
#[derive(Debug)]
pub struct LineStream<R, W> {
    reader: BufReader<R>,
    writer: W,
    max_line: usize,
    io_timeout: Option<Duration>,
    buf: Vec<u8>,
}

impl<R, W> LineStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            max_line: DEFAULT_MAX_LINE,
            io_timeout: Some(DEFAULT_IO_TIMEOUT),
            buf: Vec::new(),
        }
    }

    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// `None` disables the timeout
    pub fn with_io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Flush and close the write side (sends TLS close_notify)
    pub async fn shutdown(&mut self) -> TransportResult<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    async fn read_raw(&mut self) -> TransportResult<Option<String>> {
        self.buf.clear();
        let limit = self.max_line as u64 + 1;
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;
        if n == 0 {
            return Ok(None);
        }
        if !self.buf.ends_with(b"\n") && self.buf.len() > self.max_line {
            return Err(TransportError::LineTooLong {
                limit: self.max_line,
            });
        }

        let line = std::str::from_utf8(&self.buf).map_err(|_| TransportError::InvalidUtf8)?;
        Ok(Some(line.trim().to_string()))
    }

    async fn write_raw(&mut self, line: &str) -> TransportResult<()> {
        let mut out = Vec::with_capacity(line.len() + 1);
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
        self.writer.write_all(&out).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl<S> LineStream<ReadHalf<S>, WriteHalf<S>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Split a duplex stream (TLS, TCP, in-memory) into a line stream
    pub fn from_stream(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self::new(reader, writer)
    }
}

impl<R, W> LineTransport for LineStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_line(&mut self) -> TransportResult<Option<String>> {
        let limit = self.io_timeout;
        bounded(limit, self.read_raw()).await
    }

    async fn write_line(&mut self, line: &str) -> TransportResult<()> {
        let limit = self.io_timeout;
        bounded(limit, self.write_raw(line)).await
    }
}

async fn bounded<T, F>(limit: Option<Duration>, op: F) -> TransportResult<T>
where
    F: Future<Output = TransportResult<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, op)
            .await
            .map_err(|_| TransportError::TimedOut(limit))?,
        None => op.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_reads_trimmed_lines() {
        let reader = Builder::new().read(b"HELO\r\nPOW abc 1\n  \nEND").build();
        let mut stream = LineStream::new(reader, tokio::io::sink());

        assert_eq!(stream.read_line().await.unwrap().as_deref(), Some("HELO"));
        assert_eq!(stream.read_line().await.unwrap().as_deref(), Some("POW abc 1"));
        assert_eq!(stream.read_line().await.unwrap().as_deref(), Some(""));
        // Final line without a terminator is still delivered
        assert_eq!(stream.read_line().await.unwrap().as_deref(), Some("END"));
        assert_eq!(stream.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_split_across_reads() {
        let reader = Builder::new().read(b"NA").read(b"ME n").read(b"1\n").build();
        let mut stream = LineStream::new(reader, tokio::io::sink());
        assert_eq!(stream.read_line().await.unwrap().as_deref(), Some("NAME n1"));
    }

    #[tokio::test]
    async fn test_rejects_long_line() {
        let reader = Builder::new().read(b"0123456789\n").build();
        let mut stream = LineStream::new(reader, tokio::io::sink()).with_max_line(4);
        assert!(matches!(
            stream.read_line().await,
            Err(TransportError::LineTooLong { limit: 4 })
        ));
    }

    #[tokio::test]
    async fn test_accepts_line_at_limit() {
        let reader = Builder::new().read(b"abcd\n").build();
        let mut stream = LineStream::new(reader, tokio::io::sink()).with_max_line(4);
        assert_eq!(stream.read_line().await.unwrap().as_deref(), Some("abcd"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_utf8() {
        let reader = Builder::new().read(b"\xff\xfe\n").build();
        let mut stream = LineStream::new(reader, tokio::io::sink());
        assert!(matches!(stream.read_line().await, Err(TransportError::InvalidUtf8)));
    }

    #[tokio::test]
    async fn test_write_appends_newline() {
        let writer = Builder::new().write(b"TOAKUEI\n").build();
        let mut stream = LineStream::new(tokio::io::empty(), writer);
        stream.write_line("TOAKUEI").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_times_out() {
        let (client, _server) = tokio::io::duplex(64);
        let mut stream =
            LineStream::from_stream(client).with_io_timeout(Some(Duration::from_secs(30)));
        assert!(matches!(
            stream.read_line().await,
            Err(TransportError::TimedOut(_))
        ));
    }

    #[tokio::test]
    async fn test_duplex_roundtrip() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = LineStream::from_stream(client);

        server.write_all(b"HELO\n").await.unwrap();
        assert_eq!(stream.read_line().await.unwrap().as_deref(), Some("HELO"));

        stream.write_line("TOAKUEI").await.unwrap();
        let mut reply = [0u8; 8];
        tokio::io::AsyncReadExt::read_exact(&mut server, &mut reply)
            .await
            .unwrap();
        assert_eq!(&reply, b"TOAKUEI\n");
    }
}
