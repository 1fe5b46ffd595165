use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::error::{Result, Sip2Error};

/// Terminator written after every line.
pub const LINE_TERMINATOR: &str = "\r";

/// Longest line accepted before the channel gives up on the peer (64 KB).
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// A bidirectional, line-oriented connection.
///
/// Lines are exchanged without terminators. Implementations must be
/// cancel-safe in `read_line`: if the returned future is dropped, no bytes
/// of a partially received line may be lost.
#[async_trait]
pub trait LineChannel: Send {
    /// Reads the next non-empty line.
    ///
    /// # Returns
    ///
    /// `Ok(Some(line))` for a line, `Ok(None)` once the peer has closed the
    /// connection, or `Err(Sip2Error::Timeout)` if `timeout` elapsed first.
    async fn read_line(&mut self, timeout: Option<Duration>) -> Result<Option<String>>;

    /// Writes one line followed by the terminator and flushes it.
    async fn write_line(&mut self, line: &str) -> Result<()>;

    /// Shuts down the write side. Calling it twice is harmless.
    async fn close(&mut self) -> Result<()>;
}

/// [`LineChannel`] over any async byte stream.
///
/// Accepts `\r`, `\n` or `\r\n` as terminators and skips blank lines, so
/// both SIP2 hardware and a telnet session can talk to it.
pub struct StreamChannel<S> {
    stream: BufReader<S>,
    pending: Vec<u8>,
    max_line_length: usize,
    closed: bool,
}

impl<S> StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self::with_max_line_length(stream, DEFAULT_MAX_LINE_LENGTH)
    }

    pub fn with_max_line_length(stream: S, max_line_length: usize) -> Self {
        Self {
            stream: BufReader::new(stream),
            pending: Vec::new(),
            max_line_length,
            closed: false,
        }
    }

    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            let available = self
                .stream
                .fill_buf()
                .await
                .map_err(|e| map_io_error(e, "read"))?;

            if available.is_empty() {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                // Peer closed mid-line; hand over what arrived.
                return Ok(Some(take_line(&mut self.pending)));
            }

            let complete = match available.iter().position(|b| *b == b'\r' || *b == b'\n') {
                Some(end) => {
                    self.pending.extend_from_slice(&available[..end]);
                    self.stream.consume(end + 1);
                    true
                }
                None => {
                    let len = available.len();
                    self.pending.extend_from_slice(available);
                    self.stream.consume(len);
                    false
                }
            };

            if self.pending.len() > self.max_line_length {
                self.pending.clear();
                return Err(Sip2Error::Connection(format!(
                    "line exceeds {} bytes",
                    self.max_line_length
                )));
            }
            if complete && !self.pending.is_empty() {
                return Ok(Some(take_line(&mut self.pending)));
            }
        }
    }
}

fn take_line(pending: &mut Vec<u8>) -> String {
    let bytes = std::mem::take(pending);
    String::from_utf8_lossy(&bytes).into_owned()
}

#[async_trait]
impl<S> LineChannel for StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_line(&mut self, timeout: Option<Duration>) -> Result<Option<String>> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.next_line())
                .await
                .map_err(|_| Sip2Error::Timeout(limit.as_millis() as u64))?,
            None => self.next_line().await,
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        if self.closed {
            return Err(Sip2Error::NotConnected);
        }
        let mut data = Vec::with_capacity(line.len() + LINE_TERMINATOR.len());
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(LINE_TERMINATOR.as_bytes());

        self.stream
            .write_all(&data)
            .await
            .map_err(|e| map_io_error(e, "write"))?;
        self.stream
            .flush()
            .await
            .map_err(|e| map_io_error(e, "flush"))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            // Already gone from the other side.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(map_io_error(e, "shutdown")),
        }
    }
}

/// Maps socket errors onto the error kinds the retry policy understands.
pub(crate) fn map_io_error(err: std::io::Error, context: &str) -> Sip2Error {
    match err.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            Sip2Error::Connection(format!("{}: timed out", context))
        }
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::UnexpectedEof => {
            Sip2Error::Connection(format!("{}: connection lost", context))
        }
        _ => Sip2Error::Io(err),
    }
}
