use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use sip2_common::protocol::catalog;
use sip2_common::protocol::error::{Result, Sip2Error};
use sip2_common::protocol::{Message, SequenceCounter};
use sip2_common::transport::{tcp, Codec, LineChannel, StreamChannel};

use crate::config::ConnectionConfig;

/// Where a [`Connection`] is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// A request line is being written.
    Sending,
    /// Waiting for the response to a written request.
    AwaitingResponse,
}

/// An SC-side connection to an ACS.
///
/// One request is in flight at a time. [`send`](Self::send) encodes the
/// request, writes it and waits for the response, re-sending the same line
/// when the response is lost, corrupted or out of sequence, or when the ACS
/// asks for a resend.
///
/// # Example
///
/// ```no_run
/// use sip2_client::{Connection, ConnectionConfig};
/// use sip2_common::{catalog, Message};
///
/// # async fn example() -> sip2_common::Result<()> {
/// let mut connection = Connection::new(ConnectionConfig::new("127.0.0.1", 6001));
/// connection.connect().await?;
///
/// let status = Message::new(&catalog::SC_STATUS);
/// let response = connection.send(&status).await?;
/// println!("ACS online: {:?}", response.flag("online_status"));
///
/// connection.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct Connection<C = StreamChannel<TcpStream>> {
    config: ConnectionConfig,
    channel: Option<C>,
    state: ConnectionState,
    sequence: SequenceCounter,
    codec: Codec,
}

impl Connection<StreamChannel<TcpStream>> {
    /// Creates a disconnected TCP connection.
    pub fn new(config: ConnectionConfig) -> Self {
        let codec = Codec::new(config.error_detection());
        Self {
            config,
            channel: None,
            state: ConnectionState::Disconnected,
            sequence: SequenceCounter::default(),
            codec,
        }
    }

    /// Opens the TCP connection.
    ///
    /// Connecting an already connected client does nothing. A fresh
    /// connection restarts the sequence counter at 0.
    ///
    /// # Errors
    ///
    /// Returns `Config` for an invalid configuration, `Timeout` if the
    /// connect timeout elapses and `Connection` if the ACS cannot be reached.
    pub async fn connect(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Ok(());
        }
        self.config.validate()?;

        let addr = self.config.addr();
        let channel = tcp::open(&addr, self.config.connect_timeout).await?;
        info!("Connected to ACS at {}", addr);

        self.channel = Some(channel);
        self.sequence = SequenceCounter::default();
        self.state = ConnectionState::Connected;
        Ok(())
    }
}

impl<C: LineChannel> Connection<C> {
    /// Wraps an already open channel.
    pub fn with_channel(config: ConnectionConfig, channel: C) -> Self {
        let codec = Codec::new(config.error_detection());
        Self {
            config,
            channel: Some(channel),
            state: ConnectionState::Connected,
            sequence: SequenceCounter::default(),
            codec,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Digit the next request will carry, when sequence checking is on.
    pub fn next_sequence(&self) -> Option<u8> {
        self.config
            .strict_sequence
            .then(|| self.sequence.current())
    }

    /// Sends a request and returns the ACS response.
    ///
    /// The line is encoded once and re-sent unchanged on retry, so a retried
    /// request keeps its sequence digit. The counter moves on only once a
    /// response is accepted.
    ///
    /// # Errors
    ///
    /// - `NotConnected` if the connection is closed
    /// - Encode errors such as `MandatoryFieldOmitted`, before anything is sent
    /// - Decode errors such as `MessageNotUnderstood`, without retrying
    /// - `RetriesExceeded` once `retry_attempts + 1` sends have failed
    pub async fn send(&mut self, request: &Message) -> Result<Message> {
        if self.channel.is_none() {
            return Err(Sip2Error::NotConnected);
        }

        let sequence = self.next_sequence();
        let line = self.codec.encode(request, sequence)?;
        let expected = request.schema().response;
        let attempts = self.config.retry_attempts.saturating_add(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.retry_wait).await;
                debug!(
                    "Retrying {} request (attempt {}/{})",
                    request.command(),
                    attempt,
                    attempts
                );
            }

            match self.exchange(&line, expected).await {
                Ok(response) => {
                    self.state = ConnectionState::Connected;
                    if sequence.is_some() {
                        self.sequence.advance();
                    }
                    return Ok(response);
                }
                Err(e) if e.is_transient() => {
                    warn!("{} request attempt {} failed: {}", request.command(), attempt, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    self.state = ConnectionState::Connected;
                    return Err(e);
                }
            }
        }

        self.state = ConnectionState::Connected;
        Err(Sip2Error::RetriesExceeded {
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    /// Closes the channel. Safe to call when already disconnected.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.state = ConnectionState::Disconnected;
        match self.channel.take() {
            Some(mut channel) => {
                info!("Disconnecting from ACS");
                channel.close().await
            }
            None => Ok(()),
        }
    }

    /// One write of an already encoded line and the read of its response.
    ///
    /// Lines answering some other command are stale replies to an earlier,
    /// timed-out send. They are skipped until `expected` arrives or the idle
    /// timeout runs out.
    async fn exchange(&mut self, line: &str, expected: Option<&'static str>) -> Result<Message> {
        let channel = self.channel.as_mut().ok_or(Sip2Error::NotConnected)?;

        self.state = ConnectionState::Sending;
        debug!("-> {}", line);
        channel.write_line(line).await?;

        self.state = ConnectionState::AwaitingResponse;
        let deadline = Instant::now() + self.config.idle_timeout;
        let mut skipped = None;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let reply = match channel.read_line(Some(remaining)).await {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    return Err(Sip2Error::Connection("connection closed by ACS".to_string()))
                }
                Err(Sip2Error::Timeout(_)) => {
                    return Err(match (expected, skipped) {
                        (Some(expected), Some(received)) => {
                            Sip2Error::UnexpectedResponse { expected, received }
                        }
                        _ => Sip2Error::Timeout(self.config.idle_timeout.as_millis() as u64),
                    })
                }
                Err(e) => return Err(e),
            };
            debug!("<- {}", reply);

            let frame = self.codec.decode(&reply)?;
            let command = frame.message.command();
            if command == catalog::REQUEST_SC_RESEND.command {
                return Err(Sip2Error::ResendRequested);
            }
            if let Some(expected) = expected.filter(|expected| *expected != command) {
                warn!("Skipping {} response while waiting for {}", command, expected);
                skipped = Some(command.to_string());
                continue;
            }
            if self.config.strict_sequence {
                self.sequence.verify(frame.sequence)?;
            }
            return Ok(frame.message);
        }
    }
}
