use std::sync::Arc;

use tracing::{debug, error, info, warn};

use sip2_common::protocol::error::{Result, Sip2Error};
use sip2_common::protocol::{catalog, Message, SequenceCheck, SequenceTracker};
use sip2_common::transport::{Codec, ErrorDetection, LineChannel};

use crate::config::SessionConfig;
use crate::driver::Driver;

/// One SC connection on the ACS side.
///
/// The session reads request lines until the SC disconnects or the idle
/// timeout passes, and answers each one through the [`Driver`]:
///
/// - `99` and `93` switch on checksums and sequence numbers when the SC
///   uses them
/// - Lines failing checksum or sequence checks are dropped silently; the
///   SC will time out and re-send
/// - Lines that cannot be understood get a `96` resend request
/// - `97` and a repeated sequence digit get the previous response again
pub struct Session<C, D: ?Sized> {
    channel: C,
    driver: Arc<D>,
    config: SessionConfig,
    mode: ErrorDetection,
    tracker: SequenceTracker,
    last_response: Option<String>,
    peer: String,
}

impl<C, D> Session<C, D>
where
    C: LineChannel,
    D: Driver + ?Sized,
{
    pub fn new(channel: C, driver: Arc<D>, config: SessionConfig) -> Self {
        let mode = config.forced_error_detection();
        Self {
            channel,
            driver,
            config,
            mode,
            tracker: SequenceTracker::default(),
            last_response: None,
            peer: "unknown".to_string(),
        }
    }

    /// Names the remote end in log output.
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    /// Error detection currently in force.
    pub fn error_detection(&self) -> ErrorDetection {
        self.mode
    }

    /// Serves the connection until it closes.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the SC disconnects or stays idle too long, or the
    /// channel error that ended the session.
    pub async fn run(mut self) -> Result<()> {
        info!("Session started with {}", self.peer);

        loop {
            let line = match self.channel.read_line(self.config.idle_timeout).await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Connection closed by {}", self.peer);
                    break;
                }
                Err(Sip2Error::Timeout(ms)) => {
                    info!("Closing idle session with {} after {}ms", self.peer, ms);
                    break;
                }
                Err(e) => {
                    let _ = self.channel.close().await;
                    return Err(e);
                }
            };

            if let Some(reply) = self.process(&line).await {
                if let Err(e) = self.channel.write_line(&reply).await {
                    let _ = self.channel.close().await;
                    return Err(e);
                }
            }
        }

        self.channel.close().await
    }

    /// Handles one request line and returns the line to send back, if any.
    pub async fn process(&mut self, line: &str) -> Option<String> {
        debug!("{} -> {}", self.peer, line);
        let command = line.get(..2).unwrap_or_default();

        if command == catalog::SC_STATUS.command || command == catalog::LOGIN.command {
            self.negotiate(line);
        }

        if command == catalog::REQUEST_ACS_RESEND.command {
            if self.last_response.is_none() {
                warn!("{} asked for a resend before any response was sent", self.peer);
            }
            return self.last_response.clone();
        }

        let codec = Codec::new(self.mode);
        let frame = match codec.decode(line) {
            Ok(frame) => frame,
            Err(e) if e.is_corruption() => {
                warn!("Dropping corrupted line from {}: {}", self.peer, e);
                return None;
            }
            Err(e) => {
                warn!("Cannot process line from {}: {}", self.peer, e);
                return self.resend_request(&codec);
            }
        };

        if self.mode.sequence {
            match self.tracker.classify(frame.sequence) {
                Ok(SequenceCheck::Fresh) => {}
                Ok(SequenceCheck::Retransmission) => {
                    debug!("{} repeated sequence {:?}", self.peer, frame.sequence);
                    return self.last_response.clone();
                }
                Err(e) => {
                    warn!("Dropping line from {}: {}", self.peer, e);
                    return None;
                }
            }
        }

        let command = frame.message.command();
        let response = match self.driver.handle(&frame.message).await {
            Ok(response) => response,
            Err(e) => {
                error!("Driver failed on {} request from {}: {}", command, self.peer, e);
                return self.reject(&codec, frame.sequence);
            }
        };

        if let Some(expected) = frame.message.schema().response {
            if response.command() != expected {
                error!(
                    "Driver answered {} with {}, expected {}",
                    command,
                    response.command(),
                    expected
                );
                return self.reject(&codec, frame.sequence);
            }
        }

        let reply = match codec.encode(&response, frame.sequence) {
            Ok(reply) => reply,
            Err(e) => {
                error!("Cannot encode {} response: {}", response.command(), e);
                return self.reject(&codec, frame.sequence);
            }
        };

        Some(self.answer(reply, frame.sequence))
    }

    /// Records `reply` as the answer to the request carrying `sequence`.
    fn answer(&mut self, reply: String, sequence: Option<u8>) -> String {
        if let (true, Some(digit)) = (self.mode.sequence, sequence) {
            self.tracker.record(digit);
        }
        self.last_response = Some(reply.clone());
        debug!("{} <- {}", self.peer, reply);
        reply
    }

    /// Answers a dispatched request that produced no usable response.
    ///
    /// The resend request stands in for the response, so a retransmission of
    /// the same line gets it again without reaching the driver.
    fn reject(&mut self, codec: &Codec, sequence: Option<u8>) -> Option<String> {
        let nak = self.resend_request(codec)?;
        Some(self.answer(nak, sequence))
    }

    /// Adopts the error detection an SC uses in its status or login line.
    fn negotiate(&mut self, line: &str) {
        let mode = self
            .config
            .forced_error_detection()
            .union(ErrorDetection::detect(line));
        if mode != self.mode {
            info!(
                "Error detection for {}: checksum {}, sequence {}",
                self.peer, mode.checksum, mode.sequence
            );
            self.mode = mode;
        }
        self.tracker.reset();
    }

    fn resend_request(&self, codec: &Codec) -> Option<String> {
        codec
            .encode(&Message::new(&catalog::REQUEST_SC_RESEND), None)
            .map_err(|e| error!("Cannot encode resend request: {}", e))
            .ok()
    }
}
