use thiserror::Error;

use crate::protocol::schema::FieldKind;

/// Every failure the SIP2 stack can surface.
///
/// Field-level variants are raised while building, encoding or decoding a
/// message. Transport variants come from the line channel and the TCP socket
/// underneath it. The client retry policy uses [`Sip2Error::is_transient`] to
/// decide which of them are worth another attempt.
#[derive(Error, Debug)]
pub enum Sip2Error {
    #[error("Mandatory field omitted: {field} in message {command}")]
    MandatoryFieldOmitted {
        command: &'static str,
        field: &'static str,
    },

    #[error("Invalid field length for {field}: expected {expected}, got {actual}")]
    InvalidFieldLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid value {value:?} for field {field}: {reason}")]
    InvalidFieldValue {
        field: String,
        value: String,
        reason: &'static str,
    },

    #[error("Message not understood: {0:?}")]
    MessageNotUnderstood(String),

    #[error("Unknown field {field} for message {command}")]
    UnknownField { command: &'static str, field: String },

    #[error("Field {field} holds {expected} values")]
    FieldType {
        field: &'static str,
        expected: FieldKind,
    },

    #[error("Checksum mismatch: received {received:?}, calculated {calculated:04X}")]
    ChecksumError { received: String, calculated: u16 },

    #[error("Sequence mismatch: expected {expected}, received {received:?}")]
    SequenceError { expected: u8, received: Option<u8> },

    #[error("Peer requested a resend")]
    ResendRequested,

    #[error("Unexpected response: expected {expected}, received {received}")]
    UnexpectedResponse {
        expected: &'static str,
        received: String,
    },

    #[error("Retries exceeded after {attempts} attempts: {last_error}")]
    RetriesExceeded { attempts: u32, last_error: String },

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not connected")]
    NotConnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Driver error: {0}")]
    Driver(String),
}

impl Sip2Error {
    /// Returns true for failures a client may clear by re-sending the same line.
    ///
    /// Corrupted, out-of-sequence or mismatched responses, an explicit resend
    /// request from the peer, timeouts and socket errors all qualify. Encode failures and
    /// unparseable responses do not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Sip2Error::ChecksumError { .. }
                | Sip2Error::SequenceError { .. }
                | Sip2Error::ResendRequested
                | Sip2Error::UnexpectedResponse { .. }
                | Sip2Error::Timeout(_)
                | Sip2Error::Connection(_)
                | Sip2Error::Io(_)
        )
    }

    /// Returns true when a line failed its error-detection checks.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Sip2Error::ChecksumError { .. } | Sip2Error::SequenceError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Sip2Error>;
