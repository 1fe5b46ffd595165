//! SIP2 transport layer.
//!
//! # Components
//!
//! - **[`Codec`]**: Encodes messages to wire lines and decodes them back,
//!   applying the checksum and sequence trailer
//! - **[`LineChannel`]** / **[`StreamChannel`]**: Carriage-return delimited
//!   line exchange over any async byte stream
//! - **[`tcp`]**: TCP connection helpers
//!
//! # Wire Format
//!
//! ```text
//! <command:2><positional fields><TAGvalue|>...[AY<digit>][AZ<hex4>]\r
//! ```

pub mod channel;
pub mod codec;
pub mod tcp;

pub use channel::{LineChannel, StreamChannel, DEFAULT_MAX_LINE_LENGTH, LINE_TERMINATOR};
pub use codec::{Codec, ErrorDetection, Frame};

#[cfg(test)]
mod tests;
