//! SIP2 Common Types and Transport
//!
//! This crate provides the message schemas, codec and line transport shared
//! by the SIP2 client, server and command-line tool.
//!
//! # Overview
//!
//! SIP2 (Standard Interchange Protocol, version 2) is the line-oriented text
//! protocol self-check machines (SCs) use to talk to a library's automated
//! circulation system (ACS). This crate contains:
//!
//! - **Protocol Layer**: Declarative message schemas, the full message
//!   catalog, typed messages, checksum and sequence arithmetic
//! - **Transport Layer**: The codec plus async line channels over TCP
//!
//! # Components
//!
//! - [`protocol`] - Schemas, catalog, [`Message`], errors
//! - [`transport`] - [`Codec`](transport::Codec), line channels, TCP helpers
//!
//! # Example
//!
//! ```
//! use sip2_common::{catalog, datetime, Message};
//! use sip2_common::transport::{Codec, ErrorDetection};
//!
//! let mut request = Message::new(&catalog::ITEM_INFORMATION);
//! request
//!     .set("transaction_date", datetime::now()).unwrap()
//!     .set("item_identifier", "300000000").unwrap();
//!
//! let line = Codec::new(ErrorDetection::FULL).encode(&request, Some(0)).unwrap();
//! assert!(line.starts_with("17"));
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
