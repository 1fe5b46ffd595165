//! SIP2 Client
//!
//! The SC (self-check) side of a SIP2 link: a [`Connection`] to an ACS that
//! sends one request at a time and applies the retry policy from its
//! [`ConnectionConfig`].

pub mod config;
pub mod connection;

pub use config::ConnectionConfig;
pub use connection::{Connection, ConnectionState};
