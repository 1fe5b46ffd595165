//! # SIP2 CLI
//!
//! Command-line interface for the SIP2 daemon and client.
//!
//! This crate provides the `sip2` binary:
//!
//! - **serve**: Run an ACS daemon backed by the demo driver
//! - **send**: Send one request built from JSON and print the response
//! - **status**: Perform the SC status exchange
//!
//! The library half holds the JSON rendering shared by `send` and `status`.

pub mod json;
