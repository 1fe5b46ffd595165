//! SIP2 Server
//!
//! The ACS (automated circulation system) side of a SIP2 link.
//!
//! - [`Daemon`] accepts TCP connections and runs a [`Session`] for each
//! - [`Session`] decodes requests, negotiates error detection and handles
//!   resends and retransmissions
//! - [`Driver`] supplies the responses; [`DemoDriver`] is a stand-in with
//!   no backend

pub mod config;
pub mod daemon;
pub mod demo;
pub mod driver;
pub mod session;

pub use config::{bind_addr_from_env, SessionConfig, BIND_ENV, DEFAULT_BIND_ADDR};
pub use daemon::Daemon;
pub use demo::DemoDriver;
pub use driver::Driver;
pub use session::Session;
