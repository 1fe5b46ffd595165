use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::protocol::error::{Result, Sip2Error};
use crate::transport::channel::StreamChannel;

/// Connects to a SIP2 endpoint.
///
/// Resolves `addr` and tries each resulting address in turn until one
/// accepts within `timeout`.
///
/// # Arguments
///
/// * `addr` - `host:port` of the ACS
/// * `timeout` - Limit for each connection attempt
///
/// # Errors
///
/// Returns `Connection` if the address does not resolve or every attempt
/// fails, and `Timeout` if the last attempt ran out of time.
pub async fn connect(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let socket_addrs = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| Sip2Error::Connection(format!("Invalid address '{}': {}", addr, e)))?;

    let mut last_err = None;
    for socket_addr in socket_addrs {
        debug!("Connecting to {}", socket_addr);
        match tokio::time::timeout(timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(stream)) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Ok(Err(e)) => {
                last_err = Some(Sip2Error::Connection(format!(
                    "Failed to connect to {}: {}",
                    addr, e
                )))
            }
            Err(_) => last_err = Some(Sip2Error::Timeout(timeout.as_millis() as u64)),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        Sip2Error::Connection(format!("Failed to connect to {}: no addresses", addr))
    }))
}

/// Connects and wraps the socket in a [`StreamChannel`].
pub async fn open(addr: &str, timeout: Duration) -> Result<StreamChannel<TcpStream>> {
    connect(addr, timeout).await.map(StreamChannel::new)
}
