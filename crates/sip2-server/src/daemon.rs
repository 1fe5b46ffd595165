use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use sip2_common::protocol::catalog;
use sip2_common::protocol::error::{Result, Sip2Error};
use sip2_common::transport::StreamChannel;

use crate::config::SessionConfig;
use crate::driver::Driver;
use crate::session::Session;

/// TCP listener that runs a [`Session`] per accepted SC connection.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sip2_server::{Daemon, DemoDriver, SessionConfig};
///
/// # async fn example() -> sip2_common::Result<()> {
/// let daemon = Daemon::bind("0.0.0.0:6001", SessionConfig::default()).await?;
/// daemon.run(Arc::new(DemoDriver::new())).await
/// # }
/// ```
pub struct Daemon {
    listener: TcpListener,
    config: SessionConfig,
}

impl Daemon {
    /// Binds the listening socket.
    ///
    /// The message catalog and session config are validated first so a bad
    /// setup fails here rather than on the first connection.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - The address to listen on (e.g., "0.0.0.0:6001")
    /// * `config` - Settings applied to every session
    pub async fn bind(bind_addr: &str, config: SessionConfig) -> Result<Self> {
        catalog::validate()?;
        config.validate()?;

        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| Sip2Error::Connection(format!("Failed to bind to {}: {}", bind_addr, e)))?;
        info!("SIP2 daemon listening on {}", bind_addr);

        Ok(Self { listener, config })
    }

    /// Gets the actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| Sip2Error::Connection(format!("Failed to get local addr: {}", e)))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Accepts connections until the listener fails.
    pub async fn run<D>(&self, driver: Arc<D>) -> Result<()>
    where
        D: Driver + ?Sized + 'static,
    {
        self.run_until(driver, std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Sessions already running are left to finish on their own.
    pub async fn run_until<D, F>(&self, driver: Arc<D>, shutdown: F) -> Result<()>
    where
        D: Driver + ?Sized + 'static,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => {
                    info!("SIP2 daemon shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted.map_err(|e| {
                    Sip2Error::Connection(format!("Failed to accept connection: {}", e))
                })?,
            };

            info!("Connection established from {}", peer_addr);
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
            }

            let channel = StreamChannel::with_max_line_length(stream, self.config.max_line_length);
            let session = Session::new(channel, driver.clone(), self.config.clone())
                .with_peer(peer_addr.to_string());
            tokio::spawn(async move {
                if let Err(e) = session.run().await {
                    warn!("Session with {} ended with error: {}", peer_addr, e);
                }
            });
        }
    }
}
