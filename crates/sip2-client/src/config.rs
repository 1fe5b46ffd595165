use std::time::Duration;

use sip2_common::protocol::error::{Result, Sip2Error};
use sip2_common::transport::ErrorDetection;

/// Environment variable consulted for the ACS address.
pub const SERVER_ENV: &str = "SIP2_SERVER";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6001;

/// Client connection settings.
///
/// # Default Configuration
///
/// - `host`: `127.0.0.1`, `port`: 6001
/// - `connect_timeout` and `idle_timeout`: 30 seconds
/// - `retry_attempts`: 2 (three sends in total), `retry_wait`: 500 ms
/// - checksum and sequence enforcement off
///
/// # Example
///
/// ```
/// use sip2_client::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig::new("10.0.0.5", 6001)
///     .with_idle_timeout(Duration::from_secs(5))
///     .with_retry_attempts(4)
///     .with_strict_checksum(true)
///     .with_strict_sequence(true);
///
/// assert_eq!(config.addr(), "10.0.0.5:6001");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Limit for establishing the TCP connection
    pub connect_timeout: Duration,
    /// Limit for waiting on each response
    pub idle_timeout: Duration,
    /// Extra sends after the first one fails transiently
    pub retry_attempts: u32,
    /// Pause between sends
    pub retry_wait: Duration,
    /// Add and require `AZ` checksums
    pub strict_checksum: bool,
    /// Add and require `AY` sequence digits
    pub strict_sequence: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            retry_attempts: 2,
            retry_wait: Duration::from_millis(500),
            strict_checksum: false,
            strict_sequence: false,
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Builds a config from a `host:port` string.
    pub fn from_addr(addr: &str) -> Result<Self> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| Sip2Error::Config(format!("expected host:port, got '{}'", addr)))?;
        let port = port
            .parse()
            .map_err(|e| Sip2Error::Config(format!("invalid port in '{}': {}", addr, e)))?;
        Ok(Self::new(host.trim_start_matches('[').trim_end_matches(']'), port))
    }

    /// Reads the address from `SIP2_SERVER`, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var(SERVER_ENV) {
            Ok(addr) if !addr.trim().is_empty() => Self::from_addr(addr.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_retry_wait(mut self, wait: Duration) -> Self {
        self.retry_wait = wait;
        self
    }

    pub fn with_strict_checksum(mut self, enabled: bool) -> Self {
        self.strict_checksum = enabled;
        self
    }

    pub fn with_strict_sequence(mut self, enabled: bool) -> Self {
        self.strict_sequence = enabled;
        self
    }

    /// Error-detection features this client uses.
    pub fn error_detection(&self) -> ErrorDetection {
        ErrorDetection::new(self.strict_checksum, self.strict_sequence)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` if:
    /// - The host is empty or the port is zero
    /// - Either timeout is zero
    /// - More than 10 retries are requested
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Sip2Error::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(Sip2Error::Config("port must be greater than zero".to_string()));
        }
        if self.connect_timeout.is_zero() || self.idle_timeout.is_zero() {
            return Err(Sip2Error::Config("timeouts must be greater than zero".to_string()));
        }
        if self.retry_attempts > 10 {
            return Err(Sip2Error::Config(format!(
                "retry attempts must be <= 10 (got {})",
                self.retry_attempts
            )));
        }
        Ok(())
    }
}
