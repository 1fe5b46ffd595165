//! Session configuration for the ACS side.

use std::time::Duration;

use sip2_common::protocol::error::{Result, Sip2Error};
use sip2_common::transport::{ErrorDetection, DEFAULT_MAX_LINE_LENGTH};

/// Environment variable consulted for the daemon's bind address.
pub const BIND_ENV: &str = "SIP2_BIND";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:6001";

/// Per-connection settings applied by every session a daemon spawns.
///
/// # Example
///
/// ```
/// use sip2_server::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new()
///     .with_idle_timeout(Some(Duration::from_secs(300)))
///     .with_strict_checksum(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Close the session after this long without a request. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Require checksums from the first message, regardless of negotiation.
    pub strict_checksum: bool,
    /// Require sequence digits from the first message, regardless of negotiation.
    pub strict_sequence: bool,
    /// Longest request line accepted.
    pub max_line_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            strict_checksum: false,
            strict_sequence: false,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
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

    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// Error detection forced on regardless of what the SC negotiates.
    pub fn forced_error_detection(&self) -> ErrorDetection {
        ErrorDetection::new(self.strict_checksum, self.strict_sequence)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the idle timeout is zero or the line limit is
    /// too small to hold the longest fixed message section.
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Sip2Error::Config(
                "idle timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_line_length < 128 {
            return Err(Sip2Error::Config(format!(
                "max line length must be >= 128 (got {})",
                self.max_line_length
            )));
        }
        Ok(())
    }
}

/// Reads the bind address from `SIP2_BIND`, falling back to `0.0.0.0:6001`.
pub fn bind_addr_from_env() -> String {
    std::env::var(BIND_ENV)
        .ok()
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
}
