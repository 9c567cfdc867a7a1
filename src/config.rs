//! # Config
//!
//! Connection parameters for an FTP client, immutable once the session is
//! established.

use std::time::Duration;

use crate::types::{FtpError, FtpResult};

/// Where and how to connect.
///
/// The defaults match the classic anonymous-FTP setup: `localhost:21`,
/// user and password `anonymous`, ten-second timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server host name or address.
    pub host: String,
    /// Control connection port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Dial timeout for both connections and reply wait timeout on the
    /// control channel; also the idle timeout for data transfers.
    pub timeout: Duration,
    /// Idle interval after which a `NOOP` is sent before the next command.
    pub keepalive: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 21,
            user: "anonymous".to_string(),
            password: "anonymous".to_string(),
            timeout: Duration::from_millis(10_000),
            keepalive: Duration::from_millis(10_000),
        }
    }
}

impl ConnectionConfig {
    /// Configuration for `host` with every other field at its default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> FtpResult<()> {
        if self.host.trim().is_empty() {
            return Err(FtpError::Argument("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(FtpError::Argument("port must not be zero".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(FtpError::Argument("timeout must not be zero".to_string()));
        }
        if self.keepalive.is_zero() {
            return Err(FtpError::Argument(
                "keepalive interval must not be zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host.as_str(), "localhost");
        assert_eq!(config.port, 21);
        assert_eq!(config.user.as_str(), "anonymous");
        assert_eq!(config.password.as_str(), "anonymous");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.keepalive, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_for_host() {
        let config = ConnectionConfig::new("ftp.example.com");
        assert_eq!(config.host.as_str(), "ftp.example.com");
        assert_eq!(config.port, 21);
    }

    #[test]
    fn validation() {
        let mut config = ConnectionConfig::default();
        config.host = "  ".to_string();
        assert!(matches!(config.validate(), Err(FtpError::Argument(_))));

        let mut config = ConnectionConfig::default();
        config.port = 0;
        assert!(matches!(config.validate(), Err(FtpError::Argument(_))));

        let mut config = ConnectionConfig::default();
        config.timeout = Duration::ZERO;
        assert!(matches!(config.validate(), Err(FtpError::Argument(_))));
    }
}
