//! Connection configuration.

use std::time::Duration;

/// Default server port.
pub const DEFAULT_PORT: u16 = 8889;

/// Default bound on the TCP handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-read timeout. A timeout alone never closes the connection.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before the first heartbeat after connecting.
pub const DEFAULT_HEARTBEAT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Period between heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Size of the buffer each socket read fills.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Settings for one [`crate::ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Bound on the TCP handshake
    pub connect_timeout: Duration,
    /// Bound on each socket read
    pub read_timeout: Duration,
    /// Delay before the first heartbeat
    pub heartbeat_initial_delay: Duration,
    /// Period between heartbeats
    pub heartbeat_interval: Duration,
    /// Bytes requested per socket read
    pub read_buffer_size: usize,
    /// Enable `SO_KEEPALIVE` on the socket
    pub tcp_keepalive: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            heartbeat_initial_delay: DEFAULT_HEARTBEAT_INITIAL_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            tcp_keepalive: true,
        }
    }
}

impl ClientConfig {
    /// Default settings for the given server.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, ..Self::default() }
    }

    /// `host:port` for logging.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.port, 8889);
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert_eq!(config.heartbeat_initial_delay, Duration::from_secs(1));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.read_buffer_size, 4096);
    }

    #[test]
    fn new_overrides_address_only() {
        let config = ClientConfig::new("chat.example.org", 9000);
        assert_eq!(config.addr(), "chat.example.org:9000");
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
