use std::time::Duration;

use netwire_codec::WireConfig;
use netwire_transport::TcpOptions;

/// Configuration for connections produced by the TCP helpers.
///
/// Timeouts are applied to the socket itself. A receive that outlives the
/// read timeout fails as a transport fault and tears the connection down.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Packet bound and relay chunking.
    pub wire: WireConfig,
    /// Read timeout for blocking receives. `None` waits indefinitely.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking sends. `None` waits indefinitely.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm. Default: `true`.
    pub nodelay: bool,
}

impl ConnectionConfig {
    /// Socket options derived from this config.
    pub fn tcp_options(&self) -> TcpOptions {
        TcpOptions {
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            nodelay: self.nodelay,
        }
    }

    /// Apply the same timeout to both directions.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self.write_timeout = Some(timeout);
        self
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            wire: WireConfig::default(),
            read_timeout: None,
            write_timeout: None,
            nodelay: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_wait_forever_without_nagle() {
        let cfg = ConnectionConfig::default();
        assert!(cfg.read_timeout.is_none());
        assert!(cfg.write_timeout.is_none());
        assert!(cfg.tcp_options().nodelay);
        assert_eq!(cfg.wire.max_packet_size, netwire_codec::DEFAULT_MAX_PACKET);
    }

    #[test]
    fn with_timeout_sets_both_directions() {
        let opts = ConnectionConfig::default()
            .with_timeout(Duration::from_secs(3))
            .tcp_options();
        assert_eq!(opts.read_timeout, Some(Duration::from_secs(3)));
        assert_eq!(opts.write_timeout, Some(Duration::from_secs(3)));
    }
}
