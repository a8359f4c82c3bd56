use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use netwire_transport::TcpTransport;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::error::Result;

/// Listens for and accepts TCP connections.
pub struct ConnectionListener {
    transport: TcpTransport,
    config: ConnectionConfig,
}

impl ConnectionListener {
    /// Bind and listen on `addr`.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        Self::bind_with_config(addr, ConnectionConfig::default())
    }

    /// Bind with explicit configuration for accepted connections.
    pub fn bind_with_config(
        addr: impl ToSocketAddrs + std::fmt::Debug,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let transport = TcpTransport::bind_with_options(addr, config.tcp_options())?;
        Ok(Self { transport, config })
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<(Connection<TcpStream>, SocketAddr)> {
        let (stream, peer) = self.transport.accept()?;
        debug!(%peer, "connection ready");
        Ok((Connection::with_config(stream, self.config.wire.clone()), peer))
    }

    /// Iterate over incoming connections, one blocking accept per item.
    pub fn incoming(&self) -> impl Iterator<Item = Result<(Connection<TcpStream>, SocketAddr)>> + '_ {
        std::iter::repeat_with(move || self.accept())
    }

    /// Bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Configuration applied to accepted connections.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

impl std::fmt::Debug for ConnectionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionListener")
            .field("local_addr", &self.local_addr())
            .field("config", &self.config)
            .finish()
    }
}
