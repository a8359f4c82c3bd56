use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use netwire_transport::TcpTransport;

use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::error::Result;

/// Connect to a listening peer over TCP.
pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Connection<TcpStream>> {
    connect_with_config(addr, &ConnectionConfig::default())
}

/// Connect with explicit configuration.
pub fn connect_with_config(
    addr: impl ToSocketAddrs + std::fmt::Debug,
    config: &ConnectionConfig,
) -> Result<Connection<TcpStream>> {
    let stream = TcpTransport::connect_with_options(addr, &config.tcp_options())?;
    Ok(Connection::with_config(stream, config.wire.clone()))
}

/// Connect to one resolved address, giving up after `timeout`.
pub fn connect_timeout(
    addr: &SocketAddr,
    timeout: Duration,
    config: &ConnectionConfig,
) -> Result<Connection<TcpStream>> {
    let stream = TcpTransport::connect_timeout(addr, timeout, &config.tcp_options())?;
    Ok(Connection::with_config(stream, config.wire.clone()))
}
