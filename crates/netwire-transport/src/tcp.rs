use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Channel-level socket options applied to every stream this transport
/// hands out.
///
/// Timeouts live here rather than in the codec: a blocking receive either
/// completes, observes peer closure, or waits for as long as the socket
/// allows.
#[derive(Debug, Clone, Default)]
pub struct TcpOptions {
    /// Read timeout for blocking receives. `None` waits indefinitely.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking sends. `None` waits indefinitely.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm.
    pub nodelay: bool,
}

impl TcpOptions {
    /// Apply these options to a connected stream.
    pub fn apply(&self, stream: &TcpStream) -> Result<()> {
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        stream.set_nodelay(self.nodelay)?;
        Ok(())
    }
}

/// TCP listener that yields connected streams.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
    options: TcpOptions,
}

impl TcpTransport {
    /// Bind and listen on `addr`.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        Self::bind_with_options(addr, TcpOptions::default())
    }

    /// Bind and listen on `addr`, applying `options` to accepted streams.
    pub fn bind_with_options(
        addr: impl ToSocketAddrs + std::fmt::Debug,
        options: TcpOptions,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: format!("{addr:?}"),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: format!("{addr:?}"),
            source: e,
        })?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
            options,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        self.options.apply(&stream)?;
        debug!(%peer, "accepted connection");
        Ok((stream, peer))
    }

    /// Connect to a listening TCP socket (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<TcpStream> {
        Self::connect_with_options(addr, &TcpOptions::default())
    }

    /// Connect and apply `options` to the new stream.
    pub fn connect_with_options(
        addr: impl ToSocketAddrs + std::fmt::Debug,
        options: &TcpOptions,
    ) -> Result<TcpStream> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: format!("{addr:?}"),
            source: e,
        })?;
        options.apply(&stream)?;
        debug!(?addr, "connected to tcp socket");
        Ok(stream)
    }

    /// Connect to a single resolved address, giving up after `timeout`.
    pub fn connect_timeout(
        addr: &SocketAddr,
        timeout: Duration,
        options: &TcpOptions,
    ) -> Result<TcpStream> {
        let stream =
            TcpStream::connect_timeout(addr, timeout).map_err(|e| TransportError::Connect {
                addr: addr.to_string(),
                source: e,
            })?;
        options.apply(&stream)?;
        debug!(%addr, "connected to tcp socket");
        Ok(stream)
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
