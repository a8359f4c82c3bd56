use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

/// A connected, bidirectional, blocking byte channel.
///
/// Every method takes `&self` so that one thread may drive receives while
/// another drives sends on the same channel. Releasing the channel is
/// dropping it; implementations close the underlying handle in `Drop`.
pub trait Channel: Send + Sync {
    /// Send some prefix of `buf`, returning how many bytes were accepted.
    fn send_some(&self, buf: &[u8]) -> io::Result<usize>;

    /// Receive into `buf`, returning how many bytes arrived.
    ///
    /// `Ok(0)` for a non-empty `buf` means the peer closed the connection.
    fn receive_some(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Shut down both directions of the channel.
    fn shutdown(&self) -> io::Result<()>;

    /// Whether the channel still reports an attached peer.
    fn is_connected(&self) -> bool;
}

impl Channel for TcpStream {
    fn send_some(&self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn receive_some(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }

    fn is_connected(&self) -> bool {
        self.peer_addr().is_ok()
    }
}

#[cfg(unix)]
impl Channel for std::os::unix::net::UnixStream {
    fn send_some(&self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn receive_some(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }

    fn shutdown(&self) -> io::Result<()> {
        std::os::unix::net::UnixStream::shutdown(self, Shutdown::Both)
    }

    fn is_connected(&self) -> bool {
        self.peer_addr().is_ok()
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send_some(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).send_some(buf)
    }

    fn receive_some(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).receive_some(buf)
    }

    fn shutdown(&self) -> io::Result<()> {
        (**self).shutdown()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

impl<C: Channel + ?Sized> Channel for Arc<C> {
    fn send_some(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).send_some(buf)
    }

    fn receive_some(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).receive_some(buf)
    }

    fn shutdown(&self) -> io::Result<()> {
        (**self).shutdown()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
