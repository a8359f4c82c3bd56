/// Errors that can occur while establishing a connection.
///
/// Once a [`Connection`](crate::Connection) exists its operations return
/// [`netwire_codec::WireError`] directly.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] netwire_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
