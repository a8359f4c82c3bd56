use std::fmt;

/// Coarse classification of a [`WireError`].
///
/// Only [`ErrorKind::ConnectionReset`] and [`ErrorKind::TransportFault`]
/// tear the channel down. Every other kind leaves the connection usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The peer closed or reset the connection mid-transfer.
    ConnectionReset,
    /// The underlying channel reported an I/O error.
    TransportFault,
    /// A decoded length, string or value violates the wire format.
    MalformedMessage,
    /// A value could not be turned into its wire representation.
    EncodingFailure,
    /// A caller-supplied source or sink failed during a stream relay.
    StreamFault,
    /// The channel was never attached or has already been released.
    InvalidState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ConnectionReset => "connection reset",
            ErrorKind::TransportFault => "transport fault",
            ErrorKind::MalformedMessage => "malformed message",
            ErrorKind::EncodingFailure => "encoding failure",
            ErrorKind::StreamFault => "stream fault",
            ErrorKind::InvalidState => "invalid state",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while moving typed values over a channel.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The peer closed the connection before the requested bytes arrived.
    #[error("connection reset by peer ({transferred} of {expected} bytes transferred)")]
    ConnectionReset { expected: usize, transferred: usize },

    /// The channel itself failed.
    #[error("transport I/O error: {0}")]
    Transport(#[source] std::io::Error),

    /// A length prefix decoded to a negative value.
    #[error("negative length prefix ({0})")]
    NegativeLength(i32),

    /// A length prefix exceeds the configured bound.
    #[error("length prefix too large ({size} bytes, max {max})")]
    LengthTooLarge { size: usize, max: usize },

    /// A string payload is not valid UTF-8.
    #[error("invalid UTF-8 in string payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A decoded value has a bit pattern its type does not allow.
    #[error("invalid {ty} on the wire: {reason}")]
    InvalidValue { ty: &'static str, reason: String },

    /// A value has no wire representation.
    #[error("cannot encode {ty}: {reason}")]
    Encoding { ty: &'static str, reason: String },

    /// An outgoing payload exceeds the configured bound.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A relay source ended before the requested byte count.
    #[error("source exhausted after {actual} of {expected} bytes")]
    SourceExhausted { expected: u64, actual: u64 },

    /// A caller-supplied source or sink failed.
    #[error("stream I/O error: {0}")]
    Stream(#[source] std::io::Error),

    /// No channel is attached to this handle.
    #[error("channel was never attached")]
    NotAttached,

    /// A channel is already attached to this handle.
    #[error("channel already attached")]
    AlreadyAttached,

    /// The channel has been shut down and released.
    #[error("channel already released")]
    Released,
}

impl WireError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WireError::ConnectionReset { .. } => ErrorKind::ConnectionReset,
            WireError::Transport(_) => ErrorKind::TransportFault,
            WireError::NegativeLength(_)
            | WireError::LengthTooLarge { .. }
            | WireError::InvalidUtf8(_)
            | WireError::InvalidValue { .. } => ErrorKind::MalformedMessage,
            WireError::Encoding { .. }
            | WireError::PayloadTooLarge { .. }
            | WireError::SourceExhausted { .. } => ErrorKind::EncodingFailure,
            WireError::Stream(_) => ErrorKind::StreamFault,
            WireError::NotAttached | WireError::AlreadyAttached | WireError::Released => {
                ErrorKind::InvalidState
            }
        }
    }

    /// Whether this error leaves the channel unusable and must tear it down.
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ConnectionReset | ErrorKind::TransportFault
        )
    }

    pub(crate) fn invalid_value(ty: &'static str, reason: impl Into<String>) -> Self {
        WireError::InvalidValue {
            ty,
            reason: reason.into(),
        }
    }

    pub(crate) fn encoding(ty: &'static str, reason: impl Into<String>) -> Self {
        WireError::Encoding {
            ty,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WireError>;

/// A refused [`attach`](crate::Link::attach) hands the channel back
/// untouched so the caller can keep using or close it.
pub struct AttachError<C> {
    error: WireError,
    channel: C,
}

impl<C> AttachError<C> {
    pub(crate) fn new(error: WireError, channel: C) -> Self {
        Self { error, channel }
    }

    /// Why the channel was refused.
    pub fn error(&self) -> &WireError {
        &self.error
    }

    /// Take the refused channel back.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Split into the refusal reason and the channel.
    pub fn into_parts(self) -> (WireError, C) {
        (self.error, self.channel)
    }
}

impl<C> From<AttachError<C>> for WireError {
    fn from(err: AttachError<C>) -> Self {
        err.error
    }
}

impl<C> fmt::Debug for AttachError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<C> fmt::Display for AttachError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attach refused: {}", self.error)
    }
}

impl<C> std::error::Error for AttachError<C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
