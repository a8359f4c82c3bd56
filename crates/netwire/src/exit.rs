use std::fmt;
use std::io;

use netwire_codec::{ErrorKind, WireError};
use netwire_connection::ConnectionError;
use netwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FAILURE,
        _ => TRANSPORT_ERROR,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(&err), format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_code(source),
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    let code = match &err {
        WireError::Transport(source) | WireError::Stream(source) => io_code(source),
        other => match other.kind() {
            ErrorKind::ConnectionReset => FAILURE,
            ErrorKind::TransportFault => TRANSPORT_ERROR,
            ErrorKind::MalformedMessage | ErrorKind::EncodingFailure => DATA_INVALID,
            ErrorKind::StreamFault => FAILURE,
            ErrorKind::InvalidState => INTERNAL,
        },
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn connection_error(context: &str, err: ConnectionError) -> CliError {
    let ConnectionError::Transport(err) = err;
    transport_error(context, err)
}
