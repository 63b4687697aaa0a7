use crate::response::Status;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server returned a non-success status for an invocation
    #[error("{message}")]
    CallError { status: Status, message: String },
    /// A requested column is not part of the result table
    #[error("column [{0}] not found")]
    ColumnNotFound(String),
    /// The endpoint could not be reached or refused the session
    #[error("unable to connect to {endpoint}: {message}")]
    ConnectionError { endpoint: String, message: String },
    /// The connection closed before a response was received
    #[error("connection lost")]
    ConnectionLost,
    /// A column value does not have the requested type
    #[error("column [{column}] is {actual}, expected {expected}")]
    InvalidColumnType {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// IO error
    #[error("{0}")]
    IoError(String),
    /// Malformed or unexpected message on the wire
    #[error("{0}")]
    ProtocolError(String),
}

/// Converts a [`std::io::Error`] into an [`IoError`](Error::IoError)
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IoError(error.to_string())
    }
}

/// Converts a [`serde_json::Error`] into a [`ProtocolError`](Error::ProtocolError)
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::ProtocolError(error.to_string())
    }
}

/// Converts a [`tokio_util::codec::LinesCodecError`] into a
/// [`ProtocolError`](Error::ProtocolError) or [`IoError`](Error::IoError)
impl From<tokio_util::codec::LinesCodecError> for Error {
    fn from(error: tokio_util::codec::LinesCodecError) -> Self {
        match error {
            tokio_util::codec::LinesCodecError::Io(error) => Error::from(error),
            tokio_util::codec::LinesCodecError::MaxLineLengthExceeded => {
                Error::ProtocolError("maximum message length exceeded".to_string())
            }
        }
    }
}
