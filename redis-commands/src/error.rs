use std::fmt;
use std::io;

use bytes::Bytes;

// ── Error ───────────────────────────────────────────────────────────────

/// Errors returned while building, sending or parsing a command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller arguments were rejected before anything was sent.
    #[error("{command}: {message}")]
    InvalidArgument {
        /// Identifier of the command being built.
        command: String,
        /// What was wrong with the arguments.
        message: String,
    },

    /// The server answered with an error reply.
    #[error("{0}")]
    Server(ServerError),

    /// The registry has no definition for the identifier.
    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),

    /// The reply did not have the shape the command's parser expects.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(&'static str),

    /// The connection was closed before a reply was received.
    #[error("connection closed")]
    ConnectionClosed,

    /// I/O error raised by the transport.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an argument validation error for `command`.
    pub fn invalid(command: &str, message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            command: command.to_string(),
            message: message.into(),
        }
    }

    /// Returns the server error, if the server rejected the command.
    pub fn as_server(&self) -> Option<&ServerError> {
        match self {
            Error::Server(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if the error was raised before any I/O happened.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }
}

impl From<ServerError> for Error {
    fn from(err: ServerError) -> Self {
        Error::Server(err)
    }
}

// ── ServerError ─────────────────────────────────────────────────────────

/// An error reply as sent by the server, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    text: String,
}

impl ServerError {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The error code: the first word of the reply, e.g. `ERR` or `WRONGTYPE`.
    pub fn code(&self) -> &str {
        self.text.split(' ').next().unwrap_or_default()
    }

    /// The message following the error code.
    pub fn message(&self) -> &str {
        match self.text.split_once(' ') {
            Some((_, message)) => message,
            None => "",
        }
    }

    /// The full error text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<Bytes> for ServerError {
    fn from(text: Bytes) -> Self {
        Self::new(String::from_utf8_lossy(&text).into_owned())
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_parts() {
        let err = ServerError::new("WRONGTYPE Operation against a key holding the wrong kind of value");
        assert_eq!(err.code(), "WRONGTYPE");
        assert_eq!(
            err.message(),
            "Operation against a key holding the wrong kind of value"
        );
    }

    #[test]
    fn test_server_error_without_message() {
        let err = ServerError::from(Bytes::from_static(b"NOSCRIPT"));
        assert_eq!(err.code(), "NOSCRIPT");
        assert_eq!(err.message(), "");
    }

    #[test]
    fn test_display_is_verbatim() {
        let err = Error::from(ServerError::new("ERR no such client"));
        assert_eq!(err.to_string(), "ERR no such client");
        assert!(err.as_server().is_some());
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = Error::invalid("HEXPIRE", "Unsupported flag value");
        assert_eq!(err.to_string(), "HEXPIRE: Unsupported flag value");
        assert!(err.is_invalid_argument());
    }
}
