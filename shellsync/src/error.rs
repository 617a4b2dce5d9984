//! Error types for shellsync.
//!
//! Every failure a [`Session`](crate::Session) can surface is a single
//! [`Error`] value carrying an [`ErrorKind`] and a human-readable detail.
//! Failures of the underlying process/stream layer are [`EngineError`]s and
//! convert into an [`Error`] with the matching kind.

use std::fmt;
use std::io;

use thiserror::Error;

/// Category of a session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing executable, interpreter or transport, or an invalid key file.
    Configuration,

    /// Permission denied, or the password prompt came back.
    Authentication,

    /// A login prompt repeated where it should not, or an unknown state was reached.
    Protocol,

    /// The remote host closed the connection.
    Connection,

    /// Prompt alignment could not be confirmed, or no unique prompt could be installed.
    Synchronization,

    /// A command's prompt did not come back within its timeout.
    Command,

    /// The child process could not be started.
    Spawn,

    /// Reading from or writing to the child process failed.
    Io,

    /// The session is closed and cannot be reused.
    Closed,

    /// The operation is not valid in the session's current state.
    InvalidState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Authentication => "authentication error",
            ErrorKind::Protocol => "protocol error",
            ErrorKind::Connection => "connection error",
            ErrorKind::Synchronization => "synchronization error",
            ErrorKind::Command => "command error",
            ErrorKind::Spawn => "spawn error",
            ErrorKind::Io => "I/O error",
            ErrorKind::Closed => "session closed",
            ErrorKind::InvalidState => "invalid session state",
        };
        f.write_str(name)
    }
}

/// Main error type for shellsync operations.
#[derive(Error, Debug)]
#[error("{kind}: {detail}")]
pub struct Error {
    kind: ErrorKind,
    detail: String,
    #[source]
    source: Option<EngineError>,
}

impl Error {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            source: None,
        }
    }

    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, detail)
    }

    pub fn authentication(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, detail)
    }

    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, detail)
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, detail)
    }

    pub fn synchronization(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Synchronization, detail)
    }

    pub fn command(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Command, detail)
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable detail message.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Errors raised by the process/stream layer.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The executable could not be started.
    #[error("Failed to spawn '{command}': {message}")]
    Spawn { command: String, message: String },

    /// I/O error on the child's stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream was already closed.
    #[error("Stream closed")]
    Closed,

    /// Invalid regex pattern.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        let kind = match &err {
            EngineError::Spawn { .. } => ErrorKind::Spawn,
            EngineError::Io(_) => ErrorKind::Io,
            EngineError::Closed => ErrorKind::Connection,
            EngineError::InvalidPattern(_) => ErrorKind::Configuration,
        };
        Self {
            kind,
            detail: err.to_string(),
            source: Some(err),
        }
    }
}

/// Result type alias using shellsync's Error.
pub type Result<T> = std::result::Result<T, Error>;
