/// Error types for sessions and runs.

use std::time::Duration;

use thiserror::Error;

use crate::decoder::DecodeError;

/// Failure of a single connection's request/response exchange
#[derive(Error, Debug)]
pub enum SessionError {
    /// Could not establish the connection
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// Target address
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Transport error after connecting
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No data or close within the configured wait
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),

    /// Bytes on the wire did not form a valid record
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The resend request carries one byte, so this sequence cannot be asked for
    #[error("sequence {0} does not fit in the one-byte resend parameter")]
    SequenceOutOfRange(i32),
}

impl SessionError {
    /// True for errors raised before the connection was established
    pub fn is_connect(&self) -> bool {
        matches!(self, SessionError::Connect { .. })
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Run-level failures
#[derive(Error, Debug)]
pub enum ClientError {
    /// The initial stream-all connection could not be made
    #[error("initial stream failed: {0}")]
    InitialStream(#[source] SessionError),

    /// Configuration could not be loaded or saved
    #[error("config error: {0}")]
    Config(String),

    /// Final output could not be written
    #[error("output error: {0}")]
    Output(String),
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Output(err.to_string())
    }
}
