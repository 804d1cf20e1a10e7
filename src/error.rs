//! Error handling for the Claimd client

use std::fmt;
use thiserror::Error;

/// Unified error type for the Claimd client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Local I/O errors (session jar, fixture files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The service answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session persistence errors
    #[error("Session error: {0}")]
    Session(String),

    /// An approve/deny action was rejected by the service
    #[error("Review error: {0}")]
    Review(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any request was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request was cancelled by its owner
    #[error("Request cancelled")]
    Cancelled,

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new session error
    pub fn session<T: fmt::Display>(msg: T) -> Self {
        Error::Session(msg.to_string())
    }

    /// Create a new review error
    pub fn review<T: fmt::Display>(msg: T) -> Self {
        Error::Review(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new invalid input error
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Whether the error came from the transport rather than from the service.
    ///
    /// Read paths use this to decide whether the offline fixture may stand in.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_decode(),
            Error::Timeout => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_count_as_transport_failures() {
        let err = Error::Api { status: 503, message: "down".into() };
        assert!(err.is_transport());
        assert!(Error::Timeout.is_transport());
    }

    #[test]
    fn client_errors_and_cancellation_do_not() {
        let err = Error::Api { status: 400, message: "bad".into() };
        assert!(!err.is_transport());
        assert!(!Error::Cancelled.is_transport());
        assert!(!Error::NotFound("A1".into()).is_transport());
    }

    #[test]
    fn undecodable_bodies_are_not_transport_failures() {
        let err: Error = serde_json::from_str::<Vec<u8>>("{\"users\":\"oops\"}")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Json(_)));
        assert!(!err.is_transport());
    }
}
