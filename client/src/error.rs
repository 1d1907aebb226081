//! Error types for the portal client.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the portal backend.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// Login or token problem
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The current session may not perform the operation
    #[error("Authorization error: {0}")]
    Unauthorized(String),

    /// A required identifier (report id, user id) was empty
    #[error("{0}")]
    MissingIdentifier(String),

    /// Backend answered with a non-2xx status
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// Network failure before a response arrived
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Validation(_) | Error::MissingIdentifier(_) => Some(400),
            Error::Auth(_) => Some(401),
            Error::Unauthorized(_) => Some(403),
            _ => None,
        }
    }

    /// True when the error was raised locally, before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::MissingIdentifier(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(crate::validation::first_message(&errors))
    }
}
