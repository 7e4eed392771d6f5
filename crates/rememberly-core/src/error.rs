//! Error types for rememberly-core

use thiserror::Error;

use crate::auth::AuthError;

/// Result type alias using rememberly-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// User-facing message shown for connectivity failures.
pub const OFFLINE_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection and try again.";

/// Lowercase fragments that identify transport failures in error text.
const NETWORK_MARKERS: [&str; 6] = [
    "failed to fetch",
    "network request failed",
    "error sending request",
    "connection refused",
    "dns error",
    "timed out",
];

/// Errors that can occur in rememberly-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// No active session for an operation that needs one
    #[error("User not authenticated")]
    Unauthenticated,

    /// Requested entity is not present
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport-level failure reaching the remote gateway
    #[error("Network error: {0}")]
    Network(String),

    /// Remote validation/constraint error, passed through verbatim
    #[error("{0}")]
    Api(String),

    /// Other HTTP client error
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Auth client error
    #[error(transparent)]
    Auth(AuthError),

    /// Notification platform error
    #[error("Notification error: {0}")]
    Notification(String),

    /// Missing or malformed client configuration
    #[error("{0}")]
    Config(String),
}

impl Error {
    /// Whether this failure means the remote side could not be reached.
    pub fn is_offline(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http(error) => is_transport_error(error),
            Self::Auth(error) => error.is_network(),
            Self::Api(message) => message_looks_offline(message),
            _ => false,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        if self.is_offline() {
            OFFLINE_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if is_transport_error(&error) {
            Self::Network(error.to_string())
        } else {
            Self::Http(error)
        }
    }
}

impl From<AuthError> for Error {
    fn from(error: AuthError) -> Self {
        if error.is_network() {
            Self::Network(error.to_string())
        } else {
            Self::Auth(error)
        }
    }
}

pub(crate) fn is_transport_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || (error.is_request() && error.status().is_none())
}

pub(crate) fn message_looks_offline(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    NETWORK_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
