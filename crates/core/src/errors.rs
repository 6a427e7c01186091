//! Core error types for the Depanku sync layer.
//!
//! Remote adapters convert their transport-specific failures into
//! [`Error::Remote`] so that stores stay independent of any HTTP stack.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the sync layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Local storage operation failed: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("A bookmark update for '{0}' is already in progress")]
    ToggleInFlight(String),

    #[error("Invalid configuration value: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Remote(_) => "We couldn't reach the server. Please try again.",
            Error::Unauthenticated(_) => "Please sign in to continue.",
            Error::Storage(_) | Error::Io(_) => "Local storage is unavailable.",
            Error::Serialization(_) => "We received data we couldn't read.",
            Error::ToggleInFlight(_) => "Please wait for the previous update to finish.",
            Error::Config(_) => "The application is misconfigured.",
        }
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
