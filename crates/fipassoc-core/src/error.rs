//! Error types for floating IP association management
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for association operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for floating IP association management
#[derive(Error, Debug)]
pub enum Error {
    /// A compute client could not be constructed for the requested region
    #[error("Error creating compute client: {0}")]
    ClientInit(String),

    /// The associate call failed
    #[error("Error associating floating IP: {source}")]
    Association {
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// The disassociate call failed
    #[error("Error disassociating floating IP: {source}")]
    Disassociation {
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// Composite id did not have enough segments
    #[error("Unable to determine floating ip association ID from '{0}'")]
    MalformedId(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors (from the compute API)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The remote object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a client initialization error
    pub fn client_init(msg: impl Into<String>) -> Self {
        Self::ClientInit(msg.into())
    }

    /// Wrap the cause of a failed associate call
    pub fn association(source: Error) -> Self {
        Self::Association {
            source: Box::new(source),
        }
    }

    /// Wrap the cause of a failed disassociate call
    pub fn disassociation(source: Error) -> Self {
        Self::Disassociation {
            source: Box::new(source),
        }
    }

    /// Create a malformed id error
    pub fn malformed_id(id: impl Into<String>) -> Self {
        Self::MalformedId(id.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the remote object is gone
    ///
    /// Only a bare `NotFound` counts. A not-found wrapped inside
    /// `Association`/`Disassociation` has already been judged fatal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
