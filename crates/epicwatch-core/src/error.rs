//! Error types for epicwatch.

use thiserror::Error;

/// Main error type for epicwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed user input (repository, date, issue list, file)
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Credentials missing or rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// API rate limit exhausted
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        /// Seconds the server asked us to wait, if it said so
        retry_after: Option<u64>,
    },

    /// API returned an error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// EPIC update comment could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Errors raised while reading an EPIC update template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No heading or label of the template was found in the body
    #[error("no recognizable EPIC update sections")]
    NoSections,

    /// Date token is not a literal YYYY-MM-DD calendar date
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl Error {
    /// Map a non-success HTTP status code to an error.
    ///
    /// A 403 is only a rate limit when the response headers say so; callers
    /// check those before falling back to this mapping.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Unauthorized(message),
            404 => Error::NotFound(message),
            429 => Error::RateLimited {
                message,
                retry_after: None,
            },
            _ => Error::Api { status, message },
        }
    }

    /// Whether a single retry of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short machine-readable name of the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Http(_) => "http",
            Error::Unauthorized(_) => "unauthorized",
            Error::NotFound(_) => "not_found",
            Error::RateLimited { .. } => "rate_limited",
            Error::Api { .. } => "api",
            Error::InvalidData(_) | Error::Serialization(_) => "invalid_data",
            Error::Parse(_) => "parse",
            Error::Config(_) => "config",
            Error::Storage(_) => "storage",
            Error::Io(_) => "io",
            Error::Other(_) => "other",
        }
    }
}

/// Result type alias for epicwatch operations.
pub type Result<T> = std::result::Result<T, Error>;
