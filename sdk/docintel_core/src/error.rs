use thiserror::Error;

/// Errors that can occur when talking to the Document Intelligence service.
#[derive(Error, Debug)]
pub enum DocIntelError {
    /// The request failed due to an HTTP error.
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// The service returned an error response body.
    #[error("API error ({code}): {message}")]
    Api { code: String, message: String },

    /// A request could not be constructed from the given inputs.
    #[error("Builder error: {0}")]
    Builder(String),

    /// The request payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request failed at the transport level.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint URL is invalid.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// A required configuration value is missing.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

impl DocIntelError {
    /// Build an [`DocIntelError::InvalidEndpoint`] carrying the parse error text.
    pub fn invalid_endpoint_with_source(
        message: &str,
        source: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidEndpoint(format!("{message}: {source}"))
    }

    /// Build an [`DocIntelError::Http`] error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }
}

/// Result type alias for Document Intelligence operations.
pub type DocIntelResult<T> = std::result::Result<T, DocIntelError>;
