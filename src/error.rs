use thiserror::Error;

/// Main error type for the signal relay
#[derive(Error, Debug)]
pub enum PyramidError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Signal errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Broker errors
    #[error("Broker credentials error: {0}")]
    Auth(String),

    // State errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PyramidError {
    /// Short machine-readable kind, used in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PyramidError::Config(_) => "config",
            PyramidError::Http(_) => "broker_unreachable",
            PyramidError::Json(_) => "serialization",
            PyramidError::Validation(_) => "invalid_signal",
            PyramidError::Auth(_) => "broker_auth",
            PyramidError::Persistence(_) => "persistence",
            PyramidError::InvalidState(_) => "invalid_state",
            PyramidError::Io(_) => "io",
            PyramidError::Internal(_) => "internal",
        }
    }

    /// True when the caller sent something we refuse to act on
    pub fn is_client_error(&self) -> bool {
        matches!(self, PyramidError::Validation(_))
    }
}

/// Result type alias for PyramidError
pub type Result<T> = std::result::Result<T, PyramidError>;
