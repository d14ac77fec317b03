/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
///
/// Domain rule violations are detected before any write; everything raised
/// after writes have started is rolled back by the surrounding transaction.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Malformed or out-of-range input (negative quantity, discount > 100%,
    /// payment exceeding the amount due)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Concurrent-state conflicts: insufficient stock, duplicate document
    /// code race lost. Callers may retry code allocation; stock conflicts
    /// need manual resolution.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation disallowed in the current lifecycle state (editing a sent
    /// quotation, editing a non-last delivery guide, removing the only
    /// default currency)
    #[error("State error: {0}")]
    State(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected internal failures
    #[error("Internal error: {0}")]
    Internal(String),
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        AppError::State(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// True for errors a caller can safely retry (lost races, not rule
    /// violations)
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}
