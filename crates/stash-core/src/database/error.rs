//! Database error handling

use thiserror::Error;

/// Errors returned by a [`DocumentDatabase`](super::DocumentDatabase)
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Transport-level failure talking to the database
    #[error("Database request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The database answered with a non-success status
    #[error("Database returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A response could not be decoded
    #[error("Failed to decode database response: {0}")]
    Decode(String),

    /// The addressed document does not exist
    #[error("Document '{collection}/{id}' not found")]
    NotFound { collection: String, id: String },

    /// The database cannot serve requests right now
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Required connection settings are missing
    #[error("Database not configured: {0}")]
    NotConfigured(String),
}

impl DatabaseError {
    /// Whether the failure happened before or while reaching the database,
    /// as opposed to the database rejecting the request
    pub fn is_connectivity(&self) -> bool {
        match self {
            DatabaseError::Http(e) => e.is_connect() || e.is_timeout(),
            DatabaseError::Unavailable(_) => true,
            DatabaseError::Status { status, .. } => *status == 503,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(error: serde_json::Error) -> Self {
        DatabaseError::Decode(error.to_string())
    }
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
