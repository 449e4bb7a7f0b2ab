//! Store error handling

use thiserror::Error;

use crate::database::DatabaseError;
use crate::metadata::MetadataError;

/// Errors returned by [`BookmarkStore`](crate::store::BookmarkStore) operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No user is signed in
    #[error("Not signed in")]
    NotSignedIn,

    /// The URL is not an absolute URL
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    /// No bookmark with this id exists
    #[error("Bookmark not found: {0}")]
    NotFound(String),

    /// A stored document is not a valid bookmark
    #[error("Bookmark '{id}' is malformed: {reason}")]
    InvalidDocument { id: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

impl StoreError {
    /// Whether signing in (again) could fix this error
    pub fn needs_sign_in(&self) -> bool {
        match self {
            StoreError::NotSignedIn => true,
            StoreError::Database(DatabaseError::Status { status, .. }) => {
                *status == 401 || *status == 403
            }
            _ => false,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
