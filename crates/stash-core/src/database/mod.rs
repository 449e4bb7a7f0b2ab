//! Document database access
//!
//! The store talks to its backend through the [`DocumentDatabase`] trait:
//! equality-filtered queries, point reads, field updates and inserts that
//! return a generated id.
//!
//! ## Implementations
//!
//! - [`FirestoreClient`]: Firestore over its REST API
//! - [`MemoryDatabase`]: in-process, for tests and embedding

mod error;
mod firestore;
mod memory;
mod value;

use async_trait::async_trait;

pub use error::{DatabaseError, DatabaseResult};
pub use firestore::{FirestoreClient, FirestoreSettings};
pub use memory::MemoryDatabase;
pub use value::{FieldValue, Fields};

/// A stored document: its id plus its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// An equality filter: `field == value`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: FieldValue,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Check a document against this filter
    ///
    /// A document missing the field never matches.
    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// Remote (or local) document storage
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    /// All documents of `collection` matching every filter
    async fn query(&self, collection: &str, filters: &[Filter]) -> DatabaseResult<Vec<Document>>;

    /// Read a single document, `None` if it does not exist
    async fn get(&self, collection: &str, id: &str) -> DatabaseResult<Option<Document>>;

    /// Merge `fields` into an existing document
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DatabaseResult<()>;

    /// Insert a new document and return its generated id
    async fn insert(&self, collection: &str, fields: Fields) -> DatabaseResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        let mut fields = Fields::new();
        fields.insert("userId".to_string(), "u1".into());
        fields.insert("isArchived".to_string(), false.into());

        assert!(Filter::eq("userId", "u1").matches(&fields));
        assert!(Filter::eq("isArchived", false).matches(&fields));
        assert!(!Filter::eq("isArchived", true).matches(&fields));
        // Missing field
        assert!(!Filter::eq("isPermanent", false).matches(&fields));
    }
}
