//! In-process document database

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{DatabaseError, DatabaseResult, Document, DocumentDatabase, Fields, Filter};

/// A [`DocumentDatabase`] kept in memory
///
/// Documents are returned in insertion order. Generated ids are
/// 20-character hex strings, the same length Firestore uses.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under a caller-chosen id, replacing any existing one
    pub fn put(&self, collection: &str, document: Document) {
        let mut collections = self.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => docs.push(document),
        }
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Document>>> {
        // A poisoned map is still structurally valid
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentDatabase for MemoryDatabase {
    async fn query(&self, collection: &str, filters: &[Filter]) -> DatabaseResult<Vec<Document>> {
        let collections = self.lock();
        let docs = match collections.get(collection) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };
        Ok(docs
            .iter()
            .filter(|doc| filters.iter().all(|f| f.matches(&doc.fields)))
            .cloned()
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> DatabaseResult<Option<Document>> {
        Ok(self
            .lock()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DatabaseResult<()> {
        let mut collections = self.lock();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| DatabaseError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.fields.extend(fields);
        Ok(())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> DatabaseResult<String> {
        let id = Uuid::new_v4().simple().to_string()[..20].to_string();
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::FieldValue;

    fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = MemoryDatabase::new();
        let id = db
            .insert("links", fields(&[("url", "https://a.com".into())]))
            .await
            .unwrap();

        assert_eq!(id.len(), 20);
        let doc = db.get("links", &id).await.unwrap().unwrap();
        assert_eq!(doc.get("url").and_then(FieldValue::as_str), Some("https://a.com"));
        assert!(db.get("links", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_applies_all_filters_in_insertion_order() {
        let db = MemoryDatabase::new();
        for (url, archived) in [("https://1.com", false), ("https://2.com", true), ("https://3.com", false)] {
            db.insert(
                "links",
                fields(&[("url", url.into()), ("userId", "u".into()), ("isArchived", archived.into())]),
            )
            .await
            .unwrap();
        }

        let docs = db
            .query(
                "links",
                &[Filter::eq("userId", "u"), Filter::eq("isArchived", false)],
            )
            .await
            .unwrap();
        let urls: Vec<_> = docs
            .iter()
            .filter_map(|d| d.get("url").and_then(FieldValue::as_str))
            .collect();
        assert_eq!(urls, vec!["https://1.com", "https://3.com"]);

        assert!(db.query("other", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let db = MemoryDatabase::new();
        let id = db
            .insert(
                "links",
                fields(&[("url", "https://a.com".into()), ("isArchived", false.into())]),
            )
            .await
            .unwrap();

        db.update("links", &id, fields(&[("isArchived", true.into())]))
            .await
            .unwrap();

        let doc = db.get("links", &id).await.unwrap().unwrap();
        assert_eq!(doc.get("isArchived").and_then(FieldValue::as_bool), Some(true));
        assert_eq!(doc.get("url").and_then(FieldValue::as_str), Some("https://a.com"));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let db = MemoryDatabase::new();
        let err = db.update("links", "nope", Fields::new()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn test_put_replaces() {
        let db = MemoryDatabase::new();
        db.put("links", Document::new("a", fields(&[("url", "one".into())])));
        db.put("links", Document::new("a", fields(&[("url", "two".into())])));
        assert_eq!(db.len("links"), 1);
        assert!(db.is_empty("notes"));
    }
}
