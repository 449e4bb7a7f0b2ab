//! Data models for stash
//!
//! A [`Bookmark`] is stored as one document whose camelCase field names are
//! shared with the web client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::{Document, FieldValue, Fields};
use crate::metadata::UrlMetadata;

pub const FIELD_URL: &str = "url";
pub const FIELD_USER_ID: &str = "userId";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_IS_ARCHIVED: &str = "isArchived";
pub const FIELD_IS_PERMANENT: &str = "isPermanent";
pub const FIELD_METADATA_TITLE: &str = "metadataTitle";
pub const FIELD_METADATA_DESCRIPTION: &str = "metadataDescription";
pub const FIELD_METADATA_IMAGE: &str = "metadataImage";
pub const FIELD_TITLE: &str = "title";

/// A saved link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Database-assigned id (empty until inserted)
    pub id: String,
    pub url: String,
    /// Owner
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub is_archived: bool,
    /// The "important" / pinned flag
    pub is_permanent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_image: Option<String>,
    /// Legacy display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Why a stored document could not be read as a bookmark
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl Bookmark {
    /// Create a new, unsaved bookmark owned by `user_id`
    pub fn new(url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            url: url.into(),
            user_id: user_id.into(),
            created_at: Utc::now(),
            is_archived: false,
            is_permanent: false,
            metadata_title: None,
            metadata_description: None,
            metadata_image: None,
            title: None,
        }
    }

    /// Overwrite the metadata fields
    pub fn apply_metadata(&mut self, metadata: &UrlMetadata) {
        self.metadata_title = metadata.title.clone();
        self.metadata_description = metadata.description.clone();
        self.metadata_image = metadata.image.clone();
    }

    /// Title to show: legacy title, then fetched title, then the URL
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.metadata_title.as_deref())
            .unwrap_or(&self.url)
    }

    /// Document fields for insertion (the id is not stored as a field)
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(FIELD_URL.to_string(), self.url.clone().into());
        fields.insert(FIELD_USER_ID.to_string(), self.user_id.clone().into());
        fields.insert(FIELD_CREATED_AT.to_string(), self.created_at.into());
        fields.insert(FIELD_IS_ARCHIVED.to_string(), self.is_archived.into());
        fields.insert(FIELD_IS_PERMANENT.to_string(), self.is_permanent.into());

        let optional = [
            (FIELD_METADATA_TITLE, &self.metadata_title),
            (FIELD_METADATA_DESCRIPTION, &self.metadata_description),
            (FIELD_METADATA_IMAGE, &self.metadata_image),
            (FIELD_TITLE, &self.title),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                fields.insert(name.to_string(), v.clone().into());
            }
        }
        fields
    }

    /// Decode a stored document
    ///
    /// `url` and `userId` are required. Missing flags read as `false`, a
    /// missing `createdAt` as the Unix epoch, and null strings as absent.
    pub fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let required = |name: &str| {
            doc.get(name)
                .and_then(FieldValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| DecodeError(format!("missing string field '{}'", name)))
        };
        let flag = |name: &str| doc.get(name).and_then(FieldValue::as_bool).unwrap_or(false);
        let text = |name: &str| doc.get(name).and_then(FieldValue::as_str).map(str::to_string);

        Ok(Self {
            id: doc.id.clone(),
            url: required(FIELD_URL)?,
            user_id: required(FIELD_USER_ID)?,
            created_at: doc
                .get(FIELD_CREATED_AT)
                .and_then(FieldValue::as_timestamp)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            is_archived: flag(FIELD_IS_ARCHIVED),
            is_permanent: flag(FIELD_IS_PERMANENT),
            metadata_title: text(FIELD_METADATA_TITLE),
            metadata_description: text(FIELD_METADATA_DESCRIPTION),
            metadata_image: text(FIELD_METADATA_IMAGE),
            title: text(FIELD_TITLE),
        })
    }
}

/// Fields written when metadata is refreshed; absent values become null
pub fn metadata_fields(metadata: &UrlMetadata) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        FIELD_METADATA_TITLE.to_string(),
        metadata.title.clone().into(),
    );
    fields.insert(
        FIELD_METADATA_DESCRIPTION.to_string(),
        metadata.description.clone().into(),
    );
    fields.insert(
        FIELD_METADATA_IMAGE.to_string(),
        metadata.image.clone().into(),
    );
    fields
}

/// Which subset of a user's bookmarks is materialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Not archived
    #[default]
    Active,
    Archived,
    /// Pinned
    Important,
}

impl View {
    /// The flag filter selecting this view (besides the owner filter)
    pub fn flag_filter(&self) -> (&'static str, bool) {
        match self {
            View::Active => (FIELD_IS_ARCHIVED, false),
            View::Archived => (FIELD_IS_ARCHIVED, true),
            View::Important => (FIELD_IS_PERMANENT, true),
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            View::Active => "active",
            View::Archived => "archived",
            View::Important => "important",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bookmark_new() {
        let bookmark = Bookmark::new("https://example.com", "u1");
        assert!(bookmark.id.is_empty());
        assert_eq!(bookmark.url, "https://example.com");
        assert_eq!(bookmark.user_id, "u1");
        assert!(!bookmark.is_archived);
        assert!(!bookmark.is_permanent);
        assert!(bookmark.metadata_title.is_none());
    }

    #[test]
    fn test_display_title_fallbacks() {
        let mut bookmark = Bookmark::new("https://example.com", "u1");
        assert_eq!(bookmark.display_title(), "https://example.com");

        bookmark.metadata_title = Some("Fetched".to_string());
        assert_eq!(bookmark.display_title(), "Fetched");

        bookmark.title = Some("Legacy".to_string());
        assert_eq!(bookmark.display_title(), "Legacy");
    }

    #[test]
    fn test_to_fields_omits_absent_optionals() {
        let mut bookmark = Bookmark::new("https://example.com", "u1");
        bookmark.metadata_title = Some("Example".to_string());
        let fields = bookmark.to_fields();

        assert_eq!(fields.get(FIELD_URL).and_then(FieldValue::as_str), Some("https://example.com"));
        assert_eq!(fields.get(FIELD_IS_ARCHIVED), Some(&FieldValue::Boolean(false)));
        assert_eq!(fields.get(FIELD_IS_PERMANENT), Some(&FieldValue::Boolean(false)));
        assert_eq!(
            fields.get(FIELD_METADATA_TITLE).and_then(FieldValue::as_str),
            Some("Example")
        );
        assert!(!fields.contains_key(FIELD_METADATA_IMAGE));
        assert!(!fields.contains_key(FIELD_TITLE));
        assert!(!fields.contains_key("id"));
    }

    #[test]
    fn test_document_round_trip_keeps_id() {
        let mut bookmark = Bookmark::new("https://example.com", "u1");
        bookmark.created_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        bookmark.is_permanent = true;

        let doc = Document::new("abc", bookmark.to_fields());
        let decoded = Bookmark::from_document(&doc).unwrap();

        bookmark.id = "abc".to_string();
        assert_eq!(decoded, bookmark);
    }

    #[test]
    fn test_from_document_defaults() {
        let mut fields = Fields::new();
        fields.insert(FIELD_URL.to_string(), "https://a.com".into());
        fields.insert(FIELD_USER_ID.to_string(), "u1".into());
        fields.insert(FIELD_METADATA_TITLE.to_string(), FieldValue::null());

        let bookmark = Bookmark::from_document(&Document::new("x", fields)).unwrap();
        assert!(!bookmark.is_archived);
        assert!(!bookmark.is_permanent);
        assert_eq!(bookmark.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert!(bookmark.metadata_title.is_none());
    }

    #[test]
    fn test_from_document_requires_url() {
        let mut fields = Fields::new();
        fields.insert(FIELD_USER_ID.to_string(), "u1".into());

        let err = Bookmark::from_document(&Document::new("x", fields)).unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn test_decode_error_is_std_error() {
        let err: Box<dyn std::error::Error> =
            Box::new(DecodeError("missing string field 'userId'".to_string()));
        assert_eq!(err.to_string(), "missing string field 'userId'");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_metadata_fields_write_nulls() {
        let fields = metadata_fields(&UrlMetadata {
            title: Some("T".to_string()),
            ..UrlMetadata::default()
        });
        assert_eq!(fields.len(), 3);
        assert!(fields[FIELD_METADATA_IMAGE].is_null());
        assert_eq!(fields[FIELD_METADATA_TITLE].as_str(), Some("T"));
    }

    #[test]
    fn test_view_filters() {
        assert_eq!(View::Active.flag_filter(), ("isArchived", false));
        assert_eq!(View::Archived.flag_filter(), ("isArchived", true));
        assert_eq!(View::Important.flag_filter(), ("isPermanent", true));
        assert_eq!(View::default(), View::Active);
        assert_eq!(View::Important.to_string(), "important");
    }

    #[test]
    fn test_bookmark_json_uses_camel_case() {
        let bookmark = Bookmark::new("https://example.com", "u1");
        let json = serde_json::to_value(&bookmark).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["isArchived"], false);
        assert!(json.get("metadataTitle").is_none());
    }
}
