//! stash core library
//!
//! This crate provides the data-access layer for stash, a bookmarking
//! application whose links live in a hosted document database (Firestore).
//!
//! # Architecture
//!
//! The [`BookmarkStore`] is constructed with three collaborators:
//!
//! - an [`AuthProvider`] telling who is signed in
//! - a [`DocumentDatabase`] holding the `links` collection
//! - a [`MetadataFetcher`] resolving URLs to title, description and image
//!
//! State changes are published to subscribers through a watch channel.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let database = Arc::new(FirestoreClient::new(FirestoreSettings::from_config(&config)?));
//! let auth = Arc::new(StaticAuth::from_config(&config));
//! let metadata = Arc::new(HtmlMetadataFetcher::new()?);
//!
//! let store = BookmarkStore::new(database, auth, metadata);
//! store.load_all().await?;
//! let id = store.add_bookmark("https://example.com").await?;
//! ```
//!
//! # Modules
//!
//! - `store`: the bookmark store (main entry point)
//! - `models`: the bookmark record and views
//! - `database`: document database trait, Firestore and in-memory backends
//! - `metadata`: URL metadata fetchers
//! - `auth`: current-user identity
//! - `config`: application configuration

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod metadata;
pub mod models;
pub mod store;

pub use auth::{AuthProvider, StaticAuth, User};
pub use config::Config;
pub use database::{
    DatabaseError, Document, DocumentDatabase, FieldValue, Fields, Filter, FirestoreClient,
    FirestoreSettings, MemoryDatabase,
};
pub use error::{StoreError, StoreResult};
pub use metadata::{
    HtmlMetadataFetcher, MetadataError, MetadataFetcher, RemoteMetadataFetcher, UrlMetadata,
};
pub use models::{Bookmark, View};
pub use store::{BookmarkStore, StoreState};
