//! Bookmark store
//!
//! The `BookmarkStore` owns the in-memory list of the signed-in user's
//! bookmarks and mediates every read and write against the database.
//!
//! ## State
//!
//! State is published through a `tokio::sync::watch` channel. Every load
//! replaces the whole [`StoreState`]; every mutation patches it in place
//! under the channel lock, and subscribers are notified after each change.
//!
//! There is no cancellation and no ordering between concurrent calls: when
//! two loads overlap, the one that completes last wins.
//!
//! ## Usage
//!
//! ```ignore
//! let store = BookmarkStore::new(database, auth, metadata);
//! let mut updates = store.subscribe();
//!
//! store.load_all().await?;
//! let id = store.add_bookmark("https://example.com").await?;
//! store.toggle_important(&id).await?;
//! ```

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::auth::{AuthProvider, User};
use crate::database::{Document, DocumentDatabase, Fields, Filter};
use crate::error::{StoreError, StoreResult};
use crate::metadata::{MetadataFetcher, UrlMetadata};
use crate::models::{
    metadata_fields, Bookmark, View, FIELD_IS_ARCHIVED, FIELD_IS_PERMANENT, FIELD_USER_ID,
};

/// Default collection holding bookmark documents
pub const DEFAULT_COLLECTION: &str = "links";

/// Snapshot of the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub bookmarks: Vec<Bookmark>,
    /// A load is in flight
    pub loading: bool,
    /// The view most recently requested
    pub view: View,
}

/// The signed-in user's bookmarks and the operations on them
pub struct BookmarkStore {
    database: Arc<dyn DocumentDatabase>,
    auth: Arc<dyn AuthProvider>,
    metadata: Arc<dyn MetadataFetcher>,
    collection: String,
    state: watch::Sender<StoreState>,
}

impl BookmarkStore {
    pub fn new(
        database: Arc<dyn DocumentDatabase>,
        auth: Arc<dyn AuthProvider>,
        metadata: Arc<dyn MetadataFetcher>,
    ) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            database,
            auth,
            metadata,
            collection: DEFAULT_COLLECTION.to_string(),
            state,
        }
    }

    /// Use a collection other than `links`
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Register for state updates
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// A bookmark from the current list
    pub fn cached(&self, id: &str) -> Option<Bookmark> {
        self.state
            .borrow()
            .bookmarks
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    // ==================== Loads ====================

    /// Load bookmarks that are not archived
    pub async fn load_all(&self) -> StoreResult<usize> {
        self.load(View::Active).await
    }

    /// Load archived bookmarks
    pub async fn load_archived(&self) -> StoreResult<usize> {
        self.load(View::Archived).await
    }

    /// Load important (pinned) bookmarks
    pub async fn load_important(&self) -> StoreResult<usize> {
        self.load(View::Important).await
    }

    /// Replace the list with one view of the user's bookmarks
    ///
    /// Without a signed-in user the state is left untouched. A failed query
    /// empties the list before the error is returned.
    pub async fn load(&self, view: View) -> StoreResult<usize> {
        let user = self.require_user()?;

        self.state.send_modify(|state| {
            state.loading = true;
            state.view = view;
        });

        let (flag, value) = view.flag_filter();
        let filters = [
            Filter::eq(FIELD_USER_ID, user.uid.as_str()),
            Filter::eq(flag, value),
        ];

        match self.database.query(&self.collection, &filters).await {
            Ok(docs) => {
                let bookmarks = decode_all(docs);
                let count = bookmarks.len();
                self.state.send_replace(StoreState {
                    bookmarks,
                    loading: false,
                    view,
                });
                debug!("Loaded {} {} bookmarks", count, view);
                Ok(count)
            }
            Err(e) => {
                error!("Error loading {} bookmarks: {}", view, e);
                self.state.send_replace(StoreState {
                    bookmarks: Vec::new(),
                    loading: false,
                    view,
                });
                Err(e.into())
            }
        }
    }

    // ==================== Mutations ====================

    /// Save a new bookmark and put it at the top of the list
    ///
    /// Metadata is fetched first; if that fails nothing is saved.
    pub async fn add_bookmark(&self, url: &str) -> StoreResult<String> {
        let user = self.require_user()?;
        let url = url.trim();
        if Url::parse(url).is_err() {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }

        let metadata = self.metadata.fetch(url).await?;

        let mut bookmark = Bookmark::new(url, user.uid);
        bookmark.apply_metadata(&metadata);

        let id = self
            .database
            .insert(&self.collection, bookmark.to_fields())
            .await?;
        bookmark.id = id.clone();

        self.state
            .send_modify(|state| state.bookmarks.insert(0, bookmark));
        info!("Added bookmark {} for {}", id, url);
        Ok(id)
    }

    /// Flip the archived flag of a listed bookmark
    ///
    /// Returns the new value, or `None` when the id is not in the list.
    /// The bookmark leaves the list after the write in both directions.
    pub async fn toggle_archived(&self, id: &str) -> StoreResult<Option<bool>> {
        self.require_user()?;
        let current = match self.cached(id) {
            Some(b) => b,
            None => {
                debug!("toggle_archived: {} is not in the current list", id);
                return Ok(None);
            }
        };

        let archived = !current.is_archived;
        if let Err(e) = self.write_flag(id, FIELD_IS_ARCHIVED, archived).await {
            error!("Error toggling archive status of {}: {}", id, e);
            return Err(e);
        }

        self.remove_from_list(id);
        info!("Set isArchived={} on {}", archived, id);
        Ok(Some(archived))
    }

    /// Flip the important flag of a listed bookmark
    ///
    /// Returns the new value, or `None` when the id is not in the list.
    /// Un-pinning removes the bookmark from the list; pinning keeps it and
    /// marks it important.
    pub async fn toggle_important(&self, id: &str) -> StoreResult<Option<bool>> {
        self.require_user()?;
        let current = match self.cached(id) {
            Some(b) => b,
            None => {
                debug!("toggle_important: {} is not in the current list", id);
                return Ok(None);
            }
        };

        let important = !current.is_permanent;
        if let Err(e) = self.write_flag(id, FIELD_IS_PERMANENT, important).await {
            error!("Error toggling important status of {}: {}", id, e);
            return Err(e);
        }

        if important {
            self.state.send_modify(|state| {
                if let Some(b) = state.bookmarks.iter_mut().find(|b| b.id == id) {
                    b.is_permanent = true;
                }
            });
        } else {
            self.remove_from_list(id);
        }
        info!("Set isPermanent={} on {}", important, id);
        Ok(Some(important))
    }

    /// Re-fetch metadata for a bookmark and store it
    ///
    /// The URL comes from the list, or from the database when the bookmark
    /// is not listed.
    pub async fn update_metadata(&self, id: &str) -> StoreResult<UrlMetadata> {
        let user = self.require_user()?;
        let bookmark = match self.cached(id) {
            Some(b) => b,
            None => self.read_bookmark(id).await?,
        };
        if bookmark.user_id != user.uid {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let metadata = self.metadata.fetch(&bookmark.url).await?;
        self.database
            .update(&self.collection, id, metadata_fields(&metadata))
            .await?;

        self.state.send_if_modified(|state| {
            match state.bookmarks.iter_mut().find(|b| b.id == id) {
                Some(b) => {
                    b.apply_metadata(&metadata);
                    true
                }
                None => false,
            }
        });
        info!("Refreshed metadata of {}", id);
        Ok(metadata)
    }

    // ==================== Helpers ====================

    fn require_user(&self) -> StoreResult<User> {
        self.auth.current_user().ok_or_else(|| {
            debug!("No signed-in user");
            StoreError::NotSignedIn
        })
    }

    async fn write_flag(&self, id: &str, field: &str, value: bool) -> StoreResult<()> {
        let mut fields = Fields::new();
        fields.insert(field.to_string(), value.into());
        self.database.update(&self.collection, id, fields).await?;
        Ok(())
    }

    fn remove_from_list(&self, id: &str) {
        self.state
            .send_modify(|state| state.bookmarks.retain(|b| b.id != id));
    }

    async fn read_bookmark(&self, id: &str) -> StoreResult<Bookmark> {
        let doc = self
            .database
            .get(&self.collection, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Bookmark::from_document(&doc).map_err(|e| StoreError::InvalidDocument {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Decode query results, skipping malformed documents
fn decode_all(docs: Vec<Document>) -> Vec<Bookmark> {
    docs.iter()
        .filter_map(|doc| match Bookmark::from_document(doc) {
            Ok(b) => Some(b),
            Err(e) => {
                warn!("Skipping malformed bookmark {}: {}", doc.id, e);
                None
            }
        })
        .collect()
}
