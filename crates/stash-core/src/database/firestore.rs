//! Firestore REST client
//!
//! Implements [`DocumentDatabase`] against the Firestore v1 REST API
//! (or the local emulator).
//!
//! ## Requests
//!
//! - query: `POST {base}:runQuery` with a `structuredQuery`
//! - get: `GET {base}/{collection}/{id}`
//! - update: `PATCH {base}/{collection}/{id}?updateMask.fieldPaths=...`
//! - insert: `POST {base}/{collection}`

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{DatabaseError, DatabaseResult, Document, DocumentDatabase, Fields, Filter};
use crate::config::Config;

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";

/// Connection settings for [`FirestoreClient`]
#[derive(Debug, Clone, Default)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub api_key: Option<String>,
    /// `host:port` of a Firestore emulator
    pub emulator_host: Option<String>,
    /// Firebase ID token sent as a bearer token
    pub id_token: Option<String>,
}

impl FirestoreSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    /// Build settings from the application configuration
    pub fn from_config(config: &Config) -> DatabaseResult<Self> {
        let project_id = config
            .project_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DatabaseError::NotConfigured("project_id is not set".to_string()))?;

        Ok(Self {
            project_id,
            api_key: config.api_key.clone(),
            emulator_host: config.emulator_host.clone(),
            id_token: config.id_token.clone(),
        })
    }

    /// Root of the document tree, without a trailing slash
    pub fn documents_url(&self) -> String {
        let host = match &self.emulator_host {
            Some(h) => format!("http://{}", h.trim_end_matches('/')),
            None => FIRESTORE_HOST.to_string(),
        };
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            host, self.project_id
        )
    }
}

/// Firestore-backed [`DocumentDatabase`]
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    settings: FirestoreSettings,
}

impl FirestoreClient {
    pub fn new(settings: FirestoreSettings) -> Self {
        Self::with_http_client(reqwest::Client::new(), settings)
    }

    pub fn with_http_client(http: reqwest::Client, settings: FirestoreSettings) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &FirestoreSettings {
        &self.settings
    }

    /// Attach the API key and bearer token
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.settings.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match &self.settings.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.settings.documents_url(), collection, id)
    }
}

#[async_trait]
impl DocumentDatabase for FirestoreClient {
    async fn query(&self, collection: &str, filters: &[Filter]) -> DatabaseResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.settings.documents_url());
        debug!("Firestore runQuery on '{}' ({} filters)", collection, filters.len());

        let response = self
            .authorize(self.http.post(&url))
            .json(&run_query_body(collection, filters)?)
            .send()
            .await?;
        let body: Value = check_status(response).await?.json().await?;
        parse_run_query_response(body)
    }

    async fn get(&self, collection: &str, id: &str) -> DatabaseResult<Option<Document>> {
        let url = self.document_url(collection, id);
        debug!("Firestore get {}/{}", collection, id);

        let response = self.authorize(self.http.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawDocument = check_status(response).await?.json().await?;
        Ok(Some(raw.into_document()?))
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> DatabaseResult<()> {
        let url = self.document_url(collection, id);
        debug!("Firestore update {}/{} ({:?})", collection, id, fields.keys());

        let response = self
            .authorize(self.http.patch(&url))
            .query(&update_mask_params(&fields))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DatabaseError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        check_status(response).await?;
        Ok(())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> DatabaseResult<String> {
        let url = format!("{}/{}", self.settings.documents_url(), collection);
        debug!("Firestore insert into {}", collection);

        let response = self
            .authorize(self.http.post(&url))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let raw: RawDocument = check_status(response).await?.json().await?;
        Ok(raw.into_document()?.id)
    }
}

/// Document as returned by the REST API
#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Fields,
}

impl RawDocument {
    fn into_document(self) -> DatabaseResult<Document> {
        let id = document_id_from_name(&self.name)
            .ok_or_else(|| DatabaseError::Decode(format!("bad document name '{}'", self.name)))?;
        Ok(Document::new(id, self.fields))
    }
}

/// One row of a runQuery response stream
#[derive(Debug, Deserialize)]
struct RunQueryRow {
    document: Option<RawDocument>,
}

/// Last path segment of a resource name
/// (`projects/p/databases/(default)/documents/links/ID` -> `ID`)
fn document_id_from_name(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

/// Build the runQuery request body for an AND of equality filters
fn run_query_body(collection: &str, filters: &[Filter]) -> DatabaseResult<Value> {
    let mut field_filters = Vec::with_capacity(filters.len());
    for filter in filters {
        field_filters.push(json!({
            "fieldFilter": {
                "field": { "fieldPath": filter.field },
                "op": "EQUAL",
                "value": serde_json::to_value(&filter.value)?,
            }
        }));
    }

    let mut structured = json!({ "from": [{ "collectionId": collection }] });
    match field_filters.len() {
        0 => {}
        1 => structured["where"] = field_filters.remove(0),
        _ => {
            structured["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": field_filters }
            })
        }
    }

    Ok(json!({ "structuredQuery": structured }))
}

/// Collect the documents of a runQuery response
///
/// Rows without a `document` (e.g. a bare `readTime` for an empty result)
/// are skipped.
fn parse_run_query_response(body: Value) -> DatabaseResult<Vec<Document>> {
    let rows: Vec<RunQueryRow> = serde_json::from_value(body)?;
    rows.into_iter()
        .filter_map(|row| row.document)
        .map(RawDocument::into_document)
        .collect()
}

fn update_mask_params(fields: &Fields) -> Vec<(&'static str, String)> {
    let mut params: Vec<_> = fields
        .keys()
        .map(|k| ("updateMask.fieldPaths", k.clone()))
        .collect();
    params.push(("currentDocument.exists", "true".to_string()));
    params
}

/// Turn non-success statuses into [`DatabaseError::Status`]
async fn check_status(response: Response) -> DatabaseResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(DatabaseError::Status {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

/// Extract `error.message` from a Firestore error body, else the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
