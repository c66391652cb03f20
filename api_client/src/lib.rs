//! API client module for the Cloud Sorter media backend.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub type MediaId = i64;
pub type CollectionId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MediaItem {
    pub id: MediaId,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub file_hash: String,
    pub local_path: String,
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub is_uploaded: Option<bool>,
    #[serde(default)]
    pub drive_file_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub drive_folder_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type. Anything that is not `video/*` is shown as an image.
    pub fn from_mime(mime: Option<&str>) -> Self {
        match mime {
            Some(m) if m.starts_with("video") => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

impl MediaItem {
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(self.mime_type.as_deref())
    }

    pub fn is_video(&self) -> bool {
        self.kind() == MediaKind::Video
    }

    pub fn is_member_of(&self, collection_id: CollectionId) -> bool {
        self.collections.iter().any(|c| c.id == collection_id)
    }

    pub fn uploaded(&self) -> bool {
        self.is_uploaded.unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ScanAck {
    pub status: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AssignAck {
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncSummary {
    pub uploaded: u64,
    pub shortcuts: u64,
    pub errors: u64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SyncResponse {
    Summary(SyncSummary),
    Failed { error: String },
}

#[derive(Debug, Serialize)]
struct AssignRequest {
    file_id: MediaId,
    collection_id: CollectionId,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiClientError {
    #[error("Request Error: {0}")]
    Request(String),
    #[error("Backend Error ({status}): {detail}")]
    Status { status: u16, detail: String },
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiClientError {
    fn from(e: reqwest::Error) -> Self {
        ApiClientError::Request(e.to_string())
    }
}

/// The subset of the backend contract the gallery depends on.
///
/// `ApiClient` is the production implementation; tests substitute scripted fakes.
#[async_trait]
pub trait GalleryBackend: Send + Sync {
    async fn trigger_scan(&self) -> Result<ScanAck, ApiClientError>;
    async fn list_media(&self) -> Result<Vec<MediaItem>, ApiClientError>;
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiClientError>;
    async fn assign(
        &self,
        file_id: MediaId,
        collection_id: CollectionId,
    ) -> Result<AssignAck, ApiClientError>;
    async fn create_collection(&self, name: &str) -> Result<Collection, ApiClientError>;
    async fn sync_collection(&self, collection_id: CollectionId)
        -> Result<SyncSummary, ApiClientError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiClientError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client around a preconfigured `reqwest::Client` (timeouts, proxies).
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self, ApiClientError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(trimmed)
            .map_err(|e| ApiClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(ApiClient {
            client,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stream_url(&self, file_id: MediaId) -> String {
        format!("{}/stream/{}", self.base_url, file_id)
    }

    pub fn thumbnail_url(&self, file_hash: &str) -> String {
        format!("{}/thumbnails/{}.webp", self.base_url, file_hash)
    }

    pub async fn list_media(&self) -> Result<Vec<MediaItem>, ApiClientError> {
        let url = format!("{}/media", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<Vec<MediaItem>>().await?)
    }

    pub async fn trigger_scan(&self) -> Result<ScanAck, ApiClientError> {
        let url = format!("{}/scan", self.base_url);
        let response = self.client.post(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<ScanAck>().await?)
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>, ApiClientError> {
        let url = format!("{}/collections", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<Vec<Collection>>().await?)
    }

    /// Add `file_id` to `collection_id`. The backend ignores repeated assignments.
    pub async fn assign(
        &self,
        file_id: MediaId,
        collection_id: CollectionId,
    ) -> Result<AssignAck, ApiClientError> {
        let url = format!("{}/assign", self.base_url);
        let body = AssignRequest {
            file_id,
            collection_id,
        };
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<AssignAck>().await?)
    }

    /// Create a collection. An existing collection with the same name is returned as is.
    pub async fn create_collection(&self, name: &str) -> Result<Collection, ApiClientError> {
        let url = format!("{}/collections", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&CreateCollectionRequest { name })
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Collection>().await?)
    }

    pub async fn sync_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<SyncSummary, ApiClientError> {
        let url = format!("{}/collections/{}/sync", self.base_url, collection_id);
        let response = self.client.post(&url).send().await?;
        let response = check_status(response).await?;
        match response.json::<SyncResponse>().await? {
            SyncResponse::Summary(summary) => Ok(summary),
            SyncResponse::Failed { error } => Err(ApiClientError::NotFound(error)),
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().path().to_string();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let detail = error_detail(&body);
    tracing::debug!(status = status.as_u16(), path = %url, %detail, "backend request failed");
    if status == StatusCode::NOT_FOUND {
        return Err(ApiClientError::NotFound(detail));
    }
    Err(ApiClientError::Status {
        status: status.as_u16(),
        detail,
    })
}

/// Extract FastAPI's `{"detail": ...}` message, falling back to the raw body.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(s)),
        }) => s,
        Ok(ErrorBody {
            detail: Some(other),
        }) => other.to_string(),
        _ if body.is_empty() => "Unknown error".to_string(),
        _ => body.to_string(),
    }
}

#[async_trait]
impl GalleryBackend for ApiClient {
    async fn trigger_scan(&self) -> Result<ScanAck, ApiClientError> {
        ApiClient::trigger_scan(self).await
    }

    async fn list_media(&self) -> Result<Vec<MediaItem>, ApiClientError> {
        ApiClient::list_media(self).await
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiClientError> {
        ApiClient::list_collections(self).await
    }

    async fn assign(
        &self,
        file_id: MediaId,
        collection_id: CollectionId,
    ) -> Result<AssignAck, ApiClientError> {
        ApiClient::assign(self, file_id, collection_id).await
    }

    async fn create_collection(&self, name: &str) -> Result<Collection, ApiClientError> {
        ApiClient::create_collection(self, name).await
    }

    async fn sync_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<SyncSummary, ApiClientError> {
        ApiClient::sync_collection(self, collection_id).await
    }
}
