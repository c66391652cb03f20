//! Test doubles for the media backend.
//!
//! `ScriptedBackend` is an in-process fake used by unit and integration tests;
//! the `httptest` helpers stand up a real HTTP server for CLI and e2e tests.

use api_client::{
    ApiClientError, AssignAck, Collection, CollectionId, GalleryBackend, MediaId, MediaItem,
    ScanAck, SyncSummary,
};
use async_trait::async_trait;
use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

pub use httptest;

/// Build a media item with sensible defaults.
pub fn media_item(id: MediaId, mime_type: &str) -> MediaItem {
    let ext = if mime_type.starts_with("video") { "mp4" } else { "jpg" };
    MediaItem {
        id,
        file_name: format!("IMG_{:04}.{}", id, ext),
        mime_type: Some(mime_type.to_string()),
        file_hash: format!("hash{}", id),
        local_path: format!("/trip/IMG_{:04}.{}", id, ext),
        collections: Vec::new(),
        is_uploaded: Some(false),
        drive_file_id: None,
        created_at: None,
    }
}

pub fn collection(id: CollectionId, name: &str) -> Collection {
    Collection {
        id,
        name: name.to_string(),
        drive_folder_id: None,
    }
}

/// In-process backend with scripted list responses and call counters.
///
/// Membership and collection creation follow the real backend: assigning is an
/// idempotent add, and creating an existing name returns the existing collection.
pub struct ScriptedBackend {
    trigger_error: Mutex<Option<ApiClientError>>,
    media_script: Mutex<VecDeque<Result<Vec<MediaItem>, ApiClientError>>>,
    media: Mutex<Vec<MediaItem>>,
    collections: Mutex<Vec<Collection>>,
    next_collection_id: AtomicI64,
    hang_polls: AtomicBool,
    fail_assign: Mutex<Option<ApiClientError>>,
    fail_create: Mutex<Option<ApiClientError>>,
    assigned: Mutex<Vec<(MediaId, CollectionId)>>,
    trigger_calls: AtomicUsize,
    list_calls: AtomicUsize,
    collection_list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    sync_calls: AtomicUsize,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            trigger_error: Mutex::new(None),
            media_script: Mutex::new(VecDeque::new()),
            media: Mutex::new(Vec::new()),
            collections: Mutex::new(Vec::new()),
            next_collection_id: AtomicI64::new(1),
            hang_polls: AtomicBool::new(false),
            fail_assign: Mutex::new(None),
            fail_create: Mutex::new(None),
            assigned: Mutex::new(Vec::new()),
            trigger_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            collection_list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Media returned once the scripted responses are used up.
    pub fn with_media(self, items: Vec<MediaItem>) -> Self {
        *lock(&self.media) = items;
        self
    }

    pub fn with_collections(self, collections: Vec<Collection>) -> Self {
        let next = collections.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        *lock(&self.collections) = collections;
        self.next_collection_id.store(next, Ordering::SeqCst);
        self
    }

    pub fn with_next_collection_id(self, id: CollectionId) -> Self {
        self.next_collection_id.store(id, Ordering::SeqCst);
        self
    }

    pub fn failing_trigger(self, error: ApiClientError) -> Self {
        *lock(&self.trigger_error) = Some(error);
        self
    }

    pub fn failing_assign(self, error: ApiClientError) -> Self {
        *lock(&self.fail_assign) = Some(error);
        self
    }

    pub fn failing_create(self, error: ApiClientError) -> Self {
        *lock(&self.fail_create) = Some(error);
        self
    }

    /// Make every `list_media` call hang forever.
    pub fn hanging_polls(self) -> Self {
        self.hang_polls.store(true, Ordering::SeqCst);
        self
    }

    pub fn push_media_response(&self, response: Result<Vec<MediaItem>, ApiClientError>) {
        lock(&self.media_script).push_back(response);
    }

    pub fn set_media(&self, items: Vec<MediaItem>) {
        *lock(&self.media) = items;
    }

    pub fn trigger_calls(&self) -> usize {
        self.trigger_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn collection_list_calls(&self) -> usize {
        self.collection_list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn assigned(&self) -> Vec<(MediaId, CollectionId)> {
        lock(&self.assigned).clone()
    }
}

#[async_trait]
impl GalleryBackend for ScriptedBackend {
    async fn trigger_scan(&self) -> Result<ScanAck, ApiClientError> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = lock(&self.trigger_error).clone() {
            return Err(e);
        }
        Ok(ScanAck {
            status: Some("success".into()),
            message: Some("Scanning started.".into()),
        })
    }

    async fn list_media(&self) -> Result<Vec<MediaItem>, ApiClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_polls.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let scripted = lock(&self.media_script).pop_front();
        match scripted {
            Some(response) => response,
            None => Ok(lock(&self.media).clone()),
        }
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiClientError> {
        self.collection_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.collections).clone())
    }

    async fn assign(
        &self,
        file_id: MediaId,
        collection_id: CollectionId,
    ) -> Result<AssignAck, ApiClientError> {
        lock(&self.assigned).push((file_id, collection_id));
        if let Some(e) = lock(&self.fail_assign).clone() {
            return Err(e);
        }
        let col = lock(&self.collections)
            .iter()
            .find(|c| c.id == collection_id)
            .cloned()
            .ok_or_else(|| ApiClientError::NotFound("Resource not found".into()))?;
        let mut media = lock(&self.media);
        let item = media
            .iter_mut()
            .find(|m| m.id == file_id)
            .ok_or_else(|| ApiClientError::NotFound("Resource not found".into()))?;
        if !item.is_member_of(collection_id) {
            item.collections.push(col.clone());
        }
        Ok(AssignAck {
            message: Some(format!("Pinned {} to {}", item.file_name, col.name)),
        })
    }

    async fn create_collection(&self, name: &str) -> Result<Collection, ApiClientError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = lock(&self.fail_create).clone() {
            return Err(e);
        }
        let mut collections = lock(&self.collections);
        if let Some(existing) = collections.iter().find(|c| c.name == name) {
            return Ok(existing.clone());
        }
        let created = collection(self.next_collection_id.fetch_add(1, Ordering::SeqCst), name);
        collections.push(created.clone());
        Ok(created)
    }

    async fn sync_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<SyncSummary, ApiClientError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if !lock(&self.collections).iter().any(|c| c.id == collection_id) {
            return Err(ApiClientError::NotFound("Collection not found".into()));
        }
        let members = lock(&self.media)
            .iter()
            .filter(|m| m.is_member_of(collection_id))
            .count() as u64;
        Ok(SyncSummary {
            uploaded: members,
            shortcuts: 0,
            errors: 0,
        })
    }
}

/// JSON body for a media item in the backend's wire format.
pub fn media_json(id: MediaId, mime_type: &str) -> serde_json::Value {
    serde_json::to_value(media_item(id, mime_type)).unwrap_or_else(|_| json!({}))
}

/// Start an empty mock backend server.
pub fn backend_server() -> Server {
    Server::run()
}

/// Base URL of `server` without a trailing slash.
pub fn base_url(server: &Server) -> String {
    server.url_str("").trim_end_matches('/').to_string()
}

/// Expect any number of `GET /media` requests answered with `body`.
pub fn expect_media(server: &Server, body: serde_json::Value) {
    server.expect(
        Expectation::matching(request::method_path("GET", "/media"))
            .times(..)
            .respond_with(json_encoded(body)),
    );
}

/// Expect one `POST /scan`, answered with success or a FastAPI error.
pub fn expect_scan(server: &Server, ok: bool) {
    let expectation = Expectation::matching(request::method_path("POST", "/scan"));
    if ok {
        server.expect(expectation.respond_with(json_encoded(json!({
            "status": "success",
            "message": "Scanning started."
        }))));
    } else {
        server.expect(
            expectation.respond_with(
                status_code(400)
                    .append_header("Content-Type", "application/json")
                    .body(r#"{"detail":"Path not found: None. Check your .env configuration."}"#),
            ),
        );
    }
}

pub fn expect_collections(server: &Server, body: serde_json::Value) {
    server.expect(
        Expectation::matching(request::method_path("GET", "/collections"))
            .times(..)
            .respond_with(json_encoded(body)),
    );
}

/// Expect exactly one `POST /collections` with `name`, answered with `id`.
pub fn expect_create_collection(server: &Server, name: &str, id: CollectionId) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/collections"),
            request::body(json_decoded(eq(json!({ "name": name })))),
        ])
        .respond_with(json_encoded(json!({
            "id": id,
            "name": name,
            "drive_folder_id": null
        }))),
    );
}

/// Expect exactly one `POST /assign` for the given pair.
pub fn expect_assign(server: &Server, file_id: MediaId, collection_id: CollectionId) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/assign"),
            request::body(json_decoded(eq(json!({
                "file_id": file_id,
                "collection_id": collection_id
            })))),
        ])
        .respond_with(json_encoded(json!({ "message": "Pinned" }))),
    );
}

pub fn expect_sync(server: &Server, collection_id: CollectionId, uploaded: u64) {
    let path = format!("/collections/{}/sync", collection_id);
    server.expect(
        Expectation::matching(all_of![request::method("POST"), request::path(eq(path))])
            .respond_with(json_encoded(json!({
                "uploaded": uploaded,
                "shortcuts": 0,
                "errors": 0
            }))),
    );
}
