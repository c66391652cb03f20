//! Collection membership changes. Every mutation ends with a media refetch so
//! the gallery shows what the backend actually stored.

use crate::gallery::{refetch, Fetched};
use api_client::{ApiClientError, Collection, CollectionId, GalleryBackend, MediaId, SyncSummary};
use scan::RequestSequence;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollectionError {
    #[error("Collection name must not be empty")]
    EmptyName,
    #[error("No media item is open")]
    NothingOpen,
    #[error(transparent)]
    Api(#[from] ApiClientError),
    /// The change was stored but reloading afterwards failed.
    #[error("Saved, but refreshing failed: {0}")]
    Refresh(ApiClientError),
    #[error("Collection {} was created, but assigning to it failed: {error}", .collection.name)]
    AssignAfterCreate {
        collection: Collection,
        error: ApiClientError,
    },
}

impl CollectionError {
    /// True when the backend changed even though the call as a whole failed.
    pub fn backend_changed(&self) -> bool {
        matches!(
            self,
            CollectionError::Refresh(_) | CollectionError::AssignAfterCreate { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct Created {
    pub collection: Collection,
    pub collections: Vec<Collection>,
    pub refreshed: Fetched,
}

/// Trimmed collection name, or `EmptyName` if nothing is left.
pub fn validate_name(name: &str) -> Result<String, CollectionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(CollectionError::EmptyName)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Add `file_id` to `collection_id`, then refetch the media list once.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(backend, sequence)))]
pub async fn assign(
    backend: Arc<dyn GalleryBackend>,
    sequence: RequestSequence,
    file_id: MediaId,
    collection_id: CollectionId,
) -> Result<Fetched, CollectionError> {
    let ack = backend.assign(file_id, collection_id).await?;
    tracing::info!(file_id, collection_id, message = ?ack.message, "Assigned");
    refetch(backend.as_ref(), &sequence)
        .await
        .map_err(CollectionError::Refresh)
}

/// Create a collection and put the open item into it.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(backend, sequence)))]
pub async fn create_and_assign(
    backend: Arc<dyn GalleryBackend>,
    sequence: RequestSequence,
    name: String,
    file_id: Option<MediaId>,
) -> Result<Created, CollectionError> {
    let name = validate_name(&name)?;
    let file_id = file_id.ok_or(CollectionError::NothingOpen)?;

    let collection = backend.create_collection(&name).await?;
    tracing::info!(id = collection.id, name = %collection.name, "Collection created");
    if let Err(error) = backend.assign(file_id, collection.id).await {
        return Err(CollectionError::AssignAfterCreate { collection, error });
    }
    let collections = backend
        .list_collections()
        .await
        .map_err(CollectionError::Refresh)?;
    let refreshed = refetch(backend.as_ref(), &sequence)
        .await
        .map_err(CollectionError::Refresh)?;
    Ok(Created {
        collection,
        collections,
        refreshed,
    })
}

pub async fn sync_collection(
    backend: Arc<dyn GalleryBackend>,
    collection_id: CollectionId,
) -> Result<SyncSummary, CollectionError> {
    let summary = backend.sync_collection(collection_id).await?;
    tracing::info!(
        collection_id,
        uploaded = summary.uploaded,
        shortcuts = summary.shortcuts,
        errors = summary.errors,
        "Collection synced"
    );
    Ok(summary)
}
