//! The gallery's view of the backend: the ordered media list, the user's
//! selection and whether a scan is running.

use api_client::{ApiClientError, Collection, GalleryBackend, MediaId, MediaItem};
use scan::RequestSequence;
use std::collections::HashSet;

/// A completed media-list fetch, tagged with the number it was issued under.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub seq: u64,
    pub items: Vec<MediaItem>,
}

/// Fetch the full media list. The sequence number is drawn before the request goes out.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(backend, sequence)))]
pub async fn refetch(
    backend: &dyn GalleryBackend,
    sequence: &RequestSequence,
) -> Result<Fetched, ApiClientError> {
    let seq = sequence.next();
    let items = backend.list_media().await?;
    tracing::debug!(seq, count = items.len(), "Media list fetched");
    Ok(Fetched { seq, items })
}

#[derive(Debug, Default)]
pub struct GalleryState {
    items: Vec<MediaItem>,
    selected: HashSet<MediaId>,
    scanning: bool,
    collections: Vec<Collection>,
    applied_seq: u64,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn item(&self, id: MediaId) -> Option<&MediaItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn set_collections(&mut self, collections: Vec<Collection>) {
        self.collections = collections;
    }

    /// Record a collection known to exist before the next full reload.
    pub fn upsert_collection(&mut self, collection: Collection) {
        match self.collections.iter_mut().find(|c| c.id == collection.id) {
            Some(existing) => *existing = collection,
            None => self.collections.push(collection),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn set_scanning(&mut self, scanning: bool) {
        self.scanning = scanning;
    }

    pub fn last_applied(&self) -> u64 {
        self.applied_seq
    }

    /// Replace the list wholesale, unless a newer fetch was already applied.
    ///
    /// Returns whether the list changed hands.
    pub fn apply_fetch(&mut self, seq: u64, items: Vec<MediaItem>) -> bool {
        if seq <= self.applied_seq {
            tracing::debug!(seq, applied = self.applied_seq, "Dropping stale media list");
            return false;
        }
        self.applied_seq = seq;
        self.items = items;
        true
    }

    /// Flip selection of `id` and return whether it is now selected.
    pub fn toggle_select(&mut self, id: MediaId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn is_selected(&self, id: MediaId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selection(&self) -> &HashSet<MediaId> {
        &self.selected
    }

    /// Selected ids that are present in the current list.
    ///
    /// Ids of items that vanished in a refetch stay in the selection until it
    /// is cleared, so they reappear selected if the item comes back.
    pub fn visible_selection(&self) -> impl Iterator<Item = MediaId> + '_ {
        self.items
            .iter()
            .map(|i| i.id)
            .filter(|id| self.selected.contains(id))
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}
