use api_client::{ApiClient, GalleryBackend};
use mocks::{backend_server, base_url, media_json};
use scan::RequestSequence;
use serde_json::json;
use std::sync::Arc;
use ui::GalleryState;

#[tokio::main]
async fn main() {
    let server = backend_server();
    let mut pinned = media_json(3, "image/jpeg");
    pinned["collections"] = json!([{ "id": 8, "name": "Beach", "drive_folder_id": null }]);
    mocks::expect_assign(&server, 3, 8);
    mocks::expect_media(&server, json!([pinned]));

    let client = ApiClient::new(&base_url(&server)).expect("client");
    let backend: Arc<dyn GalleryBackend> = Arc::new(client);
    let seq = RequestSequence::new();

    let fetched = ui::collections::assign(backend, seq, 3, 8)
        .await
        .expect("assign");

    let mut gallery = GalleryState::new();
    assert!(gallery.apply_fetch(fetched.seq, fetched.items));
    let item = gallery.item(3).expect("item present");
    assert!(item.is_member_of(8));
}
