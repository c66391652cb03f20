use api_client::{ApiClient, GalleryBackend};
use mocks::{backend_server, base_url, media_json};
use scan::RequestSequence;
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let server = backend_server();
    mocks::expect_create_collection(&server, "Summer", 42);
    mocks::expect_assign(&server, 7, 42);
    mocks::expect_collections(
        &server,
        json!([{ "id": 42, "name": "Summer", "drive_folder_id": null }]),
    );
    let mut item = media_json(7, "video/mp4");
    item["collections"] = json!([{ "id": 42, "name": "Summer", "drive_folder_id": null }]);
    mocks::expect_media(&server, json!([item]));

    let client = ApiClient::new(&base_url(&server)).expect("client");
    let backend: Arc<dyn GalleryBackend> = Arc::new(client);

    let created = ui::collections::create_and_assign(
        backend,
        RequestSequence::new(),
        " Summer ".to_string(),
        Some(7),
    )
    .await
    .expect("create");

    assert_eq!(created.collection.id, 42);
    assert_eq!(created.collections.len(), 1);
    assert!(created.refreshed.items[0].is_member_of(42));
}
