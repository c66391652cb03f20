use api_client::{ApiClient, GalleryBackend};
use mocks::{backend_server, base_url, media_json};
use scan::{ScanCoordinator, ScanEvent, ScanSettings, ScanStop};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use ui::GalleryState;

#[tokio::main]
async fn main() {
    let server = backend_server();
    mocks::expect_scan(&server, true);
    mocks::expect_media(
        &server,
        json!([media_json(1, "image/jpeg"), media_json(2, "video/mp4")]),
    );

    let client = ApiClient::new(&base_url(&server)).expect("client");
    let backend: Arc<dyn GalleryBackend> = Arc::new(client);
    let coordinator = ScanCoordinator::new(
        backend,
        ScanSettings {
            poll_interval: Duration::from_millis(50),
            scan_timeout: Duration::from_millis(400),
            max_consecutive_failures: 3,
        },
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = coordinator.start(tx).await.expect("scan starts");

    let mut gallery = GalleryState::new();
    let mut stop = None;
    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::Polled { seq, items } => {
                gallery.apply_fetch(seq, items);
            }
            ScanEvent::Finished(s) => {
                stop = Some(s);
                break;
            }
            _ => {}
        }
    }

    assert_eq!(stop, Some(ScanStop::TimedOut));
    assert_eq!(gallery.items().len(), 2);
    assert!(gallery.items()[1].is_video());
    assert!(!coordinator.is_scanning());
}
