use api_client::{ApiClient, GalleryBackend};
use mocks::{backend_server, base_url};
use scan::{ScanCoordinator, ScanError, ScanSettings};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    let server = backend_server();
    mocks::expect_scan(&server, false);

    let client = ApiClient::new(&base_url(&server)).expect("client");
    let backend: Arc<dyn GalleryBackend> = Arc::new(client);
    let coordinator = ScanCoordinator::new(backend, ScanSettings::default());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let err = coordinator.start(tx).await.expect_err("trigger must fail");
    assert!(matches!(err, ScanError::Trigger(_)));
    assert!(err.to_string().contains("Path not found"));
    assert!(!coordinator.is_scanning());
    // No poll loop was started, so the sender is already gone.
    assert!(rx.recv().await.is_none());
}
