use ui::{ImageLoader, ImageLoaderError};
use httpmock::prelude::*;
use tempfile::tempdir;
use std::time::Duration;

#[tokio::test]
async fn test_thumbnail_cached() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/thumbnails/h1.webp");
            then.status(200).body("thumb");
        })
        .await;

    let dir = tempdir().unwrap();
    let loader = ImageLoader::new(&server.base_url(), dir.path().to_path_buf(), 4);

    loader.load_thumbnail("h1").await.unwrap();
    let thumb_path = dir.path().join("thumbnails").join("h1.webp");
    assert!(thumb_path.exists());
    mock.assert_hits_async(1).await;

    // Second call should use cache
    loader.load_thumbnail("h1").await.unwrap();
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_full_image_cached() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/stream/7");
            then.status(200).body("full");
        })
        .await;

    let dir = tempdir().unwrap();
    let loader = ImageLoader::new(&format!("{}/", server.base_url()), dir.path().to_path_buf(), 4);

    loader.load_full_image(7).await.unwrap();
    assert!(dir.path().join("full").join("7").exists());
    mock.assert_hits_async(1).await;

    loader.load_full_image(7).await.unwrap();
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_thumbnail_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/thumbnails/missing.webp");
            then.status(404);
        })
        .await;

    let dir = tempdir().unwrap();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
        .unwrap();
    let loader = ImageLoader::with_client(&server.base_url(), dir.path().to_path_buf(), client);

    let err = loader.load_thumbnail("missing").await.err().unwrap();
    assert_eq!(err, ImageLoaderError::NotFound);
    assert!(!dir.path().join("thumbnails").join("missing.webp").exists());
}

#[tokio::test]
async fn test_thumbnail_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/thumbnails/slow.webp");
            then.status(200).body("img").delay(Duration::from_millis(500));
        })
        .await;

    let dir = tempdir().unwrap();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let loader = ImageLoader::with_client(&server.base_url(), dir.path().to_path_buf(), client);

    let err = loader.load_thumbnail("slow").await.err().unwrap();
    assert_eq!(err, ImageLoaderError::Timeout);
}

#[tokio::test]
async fn test_network_error() {
    let dir = tempdir().unwrap();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let loader = ImageLoader::with_client(&format!("http://{}", addr), dir.path().to_path_buf(), client);
    let err = loader.load_thumbnail("h1").await.err().unwrap();
    match err {
        ImageLoaderError::Network(_) => (),
        other => panic!("expected network error, got {:?}", other),
    }
}
