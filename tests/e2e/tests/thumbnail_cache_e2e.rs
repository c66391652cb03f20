use mocks::httptest::matchers::request;
use mocks::httptest::responders::status_code;
use mocks::httptest::Expectation;
use mocks::{backend_server, base_url};
use tempfile::TempDir;
use ui::ImageLoader;

#[tokio::main]
async fn main() {
    let server = backend_server();
    // A second load must be served from disk.
    server.expect(
        Expectation::matching(request::method_path("GET", "/thumbnails/hash1.webp"))
            .times(1)
            .respond_with(status_code(200).body(vec![0u8; 16])),
    );

    let dir = TempDir::new().expect("temp dir");
    let loader = ImageLoader::new(&base_url(&server), dir.path().to_path_buf(), 2);
    loader.load_thumbnail("hash1").await.expect("first load");
    loader.load_thumbnail("hash1").await.expect("cached load");

    assert!(dir.path().join("thumbnails").join("hash1.webp").exists());
}
