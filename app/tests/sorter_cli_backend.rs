use assert_cmd::prelude::*;
use mocks::httptest::matchers::request;
use mocks::httptest::responders::status_code;
use mocks::httptest::{Expectation, Server};
use mocks::{backend_server, base_url, media_json};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::json;
use std::process::Command;
use tempfile::TempDir;

fn build_cmd(home: &std::path::Path, server: &Server) -> Command {
    let mut cmd = Command::cargo_bin("sorter_cli").unwrap();
    cmd.env("HOME", home);
    cmd.args(["--api-base-url", &base_url(server)]);
    cmd
}

#[test]
fn scan_reports_discovered_items() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_scan(&server, true);
    mocks::expect_media(
        &server,
        json!([media_json(1, "image/jpeg"), media_json(2, "video/mp4")]),
    );

    build_cmd(dir.path(), &server)
        .args(["--poll-interval-ms", "100", "--scan-timeout-secs", "1", "scan"])
        .assert()
        .success()
        .stdout(contains("Scan started: Scanning started."))
        .stdout(contains("Discovered 2 items"))
        .stdout(contains("Scan finished: 2 items"));
}

#[test]
fn scan_trigger_failure_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_scan(&server, false);

    build_cmd(dir.path(), &server)
        .arg("scan")
        .assert()
        .failure()
        .stderr(contains("Scan failed to start"))
        .stderr(contains("Path not found"));
}

#[test]
fn scan_aborts_after_repeated_poll_failures() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_scan(&server, true);
    server.expect(
        Expectation::matching(request::method_path("GET", "/media"))
            .times(3)
            .respond_with(status_code(500)),
    );

    build_cmd(dir.path(), &server)
        .args([
            "--poll-interval-ms",
            "50",
            "--scan-timeout-secs",
            "30",
            "--max-poll-failures",
            "3",
            "scan",
        ])
        .assert()
        .failure()
        .stderr(contains("Poll failed (3 in a row)"))
        .stderr(contains("Scan aborted after 3 failed polls"));
}

#[test]
fn scan_can_be_cancelled() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_scan(&server, true);
    mocks::expect_media(&server, json!([]));

    build_cmd(dir.path(), &server)
        .args([
            "--poll-interval-ms",
            "100",
            "--scan-timeout-secs",
            "60",
            "scan",
            "--cancel-after-secs",
            "1",
        ])
        .assert()
        .success()
        .stdout(contains("Scan cancelled: 0 items"));
}

#[test]
fn list_media_shows_memberships() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    let mut pinned = media_json(1, "image/jpeg");
    pinned["collections"] = json!([{ "id": 5, "name": "Trip", "drive_folder_id": null }]);
    mocks::expect_media(&server, json!([pinned, media_json(2, "video/mp4")]));

    build_cmd(dir.path(), &server)
        .arg("list-media")
        .assert()
        .success()
        .stdout(contains("1 - IMG_0001.jpg [Trip]"))
        .stdout(contains("2 - IMG_0002.mp4"))
        .stdout(contains("Media items: 2"));
}

#[test]
fn list_media_respects_limit() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_media(
        &server,
        json!([media_json(1, "image/jpeg"), media_json(2, "image/jpeg")]),
    );

    build_cmd(dir.path(), &server)
        .args(["list-media", "--limit", "1"])
        .assert()
        .success()
        .stdout(contains("1 - IMG_0001.jpg"))
        .stdout(contains("IMG_0002").not());
}

#[test]
fn show_item_prints_json_or_not_found() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_media(&server, json!([media_json(4, "video/mp4")]));

    build_cmd(dir.path(), &server)
        .args(["show-item", "4"])
        .assert()
        .success()
        .stdout(contains("\"file_hash\": \"hash4\""));

    build_cmd(dir.path(), &server)
        .args(["show-item", "9"])
        .assert()
        .success()
        .stdout(contains("Item not found: 9"));
}

#[test]
fn list_collections_prints_names() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_collections(
        &server,
        json!([
            { "id": 1, "name": "Beach", "drive_folder_id": null },
            { "id": 2, "name": "Family", "drive_folder_id": "abc" }
        ]),
    );

    build_cmd(dir.path(), &server)
        .arg("list-collections")
        .assert()
        .success()
        .stdout(contains("Beach (id: 1)"))
        .stdout(contains("Family (id: 2)"));
}

#[test]
fn create_collection_and_assign() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_create_collection(&server, "Summer", 42);
    mocks::expect_assign(&server, 7, 42);

    build_cmd(dir.path(), &server)
        .args(["create-collection", "  Summer ", "--assign", "7"])
        .assert()
        .success()
        .stdout(contains("Collection created: Summer (id: 42)"))
        .stdout(contains("Assigned 7 to Summer"));
}

#[test]
fn create_collection_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();

    build_cmd(dir.path(), &server)
        .args(["create-collection", "   "])
        .assert()
        .failure()
        .stderr(contains("Collection name must not be empty"));
}

#[test]
fn assign_prints_backend_message() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_assign(&server, 3, 8);

    build_cmd(dir.path(), &server)
        .args(["assign", "3", "8"])
        .assert()
        .success()
        .stdout(contains("Assigned 3 to collection 8: Pinned"));
}

#[test]
fn sync_collection_prints_summary() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_sync(&server, 6, 4);

    build_cmd(dir.path(), &server)
        .args(["sync-collection", "6"])
        .assert()
        .success()
        .stdout(contains("Synced collection 6: 4 uploaded, 0 shortcuts, 0 errors"));
}

#[test]
fn thumbnail_url_resolves_hash() {
    let dir = TempDir::new().unwrap();
    let server = backend_server();
    mocks::expect_media(&server, json!([media_json(5, "image/jpeg")]));
    let expected = format!("{}/thumbnails/hash5.webp", base_url(&server));

    build_cmd(dir.path(), &server)
        .args(["thumbnail-url", "5"])
        .assert()
        .success()
        .stdout(contains(expected));
}
