//! End-to-end tests for a release upload over the real HTTP stack.
//!
//! A wiremock server plays both the apps API and the upload domain.

use std::path::PathBuf;
use std::time::Duration;

use appdist_release::{
    ApiToken, DebugSymbols, ReleaseConfiguration, ReleaseError, RunOptions, SymbolOutcome,
    UploadTarget, run_release_upload,
};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APP: &str = "/v0.1/apps/acme/shop";
const MB: usize = 1024 * 1024;

fn config(targets: &[&str], notes: Option<&str>) -> ReleaseConfiguration {
    ReleaseConfiguration {
        owner: "acme".into(),
        app_name: "shop".into(),
        api_token: ApiToken::new("api-secret"),
        distribution_targets: targets.iter().map(|t| t.to_string()).collect(),
        notify_testers: false,
        release_notes: notes.map(str::to_string),
        max_retries: 3,
    }
}

fn options(server: &MockServer) -> RunOptions {
    RunOptions {
        api_base_url: format!("{}/v0.1/apps", server.uri()),
        retry_backoff: Duration::from_millis(10),
        poll_interval: Duration::ZERO,
        ..RunOptions::default()
    }
}

fn write_file(dir: &TempDir, name: &str, len: usize) -> PathBuf {
    let path = dir.path().join(name);
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, data).expect("Failed to create test artifact");
    path
}

/// Mounts the group lookups and the whole binary upload flow.
async fn mount_release_flow(server: &MockServer, chunk_size: usize) {
    for (name, id) in [("qa", "g1"), ("beta", "g2")] {
        Mock::given(method("GET"))
            .and(path(format!("{APP}/distribution_groups/{name}")))
            .and(header("X-API-Token", "api-secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": id })),
            )
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path(format!("{APP}/uploads/releases")))
        .and(header("X-API-Token", "api-secret"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "up-1",
            "upload_domain": server.uri(),
            "token": "sv=1&sig=abc",
            "url_encoded_token": "sv%3D1%26sig%3Dabc",
            "package_asset_id": "asset-1"
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload/set_metadata/asset-1"))
        .and(query_param("token", "sv=1&sig=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "chunk_size": chunk_size })),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload/finished/asset-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": false, "state": "Done" })),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("{APP}/uploads/releases/up-1")))
        .and(body_json(serde_json::json!({ "upload_status": "uploadFinished" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "up-1" })),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{APP}/uploads/releases/up-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "up-1",
            "upload_status": "uploadFinished"
        })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{APP}/uploads/releases/up-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "up-1",
            "upload_status": "readyToBePublished",
            "release_distinct_id": 7
        })))
        .mount(server)
        .await;
}

async fn mount_chunks_ok(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/upload/upload_chunk/asset-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": false })),
        )
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_attach(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(format!("{APP}/releases/7/groups")))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn uploads_distributes_and_skips_blank_notes() {
    let server = MockServer::start().await;
    mount_release_flow(&server, 5 * MB).await;
    mount_chunks_ok(&server, 5).await;
    mount_attach(&server, 2).await;
    Mock::given(method("PUT"))
        .and(path(format!("{APP}/releases/7")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = UploadTarget::from_path(write_file(&dir, "app-release.apk", 25 * MB))
        .await
        .unwrap();

    let outcome = run_release_upload(
        &config(&["qa", "beta"], Some("  ")),
        &target,
        None,
        &options(&server),
    )
    .await
    .unwrap();

    assert_eq!(outcome.release_id, 7);
    assert_eq!(outcome.blocks, 5);
    assert_eq!(outcome.bytes_sent, (25 * MB) as u64);
    assert_eq!(outcome.groups, vec!["qa".to_string(), "beta".to_string()]);
    assert_eq!(outcome.symbols, SymbolOutcome::Skipped);

    let requests = server.received_requests().await.unwrap();

    let blocks: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path() == "/upload/upload_chunk/asset-1")
        .map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "block_number")
                .map(|(_, v)| v.into_owned())
                .unwrap()
        })
        .collect();
    assert_eq!(blocks, vec!["1", "2", "3", "4", "5"]);

    let polls = requests
        .iter()
        .filter(|r| {
            r.method.as_str() == "GET" && r.url.path() == format!("{APP}/uploads/releases/up-1")
        })
        .count();
    assert_eq!(polls, 3);

    for r in requests.iter().filter(|r| r.url.path().starts_with("/upload/")) {
        assert!(
            !r.headers.contains_key("x-api-token"),
            "upload domain call carried the API token: {}",
            r.url.path()
        );
    }

    let attach_bodies: Vec<serde_json::Value> = requests
        .iter()
        .filter(|r| r.url.path() == format!("{APP}/releases/7/groups"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(
        attach_bodies,
        vec![
            serde_json::json!({ "id": "g1", "mandatory_update": false, "notify_testers": false }),
            serde_json::json!({ "id": "g2", "mandatory_update": false, "notify_testers": false }),
        ]
    );
}

#[tokio::test]
async fn release_notes_and_symbols() {
    let server = MockServer::start().await;
    mount_release_flow(&server, 4096).await;
    mount_chunks_ok(&server, 3).await;
    mount_attach(&server, 1).await;

    Mock::given(method("PUT"))
        .and(path(format!("{APP}/releases/7")))
        .and(body_json(serde_json::json!({ "release_notes": "Fixed checkout crash" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{APP}/symbol_uploads")))
        .and(body_json(serde_json::json!({
            "symbol_type": "AndroidProguard",
            "build": "42",
            "version": "1.4.0",
            "file_name": "mapping.txt"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "upload_url": format!("{}/blobs/mapping?sig=blob-secret", server.uri()),
            "symbol_upload_id": "sym-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/blobs/mapping"))
        .and(header("x-ms-blob-type", "BlockBlob"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("{APP}/symbol_uploads/sym-1")))
        .and(body_json(serde_json::json!({ "status": "committed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = UploadTarget::from_path(write_file(&dir, "app.apk", 10_000))
        .await
        .unwrap();
    let symbols = DebugSymbols::new(write_file(&dir, "mapping.txt", 300), "42", "1.4.0");

    let outcome = run_release_upload(
        &config(&["qa"], Some("Fixed checkout crash")),
        &target,
        Some(&symbols),
        &options(&server),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome.symbols,
        SymbolOutcome::Uploaded {
            symbol_upload_id: "sym-1".into()
        }
    );

    let requests = server.received_requests().await.unwrap();
    let order: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path().contains("symbol") || r.url.path().starts_with("/blobs/"))
        .map(|r| r.method.to_string())
        .collect();
    assert_eq!(order, vec!["POST", "PUT", "PATCH"]);
}

#[tokio::test]
async fn transient_chunk_failure_is_retried() {
    let server = MockServer::start().await;
    mount_release_flow(&server, 4).await;
    mount_attach(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/upload/upload_chunk/asset-1"))
        .and(query_param("block_number", "2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_chunks_ok(&server, 3).await;

    let dir = TempDir::new().unwrap();
    let target = UploadTarget::from_path(write_file(&dir, "app.apk", 10))
        .await
        .unwrap();

    let outcome = run_release_upload(&config(&["qa"], None), &target, None, &options(&server))
        .await
        .unwrap();
    assert_eq!(outcome.blocks, 3);

    let chunk_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/upload/upload_chunk/asset-1")
        .count();
    assert_eq!(chunk_calls, 5);
}

#[tokio::test]
async fn not_implemented_is_not_retried() {
    let server = MockServer::start().await;
    mount_release_flow(&server, 4).await;
    mount_attach(&server, 0).await;

    Mock::given(method("POST"))
        .and(path("/upload/upload_chunk/asset-1"))
        .respond_with(ResponseTemplate::new(501).set_body_string("chunk upload unsupported"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = UploadTarget::from_path(write_file(&dir, "app.apk", 10))
        .await
        .unwrap();

    let err = run_release_upload(&config(&["qa"], None), &target, None, &options(&server))
        .await
        .unwrap_err();
    match err {
        ReleaseError::Server { status, body, url, .. } => {
            assert_eq!(status, 501);
            assert_eq!(body.as_deref(), Some("chunk upload unsupported"));
            assert!(!url.contains("sig%3Dabc"), "{url}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_group_aborts_before_upload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{APP}/distribution_groups/qa")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "g1" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{APP}/distribution_groups/missing")))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "code": "NotFound", "message": "Distribution group missing not found" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(".*"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = UploadTarget::from_path(write_file(&dir, "app.apk", 10))
        .await
        .unwrap();

    let err = run_release_upload(
        &config(&["qa", "missing"], None),
        &target,
        None,
        &options(&server),
    )
    .await
    .unwrap_err();
    match err {
        ReleaseError::Server { status, message, .. } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Distribution group missing not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_server_exhausts_retries() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let target = UploadTarget::from_path(write_file(&dir, "app.apk", 10))
        .await
        .unwrap();
    let options = RunOptions {
        api_base_url: format!("http://{addr}/v0.1/apps"),
        retry_backoff: Duration::from_millis(1),
        ..RunOptions::default()
    };
    let cfg = ReleaseConfiguration {
        max_retries: 2,
        ..config(&["qa"], None)
    };

    let err = run_release_upload(&cfg, &target, None, &options)
        .await
        .unwrap_err();
    match err {
        ReleaseError::Transport(appdist_transport::TransportError::RetriesExhausted {
            attempts, ..
        }) => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn run_timeout_ends_a_release_that_never_becomes_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{APP}/uploads/releases/up-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "up-1",
            "upload_status": "uploadStarted"
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_release_flow(&server, 4).await;
    mount_chunks_ok(&server, 3).await;
    mount_attach(&server, 0).await;

    let dir = TempDir::new().unwrap();
    let target = UploadTarget::from_path(write_file(&dir, "app.apk", 10))
        .await
        .unwrap();
    let run_timeout = Duration::from_millis(500);
    let options = RunOptions {
        poll_interval: Duration::from_millis(20),
        run_timeout,
        ..options(&server)
    };

    let err = run_release_upload(&config(&["qa"], None), &target, None, &options)
        .await
        .unwrap_err();
    assert!(
        matches!(err, ReleaseError::Timeout(d) if d == run_timeout),
        "unexpected error: {err}"
    );

    let polls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| {
            r.method.as_str() == "GET" && r.url.path() == format!("{APP}/uploads/releases/up-1")
        })
        .count();
    assert!(polls > 1, "polled {polls} times");
}
