//! Integration tests for the fetch pipeline.
//!
//! These tests drive the public library API against a mock addon API.

use std::time::Duration;

use addon_fetch::{
    EngineError, FailurePolicy, FetchConfig, FetchEngine, FetchError, FileIdentifier, HttpClient,
    Manifest, ResolverKind, build_resolver,
};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts the metadata endpoint for one file, expecting exactly one call.
async fn mount_metadata(
    server: &MockServer,
    id: FileIdentifier,
    file_name: &str,
    file_length: u64,
    delay: Duration,
) {
    let download_url = format!("{}/files/{}", server.uri(), file_name);
    Mock::given(method("GET"))
        .and(path(format!(
            "/addon/{}/file/{}",
            id.project_id, id.file_id
        )))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "id": id.file_id,
                    "downloadUrl": download_url,
                    "fileName": file_name,
                    "fileLength": file_length,
                }))
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts the download endpoint for one file with the given call expectation.
async fn mount_download(server: &MockServer, file_name: &str, body: Vec<u8>, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{file_name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(calls)
        .mount(server)
        .await;
}

fn engine_for(server: &MockServer, config: FetchConfig) -> FetchEngine {
    let client = HttpClient::new();
    let resolver = build_resolver(ResolverKind::Addon, client.clone(), Some(&server.uri()), None)
        .expect("mock server URI should be a valid API base");
    FetchEngine::new(resolver, client, config).expect("valid config")
}

#[tokio::test]
async fn test_batch_downloads_missing_file() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let id = FileIdentifier::new(1, 10);
    mount_metadata(&server, id, "a.zip", 100, Duration::ZERO).await;
    mount_download(&server, "a.zip", vec![7u8; 100], 1).await;

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let mut lines = Vec::new();
    let summary = engine
        .run_batch(&[id], |progress| lines.push(progress.to_string()))
        .await
        .expect("batch should succeed");

    assert_eq!(lines, vec!["[1/1] a.zip (100B)".to_string()]);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.cached, 0);
    assert_eq!(summary.bytes_downloaded, 100);
    let written = std::fs::read(output.path().join("a.zip")).expect("file should exist");
    assert_eq!(written, vec![7u8; 100]);
}

#[tokio::test]
async fn test_batch_reuses_file_with_matching_size() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let id = FileIdentifier::new(1, 10);
    mount_metadata(&server, id, "a.zip", 100, Duration::ZERO).await;
    mount_download(&server, "a.zip", vec![7u8; 100], 0).await;

    let existing = vec![1u8; 100];
    std::fs::write(output.path().join("a.zip"), &existing).unwrap();

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let mut lines = Vec::new();
    let summary = engine
        .run_batch(&[id], |progress| lines.push(progress.to_string()))
        .await
        .expect("batch should succeed");

    assert_eq!(lines, vec!["[1/1] a.zip (100B cached)".to_string()]);
    assert_eq!(summary.cached, 1);
    assert_eq!(summary.downloaded, 0);
    // Content is not inspected, only the size
    assert_eq!(std::fs::read(output.path().join("a.zip")).unwrap(), existing);
}

#[tokio::test]
async fn test_batch_overwrites_file_with_wrong_size() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let id = FileIdentifier::new(1, 10);
    mount_metadata(&server, id, "a.zip", 100, Duration::ZERO).await;
    mount_download(&server, "a.zip", vec![7u8; 100], 1).await;

    std::fs::write(output.path().join("a.zip"), vec![1u8; 99]).unwrap();

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let mut lines = Vec::new();
    engine
        .run_batch(&[id], |progress| lines.push(progress.to_string()))
        .await
        .expect("batch should succeed");

    assert_eq!(lines, vec!["[1/1] a.zip (100B)".to_string()]);
    assert_eq!(
        std::fs::read(output.path().join("a.zip")).unwrap(),
        vec![7u8; 100]
    );
}

#[tokio::test]
async fn test_batch_no_cache_downloads_even_when_size_matches() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let id = FileIdentifier::new(1, 10);
    mount_metadata(&server, id, "a.zip", 100, Duration::ZERO).await;
    mount_download(&server, "a.zip", vec![7u8; 100], 1).await;

    std::fs::write(output.path().join("a.zip"), vec![1u8; 100]).unwrap();

    let config = FetchConfig::new(output.path()).with_cache_disabled(true);
    let engine = engine_for(&server, config);
    let summary = engine
        .run_batch(&[id], |_| {})
        .await
        .expect("batch should succeed");

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.cached, 0);
    assert_eq!(
        std::fs::read(output.path().join("a.zip")).unwrap(),
        vec![7u8; 100]
    );
}

#[tokio::test]
async fn test_batch_short_body_fails_integrity_and_writes_nothing() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let id = FileIdentifier::new(1, 10);
    mount_metadata(&server, id, "a.zip", 100, Duration::ZERO).await;
    mount_download(&server, "a.zip", vec![7u8; 97], 1).await;

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let mut lines = Vec::new();
    let err = engine
        .run_batch(&[id], |progress| lines.push(progress.to_string()))
        .await
        .expect_err("short body should fail the batch");

    match err {
        EngineError::ItemFailed {
            identifier,
            source:
                FetchError::Integrity {
                    expected_bytes,
                    actual_bytes,
                    ..
                },
        } => {
            assert_eq!(identifier, id);
            assert_eq!(expected_bytes, 100);
            assert_eq!(actual_bytes, 97);
        }
        other => panic!("expected integrity failure, got {other:?}"),
    }
    assert!(lines.is_empty(), "no success line for a failed item");
    assert!(!output.path().join("a.zip").exists());
}

#[tokio::test]
async fn test_batch_long_body_fails_integrity_and_writes_nothing() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let id = FileIdentifier::new(1, 10);
    mount_metadata(&server, id, "a.zip", 100, Duration::ZERO).await;
    mount_download(&server, "a.zip", vec![7u8; 150], 1).await;

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let mut lines = Vec::new();
    let err = engine
        .run_batch(&[id], |progress| lines.push(progress.to_string()))
        .await
        .expect_err("long body should fail the batch");

    match err {
        EngineError::ItemFailed {
            source:
                FetchError::Integrity {
                    expected_bytes,
                    actual_bytes,
                    ..
                },
            ..
        } => {
            assert_eq!(expected_bytes, 100);
            assert!(actual_bytes > 100, "got {actual_bytes}");
        }
        other => panic!("expected integrity failure, got {other:?}"),
    }
    assert!(lines.is_empty(), "no success line for a failed item");
    assert!(!output.path().join("a.zip").exists());
}

#[tokio::test]
async fn test_fetch_one_huge_declared_length_fails_integrity() {
    // gzip stream of an empty payload; decoding hides the content length
    const EMPTY_GZIP: [u8; 20] = [
        0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x03, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let id = FileIdentifier::new(1, 10);
    mount_metadata(&server, id, "huge.bin", 1 << 60, Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/files/huge.bin"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(EMPTY_GZIP.to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let result = engine.fetch_one(&id).await;

    match result {
        Err(FetchError::Integrity {
            expected_bytes,
            actual_bytes,
            ..
        }) => {
            assert_eq!(expected_bytes, 1 << 60);
            assert_eq!(actual_bytes, 0);
        }
        other => panic!("expected integrity failure, got {other:?}"),
    }
    assert!(!output.path().join("huge.bin").exists());
}

#[tokio::test]
async fn test_batch_reports_in_completion_order() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let slow = FileIdentifier::new(1, 1);
    let fast = FileIdentifier::new(1, 2);
    mount_metadata(&server, slow, "slow.bin", 4, Duration::from_millis(400)).await;
    mount_metadata(&server, fast, "fast.bin", 4, Duration::ZERO).await;
    mount_download(&server, "slow.bin", vec![0u8; 4], 1).await;
    mount_download(&server, "fast.bin", vec![0u8; 4], 1).await;

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let mut lines = Vec::new();
    engine
        .run_batch(&[slow, fast], |progress| lines.push(progress.to_string()))
        .await
        .expect("batch should succeed");

    assert_eq!(
        lines,
        vec!["[1/2] fast.bin (4B)".to_string(), "[2/2] slow.bin (4B)".to_string()]
    );
}

#[tokio::test]
async fn test_batch_concurrency_one_keeps_manifest_order() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let slow = FileIdentifier::new(1, 1);
    let fast = FileIdentifier::new(1, 2);
    mount_metadata(&server, slow, "slow.bin", 4, Duration::from_millis(200)).await;
    mount_metadata(&server, fast, "fast.bin", 4, Duration::ZERO).await;
    mount_download(&server, "slow.bin", vec![0u8; 4], 1).await;
    mount_download(&server, "fast.bin", vec![0u8; 4], 1).await;

    let config = FetchConfig::new(output.path()).with_concurrency(1);
    let engine = engine_for(&server, config);
    let mut names = Vec::new();
    engine
        .run_batch(&[slow, fast], |progress| {
            names.push(progress.result.display_name.clone());
        })
        .await
        .expect("batch should succeed");

    assert_eq!(names, vec!["slow.bin".to_string(), "fast.bin".to_string()]);
}

#[tokio::test]
async fn test_batch_keep_going_collects_failures() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let good = FileIdentifier::new(1, 1);
    let missing = FileIdentifier::new(1, 2);
    mount_metadata(&server, good, "good.bin", 3, Duration::ZERO).await;
    mount_download(&server, "good.bin", vec![0u8; 3], 1).await;
    Mock::given(method("GET"))
        .and(path("/addon/1/file/2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = FetchConfig::new(output.path()).with_failure_policy(FailurePolicy::CollectAll);
    let engine = engine_for(&server, config);
    let summary = engine
        .run_batch(&[good, missing], |_| {})
        .await
        .expect("collect-all never aborts");

    assert_eq!(summary.total, 2);
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_success());
    let failure = &summary.failures[0];
    assert_eq!(failure.identifier, missing);
    assert!(matches!(
        failure.error,
        FetchError::HttpStatus { status: 404, .. }
    ));
    assert!(output.path().join("good.bin").exists());
}

#[tokio::test]
async fn test_batch_rejects_traversal_file_name() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let id = FileIdentifier::new(1, 10);
    mount_metadata(&server, id, "../escape.bin", 4, Duration::ZERO).await;

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let err = engine
        .run_batch(&[id], |_| {})
        .await
        .expect_err("traversal should fail");

    assert!(matches!(
        err,
        EngineError::ItemFailed {
            source: FetchError::UnsafeFileName { .. },
            ..
        }
    ));
    assert!(!output.path().parent().unwrap().join("escape.bin").exists());
}

#[tokio::test]
async fn test_batch_from_manifest_file() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");
    let manifest_dir = TempDir::new().expect("failed to create temp dir");
    let manifest_path = manifest_dir.path().join("manifest.json");
    std::fs::write(
        &manifest_path,
        r#"{"name":"pack","files":[{"projectID":5,"fileID":50,"required":true},{"projectID":5,"fileID":50}]}"#,
    )
    .unwrap();

    let mut manifest = Manifest::load(&manifest_path).expect("manifest should parse");
    assert_eq!(manifest.dedup(), 1);

    let id = FileIdentifier::new(5, 50);
    mount_metadata(&server, id, "pack.jar", 2, Duration::ZERO).await;
    mount_download(&server, "pack.jar", vec![1u8, 2u8], 1).await;

    let engine = engine_for(&server, FetchConfig::new(output.path()));
    let summary = engine
        .run_batch(&manifest.files, |_| {})
        .await
        .expect("batch should succeed");

    assert_eq!(summary.total, 1);
    assert_eq!(summary.downloaded, 1);
}

#[tokio::test]
async fn test_mods_scheme_sends_api_key_on_both_requests() {
    let server = MockServer::start().await;
    let output = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/mods/2/files/20"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"id": 20, "fileName": "b.jar", "fileLength": 5, "displayName": "B Mod"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mods/2/files/20/download"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let resolver = build_resolver(
        ResolverKind::Mods,
        client.clone(),
        Some(&server.uri()),
        Some("secret".to_string()),
    )
    .unwrap();
    let engine = FetchEngine::new(resolver, client, FetchConfig::new(output.path())).unwrap();

    let result = engine
        .fetch_one(&FileIdentifier::new(2, 20))
        .await
        .expect("fetch should succeed");

    assert_eq!(result.display_name, "B Mod");
    assert!(!result.used_cache);
    assert_eq!(std::fs::read(output.path().join("b.jar")).unwrap(), b"hello");
}
