use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use docpipe::config::PipelineConfig;
use docpipe::services::engine::{ConversionProfile, DocumentEngine, EngineError};
use docpipe::services::storage::StorageService;
use docpipe::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Deterministic engine: conversion/merge outputs are byte concatenations of
/// the inputs, previews always have two pages.
struct StubEngine;

const STUB_PAGES: usize = 2;

#[async_trait]
impl DocumentEngine for StubEngine {
    async fn convert(
        &self,
        source: &Path,
        dest: &Path,
        profile: ConversionProfile,
    ) -> Result<(), EngineError> {
        let data = tokio::fs::read(source).await.map_err(anyhow::Error::from)?;
        let mut out = format!("converted[{:?}]:", profile).into_bytes();
        out.extend_from_slice(&data);
        tokio::fs::write(dest, out).await.map_err(anyhow::Error::from)?;
        Ok(())
    }

    async fn merge(&self, sources: &[PathBuf], dest: &Path) -> Result<(), EngineError> {
        let mut out = Vec::new();
        for source in sources {
            let data = tokio::fs::read(source).await.map_err(anyhow::Error::from)?;
            out.extend_from_slice(&data);
            out.push(b'\n');
        }
        tokio::fs::write(dest, out).await.map_err(anyhow::Error::from)?;
        Ok(())
    }

    async fn render_view(&self, _source: &Path, dest: &Path) -> Result<usize, EngineError> {
        tokio::fs::write(dest, b"<html><body>stub view</body></html>")
            .await
            .map_err(anyhow::Error::from)?;
        Ok(STUB_PAGES)
    }

    async fn render_pages(&self, _source: &Path, dest_dir: &Path) -> Result<usize, EngineError> {
        for n in 1..=STUB_PAGES {
            tokio::fs::write(dest_dir.join(format!("p_{}.png", n)), b"stub png")
                .await
                .map_err(anyhow::Error::from)?;
        }
        Ok(STUB_PAGES)
    }
}

fn test_app(dir: &TempDir) -> Router {
    let config = PipelineConfig {
        incoming_dir: dir.path().join("incoming"),
        output_dir: dir.path().join("output"),
        preview_dir: dir.path().join("preview"),
        ..PipelineConfig::development()
    };
    let storage = Arc::new(StorageService::new(
        config.incoming_dir.clone(),
        config.output_dir.clone(),
        config.preview_dir.clone(),
    ));
    create_app(AppState::new(storage, Arc::new(StubEngine), config))
}

const BOUNDARY: &str = "X-DOCPIPE-TEST-BOUNDARY";

fn file_part(name: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    part.extend_from_slice(data);
    part.extend_from_slice(b"\r\n");
    part
}

fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
        .into_bytes()
}

fn multipart_request(uri: &str, parts: Vec<Vec<u8>>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(&part);
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn list_dir(path: &Path) -> Vec<String> {
    match std::fs::read_dir(path) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_preview_returns_page_count_matching_bundle() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/preview",
            vec![file_part("file", "report.pdf", b"%PDF-fake")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["pages"], STUB_PAGES as u64);

    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("/previews/report-"));

    // Exactly N page images plus one consolidated view in the bundle
    let key = url.strip_prefix("/previews/").unwrap();
    let bundle = dir.path().join("preview").join(key);
    let mut entries = list_dir(&bundle);
    entries.sort();
    assert_eq!(entries, vec!["p_1.png", "p_2.png", "preview.html"]);

    // The consolidated view is served as static content
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("{}/preview.html", url))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_convert_produces_exactly_one_artifact() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/convert",
            vec![
                file_part("file", "report.pdf", b"source bytes"),
                text_part("outputFormat", "docx"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["url"], "/downloads/report.docx");
    assert_eq!(body["pages"], STUB_PAGES as u64);
    assert!(body["preview"].as_str().unwrap().starts_with("/previews/"));

    let outputs = list_dir(&dir.path().join("output"));
    assert_eq!(outputs, vec!["report.docx"]);

    // The artifact is downloadable
    let response = app
        .oneshot(
            Request::builder()
                .uri("/downloads/report.docx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_convert_rejects_unsupported_format_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .oneshot(multipart_request(
            "/api/convert",
            vec![
                file_part("file", "report.pdf", b"source bytes"),
                text_part("outputFormat", "exe"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(list_dir(&dir.path().join("output")).is_empty());
}

#[tokio::test]
async fn test_merge_preserves_input_order() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .oneshot(multipart_request(
            "/api/merge",
            vec![
                file_part("files", "a.pdf", b"PAGES-OF-A"),
                file_part("files", "b.pdf", b"PAGES-OF-B"),
                file_part("files", "c.pdf", b"PAGES-OF-C"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    let url = body["url"].as_str().unwrap();
    let file_name = url.strip_prefix("/downloads/").unwrap();
    assert!(file_name.starts_with("merged_"));

    let merged = std::fs::read_to_string(dir.path().join("output").join(file_name)).unwrap();
    let a = merged.find("PAGES-OF-A").unwrap();
    let b = merged.find("PAGES-OF-B").unwrap();
    let c = merged.find("PAGES-OF-C").unwrap();
    assert!(a < b && b < c, "merge reordered its inputs: {}", merged);
}

#[tokio::test]
async fn test_merge_with_no_files_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .oneshot(multipart_request(
            "/api/merge",
            vec![text_part("note", "no files here")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No input files supplied");
    assert!(list_dir(&dir.path().join("output")).is_empty());
}

#[tokio::test]
async fn test_concurrent_merges_produce_distinct_artifacts() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let first = app.clone().oneshot(multipart_request(
        "/api/merge",
        vec![
            file_part("files", "a.pdf", b"FIRST-A"),
            file_part("files", "b.pdf", b"FIRST-B"),
        ],
    ));
    let second = app.clone().oneshot(multipart_request(
        "/api/merge",
        vec![
            file_part("files", "a.pdf", b"SECOND-A"),
            file_part("files", "b.pdf", b"SECOND-B"),
        ],
    ));

    let (first, second) = tokio::join!(first, second);
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let first_url = json_body(first).await["url"].as_str().unwrap().to_string();
    let second_url = json_body(second).await["url"].as_str().unwrap().to_string();
    assert_ne!(first_url, second_url);

    for url in [&first_url, &second_url] {
        let name = url.strip_prefix("/downloads/").unwrap();
        let content = std::fs::read(dir.path().join("output").join(name)).unwrap();
        assert!(!content.is_empty());
    }
}

#[tokio::test]
async fn test_health_reports_area_status() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["incoming"], "ready");
    assert_eq!(body["output"], "ready");
    assert_eq!(body["preview"], "ready");
}
