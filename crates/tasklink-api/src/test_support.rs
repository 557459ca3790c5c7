//! Shared fixtures for handler tests: an in-memory store, a temp upload
//! directory, and a hand-rolled multipart encoder.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use tasklink_db::Database;

use crate::storage::Storage;
use crate::{AppState, AppStateInner, router};

const BOUNDARY: &str = "tasklink-test-boundary-7MA4YWxkTrZu0gW";

pub enum Part {
    Text {
        name: &'static str,
        value: String,
    },
    File {
        name: &'static str,
        filename: String,
        content_type: Option<&'static str>,
        data: Vec<u8>,
    },
}

impl Part {
    pub fn text(name: &'static str, value: &str) -> Self {
        Self::Text {
            name,
            value: value.to_string(),
        }
    }

    pub fn file(name: &'static str, filename: &str, content_type: &'static str, data: &[u8]) -> Self {
        Self::File {
            name,
            filename: filename.to_string(),
            content_type: Some(content_type),
            data: data.to_vec(),
        }
    }

    pub fn untyped_file(name: &'static str, filename: &str, data: &[u8]) -> Self {
        Self::File {
            name,
            filename: filename.to_string(),
            content_type: None,
            data: data.to_vec(),
        }
    }
}

pub fn encode_parts(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                if let Some(ct) = content_type {
                    body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = encode_parts(parts);
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_upload_limit(None).await
    }

    pub async fn with_upload_limit(max_upload_bytes: Option<usize>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("uploads")).await.unwrap();
        let db = Database::open_in_memory().unwrap();
        let state: AppState = Arc::new(AppStateInner { db, storage });

        Self {
            router: router(state.clone(), max_upload_bytes),
            state,
            _dir: dir,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, header::HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Bytes) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, _, body) = self.send(req).await;
        (status, body)
    }

    async fn post_multipart(&self, body: Vec<u8>) -> (StatusCode, Bytes) {
        let req = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::CONTENT_TYPE, multipart_content_type())
            .body(Body::from(body))
            .unwrap();
        let (status, _, body) = self.send(req).await;
        (status, body)
    }

    pub async fn upload(&self, parts: &[Part]) -> (StatusCode, Bytes) {
        self.post_multipart(multipart_body(parts)).await
    }

    /// Send the parts without the closing boundary, as if the client hung up.
    pub async fn upload_truncated(&self, parts: &[Part]) -> (StatusCode, Bytes) {
        let mut body = encode_parts(parts);
        // Drop the trailing CRLF so the last part never terminates.
        body.truncate(body.len() - 2);
        self.post_multipart(body).await
    }

    /// Upload, assert success, and return the looked-up task record.
    pub async fn upload_and_lookup(&self, parts: &[Part]) -> Value {
        let (status, body) = self.upload(parts).await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));
        let upload: Value = serde_json::from_slice(&body).unwrap();
        let task_id = upload["taskId"].as_str().unwrap();

        let (status, body) = self.get(&format!("/api/task/{}", task_id)).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }
}

pub fn stored_file_count(app: &TestApp) -> usize {
    std::fs::read_dir(app.state.storage.dir()).unwrap().count()
}
