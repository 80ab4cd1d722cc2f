//! Test helpers for coordinator integration tests
//!
//! Every [`TestApp`] owns a fresh in-memory database and a temporary blob
//! directory, and drives the full router (middleware included) with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use selfplay_server::{
    api,
    config::Config,
    db::Store,
    features::FeatureState,
    storage::{FsBlobStore, SharedBlobStore},
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Store,
    pub blobs: SharedBlobStore,
    _blob_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let store = Store::open_in_memory().await.expect("in-memory store");
        let blob_dir = tempfile::tempdir().expect("temp dir");
        let blobs: SharedBlobStore = Arc::new(FsBlobStore::new(blob_dir.path()).await.expect("blob store"));

        let state = FeatureState::new(store.pool().clone(), blobs.clone(), config.dispatch);
        let router = api::create_router(state, &config);

        Self {
            router,
            store,
            blobs,
            _blob_dir: blob_dir,
        }
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    pub async fn seed_network(&self, sha: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO networks (sha, blob_key) VALUES (?, ?) RETURNING id")
            .bind(sha)
            .bind(format!("networks/{}", sha))
            .fetch_one(self.store.pool())
            .await
            .unwrap()
    }

    pub async fn seed_training_run(&self, best_network_id: i64) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO training_runs (description, best_network_id, active) VALUES ('Testing', ?, 1) RETURNING id",
        )
        .bind(best_network_id)
        .fetch_one(self.store.pool())
        .await
        .unwrap()
    }

    pub async fn seed_match(&self, training_run_id: i64, candidate_id: i64, best_id: i64, params: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO matches (training_run_id, candidate_id, current_best_id, parameters) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(training_run_id)
        .bind(candidate_id)
        .bind(best_id)
        .bind(params)
        .fetch_one(self.store.pool())
        .await
        .unwrap()
    }

    pub async fn scalar(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(self.store.pool()).await.unwrap()
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.get(uri).await;
        (status, to_json(&body))
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, to_json(&body))
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, to_json(&body))
    }

    pub async fn post_multipart(&self, uri: &str, fields: &[(&str, &str)], file: Option<&[u8]>) -> (StatusCode, Value) {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        if let Some(data) = file {
            form = form.part("file", reqwest::multipart::Part::bytes(data.to_vec()).file_name("file.gz"));
        }

        // Let reqwest encode the body and boundary exactly as the worker does
        let mut encoded = reqwest::Client::new()
            .post("http://localhost/")
            .multipart(form)
            .build()
            .unwrap();
        let content_type = encoded.headers()[header::CONTENT_TYPE].clone();
        let body = encoded.body_mut().take().unwrap();

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::new(body))
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, to_json(&body))
    }

    /// `POST` with the given body and no `Content-Type` header
    pub async fn post_untyped(&self, uri: &str, body: &'static str) -> (StatusCode, Value) {
        let request = Request::builder().method("POST").uri(uri).body(Body::from(body)).unwrap();
        let (status, body) = self.send(request).await;
        (status, to_json(&body))
    }
}

/// Worker credentials as form fields
pub fn credentials<'a>(user: &'a str, password: &'a str, version: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![("user", user), ("password", password), ("version", version)]
}

pub fn to_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}
