//! End-to-end HTTP tests against in-memory stores.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use bytes::Bytes;
use serde_json::{Value, json};
use tower::ServiceExt;

use surveydoc_api::error::CONFLICT_MESSAGE;
use surveydoc_api::{AppState, build_router};
use surveydoc_core::config::AppConfig;
use surveydoc_core::traits::storage::BlobStore;
use surveydoc_database::MemoryDocumentStore;
use surveydoc_database::store::DocumentStore;
use surveydoc_service::{DocumentService, VersioningService};
use surveydoc_storage::MemoryBlobStore;

struct TestApp {
    router: Router,
    blobs: MemoryBlobStore,
}

fn app() -> TestApp {
    let mut config = AppConfig::default();
    config.versioning.retry.base_delay_ms = 1;
    let config = Arc::new(config);

    let memory_blobs = MemoryBlobStore::new();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let blobs: Arc<dyn BlobStore> = Arc::new(memory_blobs.clone());
    let versioning = Arc::new(VersioningService::new(
        store.clone(),
        blobs.clone(),
        config.versioning.clone(),
        "text/html",
    ));
    let documents = Arc::new(DocumentService::new(
        store.clone(),
        blobs.clone(),
        versioning,
        "text/html",
    ));

    TestApp {
        router: build_router(AppState::new(config, store, blobs, documents)),
        blobs: memory_blobs,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        actor: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Bytes, Option<String>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header("x-actor-id", actor);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let version = response
            .headers()
            .get("x-document-version")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes, version)
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        actor: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes, _) = self.send(method, uri, actor, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(&self, document: &str, content: &str) {
        let (status, _) = self
            .json(
                Method::POST,
                &format!("/api/documents/acme/{document}"),
                Some("alice"),
                Some(json!({
                    "fileName": "Site survey",
                    "editors": ["bob"],
                    "viewers": ["carol"],
                    "content": content,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn health_reports_components() {
    let app = app();
    let (status, body) = app.json(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"]["backend"], "memory");
    assert_eq!(body["data"]["storage"]["healthy"], true);
}

#[tokio::test]
async fn missing_actor_is_unauthorized() {
    let app = app();
    let (status, body) = app
        .json(Method::GET, "/api/documents/acme/d1", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn create_update_and_read_back() {
    let app = app();
    app.create("d1", "<p>draft</p>").await;

    let (status, body) = app
        .json(
            Method::PUT,
            "/api/documents/acme/d1/content",
            Some("bob"),
            Some(json!({ "content": "<p>final</p>", "changeType": "edit" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentVersion"], 2);
    assert_eq!(body["data"]["sortKey"], "#LATEST");
    assert_eq!(body["data"]["type"], "Document");

    let (status, content, version) = app
        .send(Method::GET, "/api/documents/acme/d1/content", Some("carol"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content, Bytes::from("<p>final</p>"));
    assert_eq!(version.as_deref(), Some("2"));

    let (_, body) = app
        .json(Method::GET, "/api/documents/acme/d1/versions", Some("alice"), None)
        .await;
    let versions = body["data"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version"], 2);
    assert_eq!(versions[0]["changeType"], "edit");
    assert_eq!(versions[0]["author"], "bob");
    assert_eq!(versions[0]["path"], "documents/acme/d1/v2.html");
    assert_eq!(versions[1]["changeType"], "create");
}

#[tokio::test]
async fn lost_race_is_conflict_with_retry_hint() {
    let app = app();
    app.create("d1", "v1").await;
    // Another writer has already claimed version 2's content.
    app.blobs
        .put("documents/acme/d1/v2.html", Bytes::from("theirs"), "text/html")
        .await
        .unwrap();

    let (status, body) = app
        .json(
            Method::PUT,
            "/api/documents/acme/d1/content",
            Some("alice"),
            Some(json!({ "content": "mine" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], CONFLICT_MESSAGE);
}

#[tokio::test]
async fn access_lists_are_enforced() {
    let app = app();
    app.create("d1", "v1").await;

    let (status, _) = app
        .json(Method::GET, "/api/documents/acme/d1", Some("mallory"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(
            Method::PUT,
            "/api/documents/acme/d1/content",
            Some("carol"),
            Some(json!({ "content": "viewer edit" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reserved_characters_in_key_are_rejected() {
    let app = app();
    let (status, body) = app
        .json(Method::GET, "/api/documents/acme/a%23b", Some("alice"), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn restore_and_read_old_version() {
    let app = app();
    app.create("d1", "first").await;
    app.json(
        Method::PUT,
        "/api/documents/acme/d1/content",
        Some("alice"),
        Some(json!({ "content": "second" })),
    )
    .await;

    let (status, content, version) = app
        .send(
            Method::GET,
            "/api/documents/acme/d1/versions/1/content",
            Some("alice"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content, Bytes::from("first"));
    assert_eq!(version.as_deref(), Some("1"));

    let (status, body) = app
        .json(
            Method::POST,
            "/api/documents/acme/d1/versions/1/restore",
            Some("bob"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentVersion"], 3);

    let (_, content, _) = app
        .send(Method::GET, "/api/documents/acme/d1/content", Some("alice"), None)
        .await;
    assert_eq!(content, Bytes::from("first"));
}

#[tokio::test]
async fn delete_then_not_found() {
    let app = app();
    app.create("d1", "v1").await;

    let (status, _) = app
        .json(Method::DELETE, "/api/documents/acme/d1", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .json(Method::GET, "/api/documents/acme/d1", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
    assert!(app.blobs.is_empty());
}
