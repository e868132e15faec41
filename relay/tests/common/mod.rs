//! Shared test helpers for webhook endpoint tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;

use hookrelay::web::{compute_signature, router};
use hookrelay::{AppState, DeliveryForwarder, MemorySecretStore};

/// One forwarded payload as seen by the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Forwarded {
    pub identity: String,
    pub payload: Vec<u8>,
}

/// Forwarder that hands every payload to the test through a channel.
pub struct RecordingForwarder {
    tx: mpsc::UnboundedSender<Forwarded>,
}

#[async_trait]
impl DeliveryForwarder for RecordingForwarder {
    async fn forward(&self, identity: &str, payload: Vec<u8>) -> anyhow::Result<()> {
        self.tx
            .send(Forwarded {
                identity: identity.to_string(),
                payload,
            })
            .map_err(|_| anyhow::anyhow!("test receiver dropped"))
    }
}

/// Everything a test needs: the router plus handles on its collaborators.
pub struct TestApp {
    pub app: Router,
    pub secrets: Arc<MemorySecretStore>,
    forwarded: Mutex<mpsc::UnboundedReceiver<Forwarded>>,
}

impl TestApp {
    pub fn new() -> Self {
        let secrets = Arc::new(MemorySecretStore::new("/test/Secret"));
        let (tx, rx) = mpsc::unbounded_channel();
        let state = AppState::new(secrets.clone(), Arc::new(RecordingForwarder { tx }));

        Self {
            app: router(state),
            secrets,
            forwarded: Mutex::new(rx),
        }
    }

    /// Wait briefly for the next forwarded payload.
    pub async fn next_forwarded(&self) -> Option<Forwarded> {
        let mut rx = self.forwarded.lock().await;
        tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Let spawned tasks run, then report whether anything was forwarded.
    pub async fn nothing_forwarded(&self) -> bool {
        let mut rx = self.forwarded.lock().await;
        tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .is_err()
    }
}

/// Response status, headers and body text.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// POST to `uri` with the given headers and body.
pub async fn post(app: &Router, uri: &str, headers: &[(&str, &str)], body: &[u8]) -> TestResponse {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body.to_vec())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

/// Perform the handshake for `identity` with `secret`.
pub async fn handshake(app: &Router, identity: &str, secret: &str) -> TestResponse {
    post(
        app,
        &format!("/projects/{}", identity),
        &[("X-Hook-Secret", secret)],
        b"",
    )
    .await
}

/// Deliver `body` signed with `secret`.
pub async fn deliver_signed(app: &Router, identity: &str, secret: &str, body: &[u8]) -> TestResponse {
    let signature = compute_signature(secret, body).unwrap();
    deliver(app, identity, &signature, body).await
}

/// Deliver `body` with an explicit signature header.
pub async fn deliver(app: &Router, identity: &str, signature: &str, body: &[u8]) -> TestResponse {
    post(
        app,
        &format!("/projects/{}", identity),
        &[("X-Hook-Signature", signature)],
        body,
    )
    .await
}

/// A delivery body with `n` task-changed events.
pub fn delivery_body(n: usize) -> Vec<u8> {
    let events: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "action": "changed",
                "created_at": "2024-01-01T00:00:00Z",
                "resource": {"gid": i.to_string(), "resource_type": "task"}
            })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({ "events": events })).unwrap()
}
