//! Integration tests for the webhook endpoint.

mod common;

use axum::http::StatusCode;

use common::{deliver, deliver_signed, delivery_body, handshake, post, TestApp};
use hookrelay::web::{compute_signature, NOT_REGISTERED_MESSAGE, SIGNATURE_INVALID_MESSAGE};
use hookrelay::SecretStore;

#[tokio::test]
async fn test_health_returns_ok() {
    let test = TestApp::new();

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(test.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_handshake_echoes_and_stores_secret() {
    let test = TestApp::new();

    let response = handshake(&test.app, "proj1", "abc123").await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.headers["x-hook-secret"], "abc123");
    assert!(response.body.is_empty());
    assert_eq!(
        test.secrets.get("proj1").await.unwrap(),
        Some("abc123".to_string())
    );
    assert!(test.nothing_forwarded().await);
}

#[tokio::test]
async fn test_handshake_takes_priority_over_signature() {
    let test = TestApp::new();

    let response = post(
        &test.app,
        "/projects/proj1",
        &[("X-Hook-Secret", "abc123"), ("X-Hook-Signature", "whatever")],
        &delivery_body(1),
    )
    .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.headers["x-hook-secret"], "abc123");
    assert!(test.nothing_forwarded().await);
}

#[tokio::test]
async fn test_missing_signature_is_bad_request() {
    let test = TestApp::new();
    handshake(&test.app, "proj1", "abc123").await;

    let response = post(&test.app, "/projects/proj1", &[], &delivery_body(1)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.is_empty());
    assert!(test.nothing_forwarded().await);
}

#[tokio::test]
async fn test_empty_body_is_bad_request() {
    let test = TestApp::new();
    handshake(&test.app, "proj1", "abc123").await;

    let signature = compute_signature("abc123", b"").unwrap();
    let response = deliver(&test.app, "proj1", &signature, b"").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_malformed_request_checked_before_registration() {
    let test = TestApp::new();

    // No handshake and no signature: still a plain 400 with no body
    let response = post(&test.app, "/projects/unknown", &[], &delivery_body(1)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_unregistered_identity_is_rejected() {
    let test = TestApp::new();

    let response = deliver_signed(&test.app, "proj1", "abc123", &delivery_body(1)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, NOT_REGISTERED_MESSAGE);
    assert!(test.nothing_forwarded().await);
}

#[tokio::test]
async fn test_secret_is_scoped_to_identity() {
    let test = TestApp::new();
    handshake(&test.app, "proj1", "abc123").await;

    let response = deliver_signed(&test.app, "proj2", "abc123", &delivery_body(1)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, NOT_REGISTERED_MESSAGE);
}

#[tokio::test]
async fn test_invalid_signatures_are_rejected() {
    let test = TestApp::new();
    handshake(&test.app, "proj1", "abc123").await;

    let body = delivery_body(1);
    let valid = compute_signature("abc123", &body).unwrap();

    for signature in [
        String::new(),
        valid.to_uppercase(),
        compute_signature("wrong", &body).unwrap(),
        "not-hex".to_string(),
    ] {
        let response = deliver(&test.app, "proj1", &signature, &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "signature {:?}", signature);
        assert_eq!(response.body, SIGNATURE_INVALID_MESSAGE);
    }

    assert!(test.nothing_forwarded().await);
}

#[tokio::test]
async fn test_valid_delivery_is_forwarded_verbatim() {
    let test = TestApp::new();
    handshake(&test.app, "proj1", "abc123").await;

    let body = br#"{"events":[{"action":"changed","created_at":"2024-01-01T00:00:00Z","resource":{"gid":"1","resource_type":"task"}}]}"#;
    let response = deliver_signed(&test.app, "proj1", "abc123", body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());

    let forwarded = test.next_forwarded().await.expect("delivery forwarded");
    assert_eq!(forwarded.identity, "proj1");
    assert_eq!(forwarded.payload, body.to_vec());
    assert!(test.nothing_forwarded().await);
}

#[tokio::test]
async fn test_empty_event_list_is_accepted_but_not_forwarded() {
    let test = TestApp::new();
    handshake(&test.app, "proj1", "abc123").await;

    let response = deliver_signed(&test.app, "proj1", "abc123", br#"{"events":[]}"#).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(test.nothing_forwarded().await);
}

#[tokio::test]
async fn test_unparsable_verified_payload_still_ok() {
    let test = TestApp::new();
    handshake(&test.app, "proj1", "abc123").await;

    for body in [&b"not json"[..], &br#"{"events":[{"action":"exploded"}]}"#[..]] {
        let response = deliver_signed(&test.app, "proj1", "abc123", body).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    assert!(test.nothing_forwarded().await);
}

#[tokio::test]
async fn test_rotation_invalidates_old_secret() {
    let test = TestApp::new();
    let body = delivery_body(2);

    handshake(&test.app, "proj1", "old-secret").await;
    let response = deliver_signed(&test.app, "proj1", "old-secret", &body).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(test.next_forwarded().await.is_some());

    handshake(&test.app, "proj1", "new-secret").await;

    let response = deliver_signed(&test.app, "proj1", "old-secret", &body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, SIGNATURE_INVALID_MESSAGE);

    let response = deliver_signed(&test.app, "proj1", "new-secret", &body).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(test.next_forwarded().await.is_some());
}
