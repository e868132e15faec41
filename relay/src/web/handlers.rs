//! Webhook endpoint handlers.
//!
//! Each call takes one of two paths:
//! 1. Handshake: store the offered secret and echo it back (204)
//! 2. Delivery: verify the body signature, then forward the raw body to
//!    the verified_deliveries queue without waiting for it (200)
//!
//! Parsing for emission happens in the background emitter.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::event::WebhookDelivery;
use crate::queue::DeliveryForwarder;
use crate::secrets::SecretStore;
use crate::web::signature::verify_signature;

/// Header carrying the one-time handshake secret, echoed back on the response.
pub const HOOK_SECRET_HEADER: &str = "x-hook-secret";

/// Header carrying the hex HMAC-SHA256 of the request body.
pub const HOOK_SIGNATURE_HEADER: &str = "x-hook-signature";

/// Reply when a delivery arrives before its handshake.
pub const NOT_REGISTERED_MESSAGE: &str = "Webhook handshake has not been completed";

/// Reply when the body signature does not match.
pub const SIGNATURE_INVALID_MESSAGE: &str = "Signature is not valid";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub secrets: Arc<dyn SecretStore>,
    pub forwarder: Arc<dyn DeliveryForwarder>,
}

impl AppState {
    pub fn new(secrets: Arc<dyn SecretStore>, forwarder: Arc<dyn DeliveryForwarder>) -> Self {
        Self { secrets, forwarder }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Task Service Webhook
// =============================================================================

/// Webhook endpoint for one identity (`/projects/:identity`).
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = headers.get(HOOK_SECRET_HEADER) {
        return handshake(&state, &identity, secret.clone()).await;
    }

    let signature = headers
        .get(HOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    info!(
        identity = %identity,
        body_length = body.len(),
        has_signature = signature.is_some(),
        "webhook_delivery_received"
    );

    let signature = match signature {
        Some(s) if !body.is_empty() => s,
        _ => {
            warn!(identity = %identity, "webhook_delivery_malformed");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let secret = match state.secrets.get(&identity).await {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            info!(identity = %identity, "webhook_not_registered");
            return (StatusCode::BAD_REQUEST, NOT_REGISTERED_MESSAGE).into_response();
        }
        Err(e) => {
            error!(identity = %identity, error = %e, "webhook_secret_lookup_failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if !verify_signature(&secret, &body, signature) {
        warn!(
            identity = %identity,
            signature_length = signature.len(),
            "webhook_signature_invalid"
        );
        return (StatusCode::BAD_REQUEST, SIGNATURE_INVALID_MESSAGE).into_response();
    }

    info!(identity = %identity, "webhook_signature_valid");

    match serde_json::from_slice::<WebhookDelivery>(&body) {
        Ok(delivery) if !delivery.events.is_empty() => {
            info!(
                identity = %identity,
                events = delivery.events.len(),
                "webhook_forwarding"
            );
            dispatch(state.forwarder.clone(), identity, body.to_vec());
        }
        Ok(_) => {
            info!(identity = %identity, "webhook_no_events");
        }
        Err(e) => {
            // Already authenticated: acknowledge so the sender does not retry
            error!(identity = %identity, error = %e, "webhook_payload_parse_failed");
        }
    }

    StatusCode::OK.into_response()
}

/// Store the offered secret and echo it back.
async fn handshake(state: &AppState, identity: &str, secret: HeaderValue) -> Response {
    let value = match secret.to_str() {
        Ok(v) => v,
        Err(_) => {
            warn!(identity = %identity, "webhook_handshake_secret_not_text");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Err(e) = state.secrets.put(identity, value, true).await {
        error!(identity = %identity, error = %e, "webhook_handshake_store_failed");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    info!(identity = %identity, "webhook_handshake_stored");

    (StatusCode::NO_CONTENT, [(HOOK_SECRET_HEADER, secret)]).into_response()
}

/// Forward on a detached task; the response never waits on the queue.
fn dispatch(forwarder: Arc<dyn DeliveryForwarder>, identity: String, payload: Vec<u8>) {
    tokio::spawn(async move {
        if let Err(e) = forwarder.forward(&identity, payload).await {
            error!(identity = %identity, error = %e, "webhook_forward_failed");
        }
    });
}
