//! Web server module for handling inbound webhooks.
//!
//! This module provides a thin web server that:
//! - Answers the task service's handshake by storing and echoing its secret
//! - Verifies the HMAC signature of every later delivery
//! - Hands verified raw payloads to the queue and returns 200 right away
//!
//! Emission to the event bus happens in the background emitter.

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, receive_webhook, AppState, HealthResponse, HOOK_SECRET_HEADER,
    HOOK_SIGNATURE_HEADER, NOT_REGISTERED_MESSAGE, SIGNATURE_INVALID_MESSAGE,
};
pub use signature::{compute_signature, verify_signature};

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects/:identity", post(receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
