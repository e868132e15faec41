//! HookRelay Web Server - task-service webhook receiver.
//!
//! This binary provides a thin web server that:
//! - Completes the webhook handshake by storing and echoing the secret
//! - Verifies the HMAC signature of each delivery
//! - Enqueues verified raw payloads to RabbitMQ without waiting
//! - Returns 200 as soon as the delivery is authenticated
//!
//! Publishing to the event bus happens in the emitter.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hookrelay::web::router;
use hookrelay::{
    AppState, Config, MemorySecretStore, Publisher, SecretBackend, SecretStore, SsmSecretStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        secret_prefix = %config.secret_prefix,
        secret_backend = ?config.secret_backend,
        "config_loaded"
    );

    let secrets: Arc<dyn SecretStore> = match config.secret_backend {
        SecretBackend::Ssm => {
            let sdk_config = aws_config::from_env().load().await;
            Arc::new(SsmSecretStore::new(&sdk_config, config.secret_prefix.clone()))
        }
        SecretBackend::Memory => {
            tracing::warn!("memory_secret_store_in_use");
            Arc::new(MemorySecretStore::new(config.secret_prefix.clone()))
        }
    };

    // Create RabbitMQ publisher
    let publisher = Publisher::new(config.amqp_url.clone());
    info!("rabbitmq_publisher_created");

    // Create application state
    let state = AppState::new(secrets, Arc::new(publisher.clone()));

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Close publisher connection
    publisher.close().await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
