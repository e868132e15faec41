//! Queue module for the verified-delivery channel.
//!
//! This module provides:
//! - The queue name shared by the web server and the emitter
//! - The `DeliveryForwarder` seam the web handler dispatches through
//! - An async lapin publisher implementing it
//!
//! ## Architecture
//!
//! ```text
//! Web Server → verified_deliveries queue → Emitter → event bus
//! ```

pub mod publisher;
pub mod types;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lapin::{options::QueueDeclareOptions, types::FieldTable, Channel};
use tracing::info;

pub use publisher::Publisher;
pub use types::{DEAD_LETTER_QUEUE, FORWARD_QUEUE};

/// Declare the forward queue and its dead-letter queue.
///
/// Both sides declare with the same arguments; a mismatch is rejected by the
/// broker.
pub async fn declare_queues(channel: &Channel) -> Result<()> {
    channel
        .queue_declare(
            DEAD_LETTER_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare dead-letter queue")?;

    channel
        .queue_declare(
            FORWARD_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            types::forward_queue_arguments(),
        )
        .await
        .context("Failed to declare forward queue")?;

    info!(
        queue = FORWARD_QUEUE,
        dead_letter_queue = DEAD_LETTER_QUEUE,
        delivery_limit = types::DELIVERY_LIMIT,
        "rabbitmq_queue_declared"
    );

    Ok(())
}

/// Hands a verified raw payload to the batch emitter.
#[async_trait]
pub trait DeliveryForwarder: Send + Sync {
    /// Enqueue `payload`, the exact verified request body, for `identity`.
    async fn forward(&self, identity: &str, payload: Vec<u8>) -> Result<()>;
}
