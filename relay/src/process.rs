//! Processing of one forwarded delivery.
//!
//! ```text
//! raw payload → WebhookDelivery → BatchEmitter::emit → event bus
//! ```

use tracing::info;

use crate::emitter::BatchEmitter;
use crate::error::ProcessError;
use crate::event::WebhookDelivery;

/// Parse a forwarded payload and publish its events.
///
/// Returns the number of publish calls made. Parse errors are permanent;
/// bus errors mean the whole delivery should be retried.
pub async fn process_delivery(
    emitter: &BatchEmitter,
    payload: &[u8],
) -> Result<usize, ProcessError> {
    let delivery: WebhookDelivery = serde_json::from_slice(payload)?;

    info!(events = delivery.events.len(), "delivery_process_start");

    let batches = emitter.emit(&delivery.events).await?;

    info!(
        events = delivery.events.len(),
        batches = batches,
        "delivery_process_complete"
    );

    Ok(batches)
}
