//! Batch emitter - publishes a delivery's events to the event bus.
//!
//! Events are converted 1:1 into bus entries and flushed in batches of at
//! most `MAX_BATCH_SIZE`, strictly in input order, one publish at a time.
//! A failed publish stops the run and is returned to the caller; batches
//! flushed before it stay published.

use std::sync::Arc;

use tracing::{error, info};

use crate::bus::{EventBus, MAX_BATCH_SIZE};
use crate::error::BusError;
use crate::event::{BusEntry, DomainEvent};

/// Converts domain events to bus entries and publishes them in batches.
#[derive(Clone)]
pub struct BatchEmitter {
    bus: Arc<dyn EventBus>,
    event_bus_name: String,
    source: String,
}

impl BatchEmitter {
    pub fn new(bus: Arc<dyn EventBus>, event_bus_name: String, source: String) -> Self {
        Self {
            bus,
            event_bus_name,
            source,
        }
    }

    /// Publish `events` in order. Returns the number of publish calls made.
    ///
    /// An empty slice makes no publish call.
    pub async fn emit(&self, events: &[DomainEvent]) -> Result<usize, BusError> {
        let mut batch: Vec<BusEntry> = Vec::with_capacity(MAX_BATCH_SIZE);
        let mut flushed = 0;

        for (index, event) in events.iter().enumerate() {
            let entry = BusEntry::from_event(event, &self.event_bus_name, &self.source)
                .map_err(|source| BusError::Encode { index, source })?;
            batch.push(entry);

            let last = index + 1 == events.len();
            if batch.len() == MAX_BATCH_SIZE || last {
                self.flush(&batch, flushed).await?;
                flushed += 1;
                batch.clear();
            }
        }

        info!(
            events = events.len(),
            batches = flushed,
            "emitter_delivery_published"
        );

        Ok(flushed)
    }

    async fn flush(&self, batch: &[BusEntry], batch_index: usize) -> Result<(), BusError> {
        match self.bus.put_entries(batch).await {
            Ok(()) => {
                info!(
                    batch_index = batch_index,
                    entries = batch.len(),
                    "bus_batch_published"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    batch_index = batch_index,
                    entries = batch.len(),
                    error = %e,
                    "bus_batch_failed"
                );
                Err(e)
            }
        }
    }
}
