//! Event bus publishing.
//!
//! A publish call carries one batch of at most `MAX_BATCH_SIZE` entries.

pub mod eventbridge;
pub mod memory;

use async_trait::async_trait;

use crate::error::BusError;
use crate::event::BusEntry;

pub use eventbridge::EventBridgeBus;
pub use memory::RecordingBus;

/// Largest batch a single publish call may carry.
pub const MAX_BATCH_SIZE: usize = 10;

/// Destination for bus entries.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish one batch. Either every entry is accepted or an error is
    /// returned; callers treat both publish and partial failures alike.
    async fn put_entries(&self, entries: &[BusEntry]) -> Result<(), BusError>;
}
