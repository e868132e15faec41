//! Event data contracts.
//!
//! This module provides:
//! - The webhook payload as delivered by the task service
//! - The normalized entry published to the event bus
//!
//! ## Flow
//!
//! ```text
//! WebhookDelivery { events: [DomainEvent] } → BusEntry (1:1) → event bus
//! ```

pub mod entry;
pub mod types;

pub use entry::{classification_tag, BusEntry};
pub use types::{Action, ChangeDescriptor, ChangeValue, DomainEvent, ResourceRef, WebhookDelivery};
