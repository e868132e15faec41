//! HookRelay - task-service webhooks to an event bus.
//!
//! This library provides shared modules for the two HookRelay binaries:
//! - `hookrelay-web`: Webhook receiver handling the handshake and signature checks
//! - `hookrelay-emitter`: Publishes verified deliveries to the event bus in batches
//!
//! ## Architecture
//!
//! ```text
//! Task service → Web Server → verified_deliveries → Emitter → event bus
//!                    ↕
//!               secret store
//! ```

pub mod bus;
pub mod config;
pub mod emitter;
pub mod error;
pub mod event;
pub mod process;
pub mod queue;
pub mod secrets;
pub mod web;

// Re-export commonly used types
pub use bus::{EventBridgeBus, EventBus, RecordingBus, MAX_BATCH_SIZE};
pub use config::{Config, SecretBackend};
pub use emitter::BatchEmitter;
pub use error::{BusError, ProcessError, SecretStoreError};
pub use event::{BusEntry, DomainEvent, WebhookDelivery};
pub use process::process_delivery;
pub use queue::{DeliveryForwarder, Publisher, FORWARD_QUEUE};
pub use secrets::{MemorySecretStore, SecretStore, SsmSecretStore};
pub use web::AppState;
