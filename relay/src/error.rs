//! Error types shared by the secret store, event bus and delivery processing.

use thiserror::Error;

/// Failure talking to the secret store.
///
/// A missing secret is not an error; `SecretStore::get` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// A create-only write found an existing secret.
    #[error("secret already exists at {key}")]
    AlreadyExists { key: String },

    /// The backing service failed or was unreachable.
    #[error("secret store backend error: {0}")]
    Backend(String),
}

/// Failure publishing a batch to the event bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The publish call itself failed.
    #[error("event bus publish failed: {0}")]
    Publish(String),

    /// The call went through but the bus rejected some entries.
    #[error("event bus rejected {failed} of {total} entries")]
    PartialFailure { failed: usize, total: usize },

    /// An event could not be turned into a bus entry. Nothing was sent for it.
    #[error("event {index} could not be encoded: {source}")]
    Encode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl BusError {
    /// Whether publishing the same entries again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BusError::Publish(_) | BusError::PartialFailure { .. } => true,
            BusError::Encode { .. } => false,
        }
    }
}

/// Failure processing one forwarded delivery.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The delivery body is not a valid webhook payload.
    #[error("malformed delivery: {0}")]
    Parse(#[from] serde_json::Error),

    /// A batch could not be published.
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl ProcessError {
    /// Whether retrying the same delivery could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProcessError::Parse(_) => false,
            ProcessError::Bus(e) => e.is_retryable(),
        }
    }
}
