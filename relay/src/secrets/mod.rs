//! Secret store gateway.
//!
//! One current secret per identity, stored under `{prefix}/{identity}`.
//! Nothing is cached in-process: every lookup goes to the backend.

pub mod memory;
pub mod ssm;

use async_trait::async_trait;

use crate::error::SecretStoreError;

pub use memory::MemorySecretStore;
pub use ssm::SsmSecretStore;

/// Durable get/put of handshake secrets keyed by identity.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Current secret for `identity`, or `None` if no handshake has happened.
    async fn get(&self, identity: &str) -> Result<Option<String>, SecretStoreError>;

    /// Store `secret` for `identity`.
    ///
    /// With `overwrite = false` an existing secret is left untouched and
    /// `SecretStoreError::AlreadyExists` is returned.
    async fn put(&self, identity: &str, secret: &str, overwrite: bool)
        -> Result<(), SecretStoreError>;
}

/// Storage key for an identity's secret.
pub fn secret_key(prefix: &str, identity: &str) -> String {
    format!("{}/{}", prefix, identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key() {
        assert_eq!(
            secret_key("/AsanaWebhook/Secret", "1200000000000001"),
            "/AsanaWebhook/Secret/1200000000000001"
        );
    }
}
