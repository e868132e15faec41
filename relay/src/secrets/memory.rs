//! In-memory secret store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{secret_key, SecretStore};
use crate::error::SecretStoreError;

/// Process-local secret store with the same semantics as the durable one.
#[derive(Debug)]
pub struct MemorySecretStore {
    prefix: String,
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            secrets: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, identity: &str) -> Result<Option<String>, SecretStoreError> {
        let key = secret_key(&self.prefix, identity);
        Ok(self.secrets.read().await.get(&key).cloned())
    }

    async fn put(
        &self,
        identity: &str,
        secret: &str,
        overwrite: bool,
    ) -> Result<(), SecretStoreError> {
        let key = secret_key(&self.prefix, identity);
        let mut secrets = self.secrets.write().await;

        if !overwrite && secrets.contains_key(&key) {
            return Err(SecretStoreError::AlreadyExists { key });
        }

        secrets.insert(key, secret.to_string());
        Ok(())
    }
}
