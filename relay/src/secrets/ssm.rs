//! AWS Systems Manager Parameter Store backend.
//!
//! Secrets are plain `String` parameters. Read-after-write visibility is
//! left to the service; no compare-and-swap is attempted.

use async_trait::async_trait;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::ParameterType;
use tracing::info;

use super::{secret_key, SecretStore};
use crate::error::SecretStoreError;

/// Secret store backed by SSM parameters named `{prefix}/{identity}`.
#[derive(Debug, Clone)]
pub struct SsmSecretStore {
    client: aws_sdk_ssm::Client,
    prefix: String,
}

impl SsmSecretStore {
    /// Create a store from a loaded AWS SDK configuration.
    pub fn new(sdk_config: &aws_config::SdkConfig, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        info!(prefix = %prefix, "ssm_secret_store_created");

        Self {
            client: aws_sdk_ssm::Client::new(sdk_config),
            prefix,
        }
    }

    /// Create a store around an existing client.
    pub fn from_client(client: aws_sdk_ssm::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl SecretStore for SsmSecretStore {
    async fn get(&self, identity: &str) -> Result<Option<String>, SecretStoreError> {
        let key = secret_key(&self.prefix, identity);

        match self.client.get_parameter().name(&key).send().await {
            Ok(output) => Ok(output
                .parameter()
                .and_then(|p| p.value())
                .map(|v| v.to_string())),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_parameter_not_found() {
                    return Ok(None);
                }
                Err(SecretStoreError::Backend(format!(
                    "get {}: {}",
                    key,
                    DisplayErrorContext(&err)
                )))
            }
        }
    }

    async fn put(
        &self,
        identity: &str,
        secret: &str,
        overwrite: bool,
    ) -> Result<(), SecretStoreError> {
        let key = secret_key(&self.prefix, identity);

        let result = self
            .client
            .put_parameter()
            .name(&key)
            .value(secret)
            .r#type(ParameterType::String)
            .overwrite(overwrite)
            .send()
            .await;

        match result {
            Ok(output) => {
                info!(key = %key, version = output.version(), "ssm_secret_stored");
                Ok(())
            }
            Err(err) => {
                let err = err.into_service_error();
                if err.is_parameter_already_exists() {
                    return Err(SecretStoreError::AlreadyExists { key });
                }
                Err(SecretStoreError::Backend(format!(
                    "put {}: {}",
                    key,
                    DisplayErrorContext(&err)
                )))
            }
        }
    }
}
