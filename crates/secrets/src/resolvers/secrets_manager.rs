//! AWS Secrets Manager resolver
//!
//! Payloads must be JSON objects of string members; anything else is a
//! [`BackendError::MalformedPayload`].

use super::aws;
use super::{CallContext, RawPayload, SecretBackend};
use crate::error::BackendError;
use crate::reference::{BackendKind, Reference};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

#[cfg(feature = "aws")]
use aws_sdk_secretsmanager::Client;

const KIND: BackendKind = BackendKind::SecretsManager;

/// Subset of `aws secretsmanager get-secret-value` output.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSecretValueOutput {
    secret_string: Option<String>,
}

/// Resolves `arn:aws:secretsmanager` references.
pub struct SecretsManagerResolver {
    #[cfg(feature = "aws")]
    sdk_client: Option<Client>,
}

impl std::fmt::Debug for SecretsManagerResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManagerResolver")
            .field("mode", &if self.can_use_sdk() { "sdk" } else { "cli" })
            .finish()
    }
}

impl SecretsManagerResolver {
    /// Resolver backed by a shared SDK configuration.
    #[cfg(feature = "aws")]
    #[must_use]
    pub fn sdk(config: &aws_config::SdkConfig) -> Self {
        Self {
            sdk_client: Some(Client::new(config)),
        }
    }

    /// Resolver that shells out to the `aws` CLI.
    #[must_use]
    pub const fn cli() -> Self {
        Self {
            #[cfg(feature = "aws")]
            sdk_client: None,
        }
    }

    #[allow(clippy::unused_self)] // self is used when the feature is enabled
    const fn can_use_sdk(&self) -> bool {
        #[cfg(feature = "aws")]
        {
            self.sdk_client.is_some()
        }
        #[cfg(not(feature = "aws"))]
        {
            false
        }
    }

    #[cfg(feature = "aws")]
    async fn secret_string_sdk(
        client: &Client,
        reference: &Reference,
    ) -> Result<Option<String>, BackendError> {
        let response = client
            .get_secret_value()
            .secret_id(&reference.locator)
            .set_version_id(reference.version.clone())
            .send()
            .await
            .map_err(|e| aws::sdk_error(KIND, &reference.locator, &e))?;

        Ok(response.secret_string().map(str::to_string))
    }

    async fn secret_string_cli(reference: &Reference) -> Result<Option<String>, BackendError> {
        let mut args = vec![
            "secretsmanager",
            "get-secret-value",
            "--secret-id",
            reference.locator.as_str(),
        ];
        if let Some(version) = &reference.version {
            args.extend(["--version-id", version.as_str()]);
        }

        let output: GetSecretValueOutput =
            aws::run_cli_json(KIND, &reference.locator, &args).await?;
        Ok(output.secret_string)
    }

    async fn secret_string(&self, reference: &Reference) -> Result<Option<String>, BackendError> {
        #[cfg(feature = "aws")]
        if let Some(client) = &self.sdk_client {
            return Self::secret_string_sdk(client, reference).await;
        }

        Self::secret_string_cli(reference).await
    }
}

#[async_trait]
impl SecretBackend for SecretsManagerResolver {
    fn kind(&self) -> BackendKind {
        KIND
    }

    async fn fetch(
        &self,
        reference: &Reference,
        ctx: &CallContext,
    ) -> Result<RawPayload, BackendError> {
        ctx.check(KIND, &reference.locator)?;

        let secret_string = self.secret_string(reference).await?.ok_or_else(|| {
            BackendError::malformed(
                KIND,
                &reference.locator,
                "Secret has no string value (may be binary)",
            )
        })?;

        decode_members(&reference.locator, &secret_string).map(RawPayload::Structured)
    }
}

/// Decode a secret string as a flat JSON object of strings.
fn decode_members(
    locator: &str,
    secret_string: &str,
) -> Result<BTreeMap<String, String>, BackendError> {
    serde_json::from_str(secret_string).map_err(|e| {
        BackendError::malformed(
            KIND,
            locator,
            format!("Secret is not a JSON object of string values: {e}"),
        )
    })
}
