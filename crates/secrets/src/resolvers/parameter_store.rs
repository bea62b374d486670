//! AWS Systems Manager Parameter Store resolver
//!
//! Always asks for decryption. The value is returned unmodified; quoting is left to
//! normalization.

use super::aws;
use super::{CallContext, RawPayload, SecretBackend};
use crate::error::BackendError;
use crate::reference::{BackendKind, Reference};
use crate::secret::SecureValue;
use async_trait::async_trait;
use serde::Deserialize;

#[cfg(feature = "aws")]
use aws_sdk_ssm::Client;

const KIND: BackendKind = BackendKind::ParameterStore;

/// Subset of `aws ssm get-parameter` output.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetParameterOutput {
    parameter: Option<ParameterOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterOutput {
    name: Option<String>,
    value: Option<String>,
}

/// Resolves `arn:aws:ssm:...:parameter/...` references.
pub struct ParameterStoreResolver {
    #[cfg(feature = "aws")]
    sdk_client: Option<Client>,
}

impl std::fmt::Debug for ParameterStoreResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStoreResolver")
            .field("mode", &if self.can_use_sdk() { "sdk" } else { "cli" })
            .finish()
    }
}

impl ParameterStoreResolver {
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
    async fn parameter_sdk(
        client: &Client,
        reference: &Reference,
    ) -> Result<ParameterOutput, BackendError> {
        let response = client
            .get_parameter()
            .name(reference.lookup_name())
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| aws::sdk_error(KIND, &reference.locator, &e))?;

        let parameter = response.parameter().ok_or_else(|| {
            BackendError::malformed(KIND, &reference.locator, "Response has no parameter")
        })?;

        Ok(ParameterOutput {
            name: parameter.name().map(str::to_string),
            value: parameter.value().map(str::to_string),
        })
    }

    async fn parameter_cli(reference: &Reference) -> Result<ParameterOutput, BackendError> {
        let name = reference.lookup_name();
        let output: GetParameterOutput = aws::run_cli_json(
            KIND,
            &reference.locator,
            &["ssm", "get-parameter", "--name", &name, "--with-decryption"],
        )
        .await?;

        output.parameter.ok_or_else(|| {
            BackendError::malformed(KIND, &reference.locator, "Response has no parameter")
        })
    }

    async fn parameter(&self, reference: &Reference) -> Result<ParameterOutput, BackendError> {
        #[cfg(feature = "aws")]
        if let Some(client) = &self.sdk_client {
            return Self::parameter_sdk(client, reference).await;
        }

        Self::parameter_cli(reference).await
    }
}

#[async_trait]
impl SecretBackend for ParameterStoreResolver {
    fn kind(&self) -> BackendKind {
        KIND
    }

    async fn fetch(
        &self,
        reference: &Reference,
        ctx: &CallContext,
    ) -> Result<RawPayload, BackendError> {
        ctx.check(KIND, &reference.locator)?;
        into_payload(reference, self.parameter(reference).await?)
    }
}

fn into_payload(
    reference: &Reference,
    parameter: ParameterOutput,
) -> Result<RawPayload, BackendError> {
    let value = parameter.value.ok_or_else(|| {
        BackendError::malformed(KIND, &reference.locator, "Parameter has no value")
    })?;

    Ok(RawPayload::Scalar {
        name: parameter.name.unwrap_or_else(|| reference.locator.clone()),
        value: SecureValue::new(value),
    })
}
