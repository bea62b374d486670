//! AWS provider construction and error categorisation
//!
//! Mode is chosen at build time:
//! - With the `aws` feature, the SDK is used; configuration and credentials are loaded
//!   once from the ambient chain (environment, profile, SSO, instance metadata).
//! - Without it, calls go through the `aws` CLI, which must be on `PATH`.

use super::{
    ParameterStoreResolver, Provider, ProviderKind, SecretBackend, SecretsManagerResolver,
};
use crate::error::{BackendError, ErrorCategory, ProviderInitError};
use crate::reference::BackendKind;
use serde::de::DeserializeOwned;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

#[cfg(feature = "aws")]
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

const PROVIDER: &str = "aws";
const AWS_CLI: &str = "aws";

/// Build the AWS provider using the SDK.
#[cfg(feature = "aws")]
pub(super) async fn connect() -> Result<Provider, ProviderInitError> {
    let config = load_sdk_config().await?;
    tracing::debug!(
        region = ?config.region(),
        mode = "sdk",
        "AWS secrets provider initialized"
    );

    Ok(Provider::new(
        ProviderKind::Aws,
        [
            Arc::new(SecretsManagerResolver::sdk(&config)) as Arc<dyn SecretBackend>,
            Arc::new(ParameterStoreResolver::sdk(&config)),
        ],
    ))
}

/// Build the AWS provider on top of the `aws` CLI.
#[cfg(not(feature = "aws"))]
pub(super) async fn connect() -> Result<Provider, ProviderInitError> {
    check_cli().await?;
    tracing::debug!(mode = "cli", "AWS secrets provider initialized");

    Ok(Provider::new(
        ProviderKind::Aws,
        [
            Arc::new(SecretsManagerResolver::cli()) as Arc<dyn SecretBackend>,
            Arc::new(ParameterStoreResolver::cli()),
        ],
    ))
}

/// Load shared SDK configuration and resolve credentials eagerly, so a missing
/// identity fails the run before any reference is processed.
#[cfg(feature = "aws")]
async fn load_sdk_config() -> Result<aws_config::SdkConfig, ProviderInitError> {
    use aws_credential_types::provider::ProvideCredentials;

    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;

    if config.region().is_none() {
        return Err(ProviderInitError::MissingRegion { provider: PROVIDER });
    }

    let credentials =
        config
            .credentials_provider()
            .ok_or_else(|| ProviderInitError::MissingCredentials {
                provider: PROVIDER,
                message: "no credentials provider configured".to_string(),
            })?;

    credentials
        .provide_credentials()
        .await
        .map_err(|e| ProviderInitError::MissingCredentials {
            provider: PROVIDER,
            message: DisplayErrorContext(&e).to_string(),
        })?;

    Ok(config)
}

/// Check that the `aws` CLI can be executed.
#[cfg_attr(feature = "aws", allow(dead_code))]
async fn check_cli() -> Result<(), ProviderInitError> {
    let output = Command::new(AWS_CLI)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ProviderInitError::CliUnavailable {
            provider: PROVIDER,
            program: AWS_CLI,
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ProviderInitError::CliUnavailable {
            provider: PROVIDER,
            program: AWS_CLI,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// Run an `aws` CLI command with JSON output and decode it.
///
/// The child is killed if the returned future is dropped.
pub(super) async fn run_cli_json<T: DeserializeOwned>(
    backend: BackendKind,
    locator: &str,
    args: &[&str],
) -> Result<T, BackendError> {
    let output = Command::new(AWS_CLI)
        .args(args)
        .args(["--output", "json"])
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            BackendError::transient(backend, locator, format!("Failed to execute aws CLI: {e}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let category = cli_error_code(&stderr).map_or(ErrorCategory::Transient, categorize_code);
        return Err(BackendError::new(
            category,
            backend,
            locator,
            format!("aws CLI failed: {}", stderr.trim()),
        ));
    }

    serde_json::from_slice(&output.stdout).map_err(|e| {
        BackendError::malformed(backend, locator, format!("Unexpected aws CLI output: {e}"))
    })
}

/// Map an SDK failure onto an error category.
#[cfg(feature = "aws")]
pub(super) fn sdk_error<E, R>(
    backend: BackendKind,
    locator: &str,
    err: &SdkError<E, R>,
) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let category = match err {
        SdkError::ServiceError(_) => err.code().map_or(ErrorCategory::Transient, categorize_code),
        _ => ErrorCategory::Transient,
    };
    BackendError::new(category, backend, locator, DisplayErrorContext(err).to_string())
}

/// Category for an AWS error code. Unknown codes are treated as transient.
pub(super) fn categorize_code(code: &str) -> ErrorCategory {
    match code {
        "ResourceNotFoundException"
        | "ParameterNotFound"
        | "ParameterVersionNotFound" => ErrorCategory::NotFound,
        "InvalidRequestException" | "InvalidParameterException" | "ValidationException" => {
            ErrorCategory::InvalidRequest
        }
        "AccessDeniedException"
        | "AccessDenied"
        | "UnrecognizedClientException"
        | "ExpiredTokenException"
        | "InvalidSignatureException"
        | "DecryptionFailure"
        | "InvalidKeyId" => ErrorCategory::AccessDenied,
        _ => ErrorCategory::Transient,
    }
}

/// Extract the error code from CLI output such as
/// `An error occurred (ParameterNotFound) when calling the GetParameter operation:`.
pub(super) fn cli_error_code(stderr: &str) -> Option<&str> {
    let rest = &stderr[stderr.find("An error occurred (")? + "An error occurred (".len()..];
    let end = rest.find(')')?;
    Some(&rest[..end])
}
