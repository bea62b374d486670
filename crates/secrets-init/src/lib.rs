//! secrets-init
//!
//! Replaces environment variables that hold AWS Secrets Manager or SSM Parameter Store
//! ARNs with the secrets they reference.
//!
//! Two output modes share one resolution pass:
//!
//! - **shell**: the process environment is resolved and written to a `#!/bin/sh`
//!   script of `export NAME=VALUE;` lines meant to be sourced by an entrypoint.
//! - **ini**: an INI file is read, every value is treated as a variable named
//!   `section.key`, and plain-text secrets are written back in place.
//!
//! Per-entry lookup failures are logged and leave the entry out of the output; only
//! provider initialization and output target failures abort the run.

pub mod cli;
pub mod errors;
pub mod output;
pub mod shutdown;
pub mod tracing;

use cli::{Cli, OutputMode};
use errors::CliError;
use output::{ini, shell};
use secrets_init_core::{Environment, Orchestrator, Provider, ProviderKind, Resolution};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Secrets resolved
    pub resolved: usize,
    /// Entries that were not references
    pub passthrough: usize,
    /// References that failed to resolve
    pub failed: usize,
    /// Values written to the output target (export lines or INI slots)
    pub written: usize,
}

impl RunSummary {
    fn from_resolution(resolution: &Resolution, written: usize) -> Self {
        if !resolution.is_complete() {
            ::tracing::warn!(
                failed = resolution.failures.len(),
                "Some secret references could not be resolved; they were left out of the output"
            );
        }
        Self {
            resolved: resolution.secrets.len(),
            passthrough: resolution.passthrough.len(),
            failed: resolution.failures.len(),
            written,
        }
    }
}

/// Execute one run as described by `cli`.
///
/// # Errors
///
/// Returns [`CliError::ProviderInit`] if the provider cannot be constructed (nothing
/// is written in that case) and [`CliError::OutputTarget`] if the output file cannot
/// be read or written.
pub async fn run(cli: &Cli, cancel: &CancellationToken) -> Result<RunSummary, CliError> {
    let kind = ProviderKind::from(cli.provider);
    let provider = Provider::connect(kind)
        .await
        .map_err(|source| CliError::ProviderInit {
            provider: kind,
            source,
        })?;
    ::tracing::debug!(
        provider = %kind,
        backends = ?provider.backend_kinds(),
        "Secrets provider ready"
    );

    let orchestrator = Orchestrator::new(Arc::new(provider), cli.resolve_config());

    let summary = match cli.mode {
        OutputMode::Shell => {
            let environment = Environment::from_process();
            let resolution = orchestrator.resolve(&environment, cancel).await;
            let script = shell::render(&resolution, cli.passthrough);
            shell::write_script(&cli.path, &script)?;

            let written = script.matches("\nexport ").count();
            RunSummary::from_resolution(&resolution, written)
        }
        OutputMode::Ini => {
            let (document, environment) = ini::load(&cli.path)?;
            let resolution = orchestrator.resolve(&environment, cancel).await;
            let report = ini::write_back(&cli.path, document, &resolution, &environment)?;
            RunSummary::from_resolution(&resolution, report.written.len())
        }
    };

    ::tracing::info!(
        path = %cli.path.display(),
        mode = ?cli.mode,
        resolved = summary.resolved,
        failed = summary.failed,
        written = summary.written,
        "secrets-init run complete"
    );
    Ok(summary)
}
