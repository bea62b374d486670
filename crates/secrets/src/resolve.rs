//! Resolution orchestrator
//!
//! Classifies every entry of an [`Environment`], resolves references through the
//! provider's backends with bounded concurrency, and normalizes the payloads. Results
//! keep input order no matter which backend call finishes first.

use crate::config::ResolveConfig;
use crate::environment::Environment;
use crate::error::{BackendError, ErrorCategory};
use crate::reference::{Reference, classify};
use crate::resolvers::{CallContext, Provider, RawPayload};
use crate::secret::{Secret, normalize};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    /// Variable the reference was attached to
    pub source_key: String,
    /// Why it failed (carries backend and locator)
    pub error: BackendError,
}

/// Outcome of a resolution pass.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Resolved secrets in input order
    pub secrets: Vec<Secret>,
    /// Entries that are not references, verbatim and in input order
    pub passthrough: Vec<(String, String)>,
    /// References that could not be resolved, in input order
    pub failures: Vec<EntryFailure>,
}

impl Resolution {
    /// Whether every reference resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the variable named `source_key` failed to resolve.
    #[must_use]
    pub fn failed(&self, source_key: &str) -> bool {
        self.failures.iter().any(|f| f.source_key == source_key)
    }
}

enum Outcome {
    Passthrough(String, String),
    Resolved(Secret),
    Failed(EntryFailure),
}

/// Resolves environments against one provider.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    provider: Arc<Provider>,
    config: ResolveConfig,
}

impl Orchestrator {
    /// Create an orchestrator over an already connected provider.
    #[must_use]
    pub fn new(provider: Arc<Provider>, config: ResolveConfig) -> Self {
        Self { provider, config }
    }

    /// Resolve every reference in `environment`.
    ///
    /// Per-entry failures are logged and collected in [`Resolution::failures`]; they
    /// never stop other entries. Cancelling `cancel` turns outstanding calls into
    /// transient failures.
    #[tracing::instrument(
        name = "resolve",
        skip_all,
        fields(provider = %self.provider.kind(), entries = environment.len())
    )]
    pub async fn resolve(
        &self,
        environment: &Environment,
        cancel: &CancellationToken,
    ) -> Resolution {
        let ctx = CallContext::with_timeout(cancel.clone(), self.config.timeout);

        let outcomes: Vec<Outcome> = stream::iter(environment.entries())
            .map(|(name, value)| self.resolve_entry(name, value, &ctx))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut resolution = Resolution::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Passthrough(name, value) => resolution.passthrough.push((name, value)),
                Outcome::Resolved(secret) => resolution.secrets.push(secret),
                Outcome::Failed(failure) => resolution.failures.push(failure),
            }
        }

        tracing::info!(
            secrets = resolution.secrets.len(),
            passthrough = resolution.passthrough.len(),
            failures = resolution.failures.len(),
            "Secret resolution finished"
        );

        resolution
    }

    async fn resolve_entry(&self, name: &str, value: &str, ctx: &CallContext) -> Outcome {
        let Some(reference) = classify(name, value) else {
            return Outcome::Passthrough(name.to_string(), value.to_string());
        };

        tracing::debug!(
            name,
            backend = %reference.kind,
            locator = %reference.locator,
            version = ?reference.version,
            "Resolving secret reference"
        );

        match self.fetch(&reference, ctx).await {
            Ok(payload) => Outcome::Resolved(normalize(&reference, payload)),
            Err(error) => {
                tracing::warn!(
                    name,
                    backend = %error.backend(),
                    locator = error.locator(),
                    category = %error.category(),
                    error = %error,
                    "Failed to resolve secret reference; skipping"
                );
                Outcome::Failed(EntryFailure {
                    source_key: reference.source_key,
                    error,
                })
            }
        }
    }

    /// Fetch with retries on transient failures while the pass is still live.
    async fn fetch(
        &self,
        reference: &Reference,
        ctx: &CallContext,
    ) -> Result<RawPayload, BackendError> {
        let backend = self.provider.backend(reference.kind).ok_or_else(|| {
            BackendError::new(
                ErrorCategory::Unsupported,
                reference.kind,
                &reference.locator,
                "",
            )
        })?;

        let mut attempt = 0;
        loop {
            let result = ctx
                .guard(
                    reference.kind,
                    &reference.locator,
                    backend.fetch(reference, ctx),
                )
                .await;

            match result {
                Err(err)
                    if err.is_transient() && attempt < self.config.retries && !ctx.is_done() =>
                {
                    let delay = self.config.backoff_for(attempt);
                    attempt += 1;
                    tracing::debug!(
                        locator = %reference.locator,
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "Transient backend failure; retrying"
                    );
                    let slept = ctx
                        .guard(reference.kind, &reference.locator, async {
                            tokio::time::sleep(delay).await;
                            Ok(())
                        })
                        .await;
                    if slept.is_err() {
                        return Err(err);
                    }
                }
                other => return other,
            }
        }
    }
}
