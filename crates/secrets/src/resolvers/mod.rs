//! Backend resolvers
//!
//! One [`SecretBackend`] per [`BackendKind`], grouped into a [`Provider`] that is built
//! once per run. Built-in family:
//!
//! - [`ProviderKind::Aws`] - [`SecretsManagerResolver`] and [`ParameterStoreResolver`]

mod aws;
mod context;
mod parameter_store;
mod secrets_manager;

pub use context::CallContext;
pub use parameter_store::ParameterStoreResolver;
pub use secrets_manager::SecretsManagerResolver;

use crate::error::{BackendError, ProviderInitError};
use crate::reference::{BackendKind, Reference};
use crate::secret::SecureValue;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Backend response before normalization.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// A decoded JSON object of string members
    Structured(BTreeMap<String, String>),
    /// A single value together with the name the backend reports for it
    Scalar {
        /// Parameter name as reported by the backend (no version suffix)
        name: String,
        /// Raw, unquoted value
        value: SecureValue,
    },
}

/// Looks up references of one [`BackendKind`].
///
/// Implementations hold no per-call mutable state; their client is built once and
/// shared by concurrent calls.
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// Kind of reference this backend serves.
    fn kind(&self) -> BackendKind;

    /// Fetch the payload for a reference.
    ///
    /// `ctx` carries the run's cancellation token and deadline; the orchestrator
    /// also enforces both around this call.
    async fn fetch(
        &self,
        reference: &Reference,
        ctx: &CallContext,
    ) -> Result<RawPayload, BackendError>;
}

/// Backend family selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderKind {
    /// AWS Secrets Manager and Systems Manager Parameter Store
    #[default]
    Aws,
}

impl ProviderKind {
    /// Name accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            _ => Err(format!("Unknown secrets provider: {s}")),
        }
    }
}

/// The backends of one provider family, keyed by the kind they serve.
pub struct Provider {
    kind: ProviderKind,
    backends: HashMap<BackendKind, Arc<dyn SecretBackend>>,
}

impl Provider {
    /// Group already constructed backends. A later backend replaces an earlier one of
    /// the same kind.
    #[must_use]
    pub fn new(
        kind: ProviderKind,
        backends: impl IntoIterator<Item = Arc<dyn SecretBackend>>,
    ) -> Self {
        Self {
            kind,
            backends: backends
                .into_iter()
                .map(|backend| (backend.kind(), backend))
                .collect(),
        }
    }

    /// Build the clients for a provider family from ambient configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderInitError`] when no backend call could succeed, for example
    /// when no credentials are available.
    pub async fn connect(kind: ProviderKind) -> Result<Self, ProviderInitError> {
        match kind {
            ProviderKind::Aws => aws::connect().await,
        }
    }

    /// Provider family.
    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Backend serving the given reference kind.
    #[must_use]
    pub fn backend(&self, kind: BackendKind) -> Option<&Arc<dyn SecretBackend>> {
        self.backends.get(&kind)
    }

    /// Reference kinds this provider can resolve.
    #[must_use]
    pub fn backend_kinds(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<_> = self.backends.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.as_str());
        kinds
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind)
            .field("backends", &self.backend_kinds())
            .finish()
    }
}
