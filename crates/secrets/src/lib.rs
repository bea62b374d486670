//! Secret reference resolution for secrets-init
//!
//! Detects environment values that point at secrets held in AWS Secrets Manager or
//! AWS Systems Manager Parameter Store, resolves them through the selected provider,
//! and normalizes the results into a uniform [`Secret`] model that output writers can
//! serialize without knowing which backend a value came from.
//!
//! # Example
//!
//! ```ignore
//! use secrets_init_core::{Environment, Orchestrator, Provider, ProviderKind, ResolveConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let provider = Arc::new(Provider::connect(ProviderKind::Aws).await?);
//! let orchestrator = Orchestrator::new(provider, ResolveConfig::default());
//!
//! let resolution = orchestrator
//!     .resolve(&Environment::from_process(), &CancellationToken::new())
//!     .await;
//!
//! for secret in &resolution.secrets {
//!     for pair in secret.export_pairs() {
//!         // write `export {pair};`
//!     }
//! }
//! ```

mod config;
mod environment;
mod error;
mod reference;
mod resolve;
pub mod resolvers;
mod secret;

pub use config::{DEFAULT_CONCURRENCY, DEFAULT_RETRIES, DEFAULT_TIMEOUT, ResolveConfig};
pub use environment::{Environment, Slot, parse_assignment};
pub use error::{BackendError, ErrorCategory, FormatMismatch, ProviderInitError};
pub use reference::{BackendKind, Reference, classify};
pub use resolve::{EntryFailure, Orchestrator, Resolution};
pub use resolvers::{CallContext, Provider, ProviderKind, RawPayload, SecretBackend};
pub use secret::{
    KeyValue, Secret, SecretFormat, SecureValue, normalize, parameter_key, quote_if_spaced,
};
