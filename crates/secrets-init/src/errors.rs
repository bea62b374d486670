//! CLI error types and exit code mapping
//!
//! Fatal conditions travel up as [`CliError`]; `main` is the only place that turns
//! them into an exit code.

use crate::output::OutputError;
use miette::Diagnostic;
use secrets_init_core::{ProviderInitError, ProviderKind};
use thiserror::Error;

/// Successful run, including runs with per-entry resolution failures
pub const EXIT_OK: i32 = 0;
/// Provider initialization or other fatal startup failure
pub const EXIT_INIT: i32 = 1;
/// Command line usage error (reported by clap)
pub const EXIT_CLI: i32 = 2;
/// Output target could not be opened or written
pub const EXIT_OUTPUT: i32 = 7;

/// Fatal errors of a secrets-init run
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// The selected provider could not be constructed
    #[error("Failed to initialize {provider} secrets provider")]
    #[diagnostic(
        code(secrets_init::provider_init),
        help("Check that ambient credentials and a region are configured for the provider")
    )]
    ProviderInit {
        /// Provider family that failed
        provider: ProviderKind,
        /// Underlying cause
        #[source]
        source: ProviderInitError,
    },

    /// The output target could not be opened or written
    #[error("Could not write output target")]
    #[diagnostic(
        code(secrets_init::output_target),
        help("Check file permissions and ensure the parent directory exists")
    )]
    OutputTarget {
        /// Underlying cause
        #[source]
        source: OutputError,
    },

    /// Logging could not be set up
    #[error("Tracing initialization failed: {message}")]
    #[diagnostic(
        code(secrets_init::tracing),
        help("Check RUST_LOG and the --log-level/--log-format options")
    )]
    Tracing {
        /// The error message
        message: String,
    },

    /// The async runtime could not be created
    #[error("Failed to create async runtime: {message}")]
    #[diagnostic(code(secrets_init::runtime))]
    Runtime {
        /// The error message
        message: String,
    },
}

impl CliError {
    /// Create a tracing setup error
    #[must_use]
    pub fn tracing(message: impl Into<String>) -> Self {
        Self::Tracing {
            message: message.into(),
        }
    }

    /// Create a runtime setup error
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}

impl From<OutputError> for CliError {
    fn from(source: OutputError) -> Self {
        Self::OutputTarget { source }
    }
}

/// Map a fatal error to the process exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::OutputTarget { .. } => EXIT_OUTPUT,
        CliError::ProviderInit { .. } | CliError::Tracing { .. } | CliError::Runtime { .. } => {
            EXIT_INIT
        }
    }
}
