//! Error taxonomy for secret resolution
//!
//! Per-entry failures ([`BackendError`], [`FormatMismatch`]) are recoverable and never
//! abort a batch. [`ProviderInitError`] is raised before any reference is processed and
//! stops the whole run.

use crate::reference::BackendKind;
use std::fmt;
use thiserror::Error;

/// Failure category of a backend call.
///
/// The orchestrator's retry/skip policy keys off this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The referenced secret or parameter does not exist
    NotFound,
    /// The ambient identity may not read the secret
    AccessDenied,
    /// The backend rejected the request itself, e.g. a secret scheduled for deletion
    InvalidRequest,
    /// Network failure, throttling, cancellation or deadline expiry
    Transient,
    /// The backend answered but the payload has the wrong shape
    MalformedPayload,
    /// The selected provider has no backend for this reference kind
    Unsupported,
}

impl ErrorCategory {
    /// Stable lowercase name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AccessDenied => "access_denied",
            Self::InvalidRequest => "invalid_request",
            Self::Transient => "transient",
            Self::MalformedPayload => "malformed_payload",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed lookup of a single reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Secret not found
    #[error("{backend} reference '{locator}' not found: {message}")]
    NotFound {
        /// Backend that was queried
        backend: BackendKind,
        /// Locator that was looked up
        locator: String,
        /// Backend-provided detail
        message: String,
    },

    /// Caller is not allowed to read the secret
    #[error("access denied to {backend} reference '{locator}': {message}")]
    AccessDenied {
        /// Backend that was queried
        backend: BackendKind,
        /// Locator that was looked up
        locator: String,
        /// Backend-provided detail
        message: String,
    },

    /// Request rejected by the backend (invalid state or parameters)
    #[error("{backend} rejected request for '{locator}': {message}")]
    InvalidRequest {
        /// Backend that was queried
        backend: BackendKind,
        /// Locator that was looked up
        locator: String,
        /// Backend-provided detail
        message: String,
    },

    /// Network, throttling, cancellation or deadline failure
    #[error("transient {backend} failure for '{locator}': {message}")]
    Transient {
        /// Backend that was queried
        backend: BackendKind,
        /// Locator that was looked up
        locator: String,
        /// Backend-provided detail
        message: String,
    },

    /// Payload could not be decoded into the shape the backend promises
    #[error("malformed {backend} payload for '{locator}': {message}")]
    MalformedPayload {
        /// Backend that was queried
        backend: BackendKind,
        /// Locator that was looked up
        locator: String,
        /// Decoding detail
        message: String,
    },

    /// No backend registered for the reference kind
    #[error("no {backend} backend available for '{locator}'")]
    Unsupported {
        /// Backend kind that was requested
        backend: BackendKind,
        /// Locator that was looked up
        locator: String,
    },
}

impl BackendError {
    /// Build an error of the given category.
    #[must_use]
    pub fn new(
        category: ErrorCategory,
        backend: BackendKind,
        locator: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let locator = locator.into();
        let message = message.into();
        match category {
            ErrorCategory::NotFound => Self::NotFound {
                backend,
                locator,
                message,
            },
            ErrorCategory::AccessDenied => Self::AccessDenied {
                backend,
                locator,
                message,
            },
            ErrorCategory::InvalidRequest => Self::InvalidRequest {
                backend,
                locator,
                message,
            },
            ErrorCategory::Transient => Self::Transient {
                backend,
                locator,
                message,
            },
            ErrorCategory::MalformedPayload => Self::MalformedPayload {
                backend,
                locator,
                message,
            },
            ErrorCategory::Unsupported => Self::Unsupported { backend, locator },
        }
    }

    /// Shorthand for a [`BackendError::Transient`].
    #[must_use]
    pub fn transient(
        backend: BackendKind,
        locator: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::Transient, backend, locator, message)
    }

    /// Shorthand for a [`BackendError::MalformedPayload`].
    #[must_use]
    pub fn malformed(
        backend: BackendKind,
        locator: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::MalformedPayload, backend, locator, message)
    }

    /// Category of this failure.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AccessDenied { .. } => ErrorCategory::AccessDenied,
            Self::InvalidRequest { .. } => ErrorCategory::InvalidRequest,
            Self::Transient { .. } => ErrorCategory::Transient,
            Self::MalformedPayload { .. } => ErrorCategory::MalformedPayload,
            Self::Unsupported { .. } => ErrorCategory::Unsupported,
        }
    }

    /// Backend the failing call was made against.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        match self {
            Self::NotFound { backend, .. }
            | Self::AccessDenied { backend, .. }
            | Self::InvalidRequest { backend, .. }
            | Self::Transient { backend, .. }
            | Self::MalformedPayload { backend, .. }
            | Self::Unsupported { backend, .. } => *backend,
        }
    }

    /// Locator of the failing call.
    #[must_use]
    pub fn locator(&self) -> &str {
        match self {
            Self::NotFound { locator, .. }
            | Self::AccessDenied { locator, .. }
            | Self::InvalidRequest { locator, .. }
            | Self::Transient { locator, .. }
            | Self::MalformedPayload { locator, .. }
            | Self::Unsupported { locator, .. } => locator,
        }
    }

    /// Whether a later attempt may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// The provider's client could not be built; nothing can be resolved.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    /// No ambient credentials could be found
    #[error("no {provider} credentials available: {message}")]
    MissingCredentials {
        /// Provider family
        provider: &'static str,
        /// Credential chain detail
        message: String,
    },

    /// No region configured for a regional API
    #[error("no {provider} region configured")]
    MissingRegion {
        /// Provider family
        provider: &'static str,
    },

    /// The provider's command line tool could not be run
    #[error("{provider} CLI '{program}' is not usable: {message}")]
    CliUnavailable {
        /// Provider family
        provider: &'static str,
        /// Program that was run
        program: &'static str,
        /// Why it could not be used
        message: String,
    },
}

/// A `KeyValue` secret cannot be written into a single scalar slot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "secret '{source_key}' from '{locator}' holds {count} key/value pairs and cannot be written into a single value"
)]
pub struct FormatMismatch {
    /// Variable the secret was attached to
    pub source_key: String,
    /// Originating locator
    pub locator: String,
    /// Number of pairs carried by the secret
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_new_maps_every_category() {
        for category in [
            ErrorCategory::NotFound,
            ErrorCategory::AccessDenied,
            ErrorCategory::InvalidRequest,
            ErrorCategory::Transient,
            ErrorCategory::MalformedPayload,
            ErrorCategory::Unsupported,
        ] {
            let err = BackendError::new(category, BackendKind::ParameterStore, "/db/pw", "boom");
            assert_eq!(err.category(), category);
            assert_eq!(err.backend(), BackendKind::ParameterStore);
            assert_eq!(err.locator(), "/db/pw");
        }
    }

    #[test]
    fn backend_error_display_carries_context() {
        let err = BackendError::new(
            ErrorCategory::NotFound,
            BackendKind::SecretsManager,
            "arn:aws:secretsmanager:us-east-1:1:secret:web",
            "ResourceNotFoundException",
        );
        let msg = err.to_string();
        assert!(msg.contains("secretsmanager"));
        assert!(msg.contains("arn:aws:secretsmanager:us-east-1:1:secret:web"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn only_transient_is_transient() {
        assert!(BackendError::transient(BackendKind::ParameterStore, "/a", "slow").is_transient());
        assert!(!BackendError::malformed(BackendKind::SecretsManager, "x", "bad").is_transient());
    }

    #[test]
    fn format_mismatch_display() {
        let err = FormatMismatch {
            source_key: "app.db".to_string(),
            locator: "arn:aws:secretsmanager:x".to_string(),
            count: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("app.db"));
        assert!(msg.contains("3 key/value pairs"));
    }

    #[test]
    fn provider_init_error_display() {
        let err = ProviderInitError::MissingRegion { provider: "aws" };
        assert_eq!(err.to_string(), "no aws region configured");
    }
}
