//! Uniform secret model and payload normalization
//!
//! A structured payload (secret blob) becomes a [`SecretFormat::KeyValue`] secret with
//! one pair per member. A scalar payload (parameter) becomes a
//! [`SecretFormat::PlainText`] secret with exactly one pair.

use crate::error::FormatMismatch;
use crate::reference::Reference;
use crate::resolvers::RawPayload;
use secrecy::{ExposeSecret, SecretString};

/// A secret value that is zeroed on drop and redacted in `Debug`/`Display`.
#[derive(Clone)]
pub struct SecureValue {
    inner: SecretString,
}

impl SecureValue {
    /// Move a string into secure storage.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }

    /// Expose the value. Callers must not log it.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Whether the value contains a space character.
    #[must_use]
    pub fn contains_space(&self) -> bool {
        self.expose().contains(' ')
    }
}

impl From<String> for SecureValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureValue {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl std::fmt::Debug for SecureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// How a secret was stored in its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretFormat {
    /// Derived from a structured payload; may carry several pairs
    KeyValue,
    /// Derived from a scalar payload; carries exactly one pair
    PlainText,
}

/// A single named value of a secret.
#[derive(Debug, Clone)]
pub struct KeyValue {
    /// Output key (upper-cased)
    pub key: String,
    /// Output value
    pub value: SecureValue,
}

/// A resolved secret, independent of the backend it came from.
#[derive(Debug, Clone)]
pub struct Secret {
    /// Pairs to emit; exactly one for `PlainText`
    pub key_values: Vec<KeyValue>,
    /// Backend locator the secret was read from
    pub locator: String,
    /// Variable the reference was attached to
    pub source_key: String,
    /// Payload shape
    pub format: SecretFormat,
}

impl Secret {
    /// `KEY=VALUE` strings, one per pair, in order.
    ///
    /// This exposes secret values.
    #[must_use]
    pub fn export_pairs(&self) -> Vec<String> {
        self.key_values
            .iter()
            .map(|kv| format!("{}={}", kv.key, kv.value.expose()))
            .collect()
    }

    /// The single value of a `PlainText` secret.
    ///
    /// # Errors
    ///
    /// Returns [`FormatMismatch`] for `KeyValue` secrets, which must never be truncated
    /// into a single slot.
    pub fn scalar_value(&self) -> Result<&SecureValue, FormatMismatch> {
        match (self.format, self.key_values.as_slice()) {
            (SecretFormat::PlainText, [only]) => Ok(&only.value),
            _ => Err(FormatMismatch {
                source_key: self.source_key.clone(),
                locator: self.locator.clone(),
                count: self.key_values.len(),
            }),
        }
    }
}

/// Convert a backend payload into a [`Secret`].
///
/// The payload variant decides the format; backends of each kind only ever produce
/// their own variant.
#[must_use]
pub fn normalize(reference: &Reference, payload: RawPayload) -> Secret {
    match payload {
        RawPayload::Structured(members) => Secret {
            key_values: members
                .into_iter()
                .map(|(key, value)| KeyValue {
                    key: key.to_uppercase(),
                    value: SecureValue::new(value),
                })
                .collect(),
            locator: reference.locator.clone(),
            source_key: reference.source_key.clone(),
            format: SecretFormat::KeyValue,
        },
        RawPayload::Scalar { name, value } => Secret {
            key_values: vec![KeyValue {
                key: parameter_key(&name),
                value: quote_if_spaced(value),
            }],
            locator: reference.locator.clone(),
            source_key: reference.source_key.clone(),
            format: SecretFormat::PlainText,
        },
    }
}

/// Output key for a parameter: one leading `/` removed, then upper-cased.
///
/// Inner separators are kept, so `/db/password` becomes `DB/PASSWORD`.
#[must_use]
pub fn parameter_key(name: &str) -> String {
    name.strip_prefix('/').unwrap_or(name).to_uppercase()
}

/// Wrap the value in double quotes if it contains a space.
#[must_use]
pub fn quote_if_spaced(value: SecureValue) -> SecureValue {
    if value.contains_space() {
        SecureValue::new(format!("\"{}\"", value.expose()))
    } else {
        value
    }
}
