//! Secret reference grammar
//!
//! Decides whether an environment value points at a secret and decomposes it into
//! backend kind, locator and optional version. Pure string work, no I/O.
//!
//! Recognised forms:
//!
//! - `arn:aws:secretsmanager:REGION:ACCOUNT:secret:NAME` (the whole value is the locator)
//! - `arn:aws:ssm:REGION:ACCOUNT:parameter/PATH`
//! - `arn:aws:ssm:REGION:ACCOUNT:parameter/PATH:VERSION`

use std::fmt;

/// Kind of backend a reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// AWS Secrets Manager: structured JSON payloads
    SecretsManager,
    /// AWS Systems Manager Parameter Store: scalar payloads
    ParameterStore,
}

impl BackendKind {
    /// Short name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecretsManager => "secretsmanager",
            Self::ParameterStore => "ssm",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected pointer to an externally stored secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Backend that holds the secret
    pub kind: BackendKind,
    /// Backend-specific identifier
    pub locator: String,
    /// Explicit version; `None` means latest
    pub version: Option<String>,
    /// Variable name the value was attached to
    pub source_key: String,
}

impl Reference {
    /// Name sent to the backend: the locator, with `:VERSION` appended when pinned.
    #[must_use]
    pub fn lookup_name(&self) -> String {
        match &self.version {
            Some(version) => format!("{}:{version}", self.locator),
            None => self.locator.clone(),
        }
    }
}

const SECRETS_MANAGER_PREFIX: &str = "arn:aws:secretsmanager";
const PARAMETER_STORE_PREFIX: &str = "arn:aws:ssm";
const PARAMETER_MARKER: &str = ":parameter/";
const PARAMETER_SEGMENT: &str = "parameter";

/// `arn:aws:ssm:REGION:ACCOUNT:parameter/PATH`
const PARAMETER_FIELDS: usize = 6;
/// Same as above plus `:VERSION`
const VERSIONED_PARAMETER_FIELDS: usize = PARAMETER_FIELDS + 1;

type AddressParser = fn(&str) -> Option<(String, Option<String>)>;

/// Prefix table, most specific first.
const GRAMMAR: &[(&str, BackendKind, AddressParser)] = &[
    (
        SECRETS_MANAGER_PREFIX,
        BackendKind::SecretsManager,
        parse_secrets_manager,
    ),
    (
        PARAMETER_STORE_PREFIX,
        BackendKind::ParameterStore,
        parse_parameter,
    ),
];

/// Classify a single value.
///
/// Returns `None` for anything that is not a well-formed reference, including values
/// that start with a known prefix but have the wrong number of fields.
#[must_use]
pub fn classify(name: &str, value: &str) -> Option<Reference> {
    let (prefix, kind, parse) = GRAMMAR
        .iter()
        .find(|(prefix, _, _)| value.starts_with(prefix))?;

    let Some((locator, version)) = parse(value) else {
        tracing::trace!(
            name,
            prefix = *prefix,
            "Value matches a reference prefix but not its syntax; passing through"
        );
        return None;
    };

    Some(Reference {
        kind: *kind,
        locator,
        version,
        source_key: name.to_string(),
    })
}

fn parse_secrets_manager(value: &str) -> Option<(String, Option<String>)> {
    Some((value.to_string(), None))
}

fn parse_parameter(value: &str) -> Option<(String, Option<String>)> {
    if !value.contains(PARAMETER_MARKER) {
        return None;
    }

    let fields: Vec<&str> = value.split(':').collect();
    if fields.len() != PARAMETER_FIELDS && fields.len() != VERSIONED_PARAMETER_FIELDS {
        return None;
    }

    let path = fields[PARAMETER_FIELDS - 1].strip_prefix(PARAMETER_SEGMENT)?;
    if !path.starts_with('/') {
        return None;
    }

    let version = fields.get(PARAMETER_FIELDS).map(|v| (*v).to_string());
    Some((path.to_string(), version))
}
