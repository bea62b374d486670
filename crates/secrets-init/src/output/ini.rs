//! INI write-back
//!
//! Every `(section, key, value)` of the file is flattened into one environment entry
//! named `section.key` (or just `key` outside any section) with a [`Slot`] pointing
//! back at it. After resolution, plain-text secrets are written into their slot and
//! the file is saved in place; structured secrets are rejected, failed entries keep
//! their original value.

use super::OutputError;
use ini::Ini;
use secrets_init_core::{Environment, Resolution, Slot};
use std::collections::HashMap;
use std::path::Path;

/// What happened during a write-back.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Flattened names whose value was replaced
    pub written: Vec<String>,
    /// Flattened names holding structured secrets that cannot fill a single slot
    pub rejected: Vec<String>,
    /// Flattened names with no slot in the document
    pub unmapped: Vec<String>,
}

/// Flattened name of an INI entry.
#[must_use]
pub fn flat_name(section: Option<&str>, key: &str) -> String {
    match section {
        Some(section) => format!("{section}.{key}"),
        None => key.to_string(),
    }
}

/// Read an INI file into a document and its flattened environment.
///
/// # Errors
///
/// Returns [`OutputError::Open`] if the file cannot be read and
/// [`OutputError::Parse`] if it is not valid INI.
pub fn load(path: &Path) -> Result<(Ini, Environment), OutputError> {
    let document = Ini::load_from_file(path).map_err(|e| match e {
        ini::Error::Io(source) => OutputError::Open {
            path: path.to_path_buf(),
            source,
        },
        ini::Error::Parse(parse) => OutputError::Parse {
            path: path.to_path_buf(),
            message: parse.to_string(),
        },
    })?;

    let environment = flatten(&document);
    tracing::debug!(
        path = %path.display(),
        entries = environment.len(),
        "Loaded INI file"
    );
    Ok((document, environment))
}

/// Flatten a document into an environment with write-back slots.
///
/// A flattened name must identify exactly one slot. Entries whose name is shared
/// with another entry (`a.b` in the general section next to `[a] b`, a key repeated
/// within a section, or a section declared twice) are left out and logged; they are
/// neither resolved nor rewritten.
#[must_use]
pub fn flatten(document: &Ini) -> Environment {
    let mut section_counts: HashMap<&str, usize> = HashMap::new();
    let mut name_counts: HashMap<String, usize> = HashMap::new();
    for (section, properties) in document {
        if let Some(section) = section {
            *section_counts.entry(section).or_default() += 1;
        }
        for (key, _) in properties.iter() {
            *name_counts.entry(flat_name(section, key)).or_default() += 1;
        }
    }

    let mut environment = Environment::new();
    for (section, properties) in document {
        let repeated_section =
            section.is_some_and(|s| section_counts.get(s).is_some_and(|&n| n > 1));
        for (key, value) in properties.iter() {
            let name = flat_name(section, key);
            if repeated_section || name_counts.get(&name).is_some_and(|&n| n > 1) {
                tracing::warn!(
                    name = %name,
                    section = ?section,
                    key,
                    "INI entry does not map to a unique slot; leaving it untouched"
                );
                continue;
            }
            environment.push_with_slot(
                name,
                value,
                Slot {
                    section: section.map(str::to_string),
                    key: key.to_string(),
                },
            );
        }
    }
    environment
}

/// Apply resolved secrets to the document.
///
/// Plain-text secrets replace the value in their slot. Structured secrets and
/// secrets whose source has no slot are logged and skipped.
pub fn apply(
    document: &mut Ini,
    resolution: &Resolution,
    environment: &Environment,
) -> WriteReport {
    let mut report = WriteReport::default();

    for secret in &resolution.secrets {
        let Some(slot) = environment.slot(&secret.source_key) else {
            tracing::warn!(
                name = %secret.source_key,
                locator = %secret.locator,
                "No INI slot for resolved secret; skipping"
            );
            report.unmapped.push(secret.source_key.clone());
            continue;
        };

        match secret.scalar_value() {
            Ok(value) => {
                document.set_to(
                    slot.section.as_deref(),
                    slot.key.clone(),
                    value.expose().to_string(),
                );
                report.written.push(secret.source_key.clone());
            }
            Err(mismatch) => {
                tracing::error!(
                    name = %secret.source_key,
                    locator = %secret.locator,
                    pairs = mismatch.count,
                    error = %mismatch,
                    "Structured secret cannot be written into a single INI value; skipping"
                );
                report.rejected.push(secret.source_key.clone());
            }
        }
    }

    report
}

/// Apply resolved secrets and save the document back to `path`.
///
/// # Errors
///
/// Returns [`OutputError::Write`] if the file cannot be saved.
pub fn write_back(
    path: &Path,
    mut document: Ini,
    resolution: &Resolution,
    environment: &Environment,
) -> Result<WriteReport, OutputError> {
    let report = apply(&mut document, resolution, environment);

    document
        .write_to_file(path)
        .map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(
        path = %path.display(),
        written = report.written.len(),
        rejected = report.rejected.len(),
        unmapped = report.unmapped.len(),
        "Wrote resolved secrets back into INI file"
    );
    Ok(report)
}
