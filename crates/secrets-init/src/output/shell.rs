//! Sourceable shell script writer

use super::OutputError;
use secrets_init_core::Resolution;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

const SHEBANG: &str = "#!/bin/sh";

/// Render the script: the shebang, then one `export NAME=VALUE;` line per resolved
/// pair in resolution order, then passthrough entries when `include_passthrough`.
#[must_use]
pub fn render(resolution: &Resolution, include_passthrough: bool) -> String {
    let mut script = String::from(SHEBANG);

    let secret_pairs = resolution
        .secrets
        .iter()
        .flat_map(|secret| secret.export_pairs());
    for pair in secret_pairs {
        push_export(&mut script, &pair);
    }

    if include_passthrough {
        for (name, value) in &resolution.passthrough {
            push_export(&mut script, &format!("{name}={value}"));
        }
    }

    script
}

fn push_export(script: &mut String, assignment: &str) {
    script.push_str("\nexport ");
    script.push_str(assignment);
    script.push(';');
}

/// Write the rendered script to `path`, replacing any previous content.
///
/// # Errors
///
/// Returns [`OutputError::Open`] if the file cannot be created and
/// [`OutputError::Write`] if writing fails part way.
pub fn write_script(path: &Path, script: &str) -> Result<(), OutputError> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path).map_err(|source| OutputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    file.write_all(script.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(path = %path.display(), bytes = script.len(), "Wrote export script");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrets_init_core::{KeyValue, Secret, SecretFormat, SecureValue};
    use tempfile::TempDir;

    fn plain(key: &str, value: &str) -> Secret {
        Secret {
            key_values: vec![KeyValue {
                key: key.to_string(),
                value: SecureValue::from(value),
            }],
            locator: format!("/{}", key.to_lowercase()),
            source_key: "SOURCE".to_string(),
            format: SecretFormat::PlainText,
        }
    }

    fn resolution() -> Resolution {
        Resolution {
            secrets: vec![
                plain("DB/PASSWORD", "\"p@ss w0rd\""),
                Secret {
                    key_values: vec![
                        KeyValue {
                            key: "CAR".to_string(),
                            value: SecureValue::from("ford"),
                        },
                        KeyValue {
                            key: "TRUCK".to_string(),
                            value: SecureValue::from("chevy"),
                        },
                    ],
                    locator: "arn:aws:secretsmanager:x".to_string(),
                    source_key: "VEHICLES".to_string(),
                    format: SecretFormat::KeyValue,
                },
            ],
            passthrough: vec![("BAR".to_string(), "plain".to_string())],
            failures: Vec::new(),
        }
    }

    #[test]
    fn render_without_passthrough() {
        let script = render(&resolution(), false);
        assert_eq!(
            script,
            "#!/bin/sh\nexport DB/PASSWORD=\"p@ss w0rd\";\nexport CAR=ford;\nexport TRUCK=chevy;"
        );
        assert!(!script.contains("BAR"));
    }

    #[test]
    fn render_with_passthrough_appends_entries() {
        let script = render(&resolution(), true);
        assert!(script.ends_with("\nexport BAR=plain;"));
    }

    #[test]
    fn render_empty_resolution_is_just_the_shebang() {
        assert_eq!(render(&Resolution::default(), true), "#!/bin/sh");
    }

    #[test]
    fn write_script_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("env.sh");
        std::fs::write(&path, "#!/bin/sh\nexport OLD=a-much-longer-previous-value;").unwrap();

        write_script(&path, "#!/bin/sh\nexport A=1;").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#!/bin/sh\nexport A=1;");
    }

    #[cfg(unix)]
    #[test]
    fn write_script_creates_non_executable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("env.sh");
        write_script(&path, SHEBANG).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o133, 0);
    }

    #[test]
    fn write_script_reports_open_failures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("env.sh");

        let err = write_script(&path, SHEBANG).unwrap_err();
        assert!(matches!(err, OutputError::Open { .. }));
    }
}
