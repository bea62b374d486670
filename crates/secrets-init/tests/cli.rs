use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A command with an empty environment and no way to reach instance metadata.
fn isolated(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("secrets-init").unwrap();
    cmd.env_clear()
        .env("HOME", home.path())
        .env("AWS_CONFIG_FILE", home.path().join("aws-config"))
        .env("AWS_SHARED_CREDENTIALS_FILE", home.path().join("aws-credentials"))
        .env("AWS_EC2_METADATA_DISABLED", "true");
    cmd
}

/// Static credentials and a region: the provider connects without network access.
fn with_credentials(home: &TempDir) -> Command {
    let mut cmd = isolated(home);
    cmd.env("AWS_REGION", "us-east-1")
        .env("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")
        .env("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
    cmd
}

/// Credentials plus an endpoint nothing listens on: every lookup fails.
fn with_unreachable_backend(home: &TempDir) -> Command {
    let mut cmd = with_credentials(home);
    cmd.env("AWS_ENDPOINT_URL", "http://127.0.0.1:1")
        .env("AWS_MAX_ATTEMPTS", "1")
        .args(["--timeout", "20"]);
    cmd
}

const SSM_REF: &str = "arn:aws:ssm:us-east-1:123456789012:parameter/db/password";
const SM_REF: &str = "arn:aws:secretsmanager:us-east-1:123456789012:secret:app/config-AbCdEf";

#[test]
fn help_lists_options() {
    Command::cargo_bin("secrets-init")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--provider"))
        .stdout(predicate::str::contains("--passthrough"));
}

#[test]
fn long_version_includes_build_metadata() {
    Command::cargo_bin("secrets-init")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("commit:"));
}

#[test]
fn missing_path_is_a_usage_error() {
    Command::cargo_bin("secrets-init")
        .unwrap()
        .assert()
        .code(2);
}

#[test]
fn provider_init_failure_exits_1_and_writes_nothing() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("env.sh");

    isolated(&home)
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("aws"));

    assert!(!out.exists());
}

#[test]
fn unwritable_output_exits_7() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("missing-dir").join("env.sh");

    with_credentials(&home).arg(&out).assert().code(7);
}

#[test]
fn shell_mode_exports_passthrough_entries() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("env.sh");

    with_credentials(&home)
        .env("GREETING", "hello=world")
        .arg("--passthrough")
        .arg(&out)
        .assert()
        .success();

    let script = fs::read_to_string(&out).unwrap();
    assert!(script.starts_with("#!/bin/sh\n"));
    assert!(script.contains("\nexport GREETING=hello=world;"));
    assert!(!script.ends_with('\n'));
}

#[test]
fn shell_mode_without_passthrough_is_only_the_shebang() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("env.sh");

    with_credentials(&home)
        .env("GREETING", "hello")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).unwrap(), "#!/bin/sh");
}

#[test]
fn ini_mode_leaves_plain_values_alone() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("app.ini");
    fs::write(&path, "[server]\nport = 8080\nhost = localhost\n").unwrap();

    with_credentials(&home)
        .args(["--mode", "ini"])
        .arg(&path)
        .assert()
        .success();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("[server]"));
    assert!(written.contains("port=8080"));
    assert!(written.contains("host=localhost"));
}

#[test]
fn ini_mode_missing_file_exits_7() {
    let home = TempDir::new().unwrap();

    with_credentials(&home)
        .args(["--mode", "ini"])
        .arg(home.path().join("absent.ini"))
        .assert()
        .code(7);
}

#[test]
fn failed_references_still_exit_0_and_are_left_out() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("env.sh");

    with_unreachable_backend(&home)
        .env("DB_PASSWORD", SSM_REF)
        .env("APP_CONFIG", SM_REF)
        .env("GREETING", "hello")
        .arg("--passthrough")
        .arg(&out)
        .assert()
        .code(0);

    let script = fs::read_to_string(&out).unwrap();
    assert!(script.starts_with("#!/bin/sh\n"));
    assert!(script.contains("\nexport GREETING=hello;"));
    assert!(!script.contains("arn:aws:"));
    assert!(!script.contains("DB_PASSWORD"));
    assert!(!script.contains("APP_CONFIG"));
}

#[test]
fn failed_references_without_passthrough_leave_only_the_shebang() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("env.sh");

    with_unreachable_backend(&home)
        .env("DB_PASSWORD", SSM_REF)
        .env("APP_CONFIG", SM_REF)
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out).unwrap(), "#!/bin/sh");
}

#[test]
fn ini_mode_keeps_original_value_of_failed_references() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("app.ini");
    fs::write(
        &path,
        format!("[db]\npassword = {SSM_REF}\nuser = app\n\n[app]\nconfig = {SM_REF}\n"),
    )
    .unwrap();

    with_unreachable_backend(&home)
        .args(["--mode", "ini"])
        .arg(&path)
        .assert()
        .code(0);

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains(&format!("password={SSM_REF}")));
    assert!(written.contains(&format!("config={SM_REF}")));
    assert!(written.contains("user=app"));
}
