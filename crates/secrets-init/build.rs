//! Build script to embed release metadata shown by `secrets-init --version`.

use std::process::Command;

const METADATA: &[(&str, &str)] = &[
    ("SECRETS_INIT_BUILD_DATE", "unknown"),
    ("SECRETS_INIT_COMMIT", "dirty"),
    ("SECRETS_INIT_BUILT_BY", "local"),
];

fn main() {
    for (name, default) in METADATA {
        println!("cargo::rerun-if-env-changed={name}");
        let value = std::env::var(name).unwrap_or_else(|_| (*default).to_string());
        println!("cargo::rustc-env={name}={value}");
    }

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rustc_version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map_or_else(
            || "unknown".to_string(),
            |output| String::from_utf8_lossy(&output.stdout).trim().to_string(),
        );
    println!("cargo::rustc-env=SECRETS_INIT_RUSTC_VERSION={rustc_version}");
}
