//! Command line definition

use crate::tracing::{LogLevel, TracingConfig, TracingFormat};
use clap::{Parser, ValueEnum};
use secrets_init_core::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT, ProviderKind, ResolveConfig};
use std::path::PathBuf;
use std::time::Duration;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nbuild date: ",
    env!("SECRETS_INIT_BUILD_DATE"),
    "\ncommit: ",
    env!("SECRETS_INIT_COMMIT"),
    "\nbuilt by: ",
    env!("SECRETS_INIT_BUILT_BY"),
    "\nrustc: ",
    env!("SECRETS_INIT_RUSTC_VERSION"),
);

/// Secrets provider family
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// AWS Secrets Manager and SSM Parameter Store
    Aws,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Aws => Self::Aws,
        }
    }
}

/// Where resolved secrets go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Read the process environment and write a sourceable `#!/bin/sh` script to PATH
    Shell,
    /// Read references from the INI file at PATH and write values back in place
    Ini,
}

/// Enrich environment variables with secrets from AWS Secrets Manager and SSM
/// Parameter Store.
///
/// Variables whose value is a Secrets Manager or Parameter Store ARN are replaced by
/// the secret they point to.
#[derive(Parser, Debug)]
#[command(name = "secrets-init")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Resolve cloud secret references in environment variables")]
pub struct Cli {
    /// Output script (shell mode) or INI file to rewrite (ini mode)
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Secrets provider
    #[arg(
        short = 'p',
        long,
        env = "SECRETS_INIT_PROVIDER",
        default_value = "aws",
        value_enum
    )]
    pub provider: ProviderArg,

    /// Output mode
    #[arg(
        long,
        env = "SECRETS_INIT_MODE",
        default_value = "shell",
        value_enum
    )]
    pub mode: OutputMode,

    /// Also export variables that are not secret references (shell mode)
    #[arg(long, env = "SECRETS_INIT_PASSTHROUGH")]
    pub passthrough: bool,

    /// Maximum number of backend calls in flight
    #[arg(
        long,
        env = "SECRETS_INIT_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = clap::value_parser!(usize)
    )]
    pub concurrency: usize,

    /// Deadline for the whole resolution pass, in seconds
    #[arg(long, env = "SECRETS_INIT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Logging verbosity
    #[arg(short = 'L', long, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,
}

impl Cli {
    /// Resolution settings derived from the command line.
    #[must_use]
    pub fn resolve_config(&self) -> ResolveConfig {
        ResolveConfig::default()
            .with_concurrency(self.concurrency)
            .with_timeout(Duration::from_secs(self.timeout))
    }

    /// Tracing settings derived from the command line.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: self.log_format,
            level: self.log_level.into(),
        }
    }
}

/// Parse command line arguments into a CLI structure.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracing::Level;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["secrets-init", "/tmp/env.sh"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("/tmp/env.sh"));
        assert_eq!(cli.provider, ProviderArg::Aws);
        assert_eq!(cli.mode, OutputMode::Shell);
        assert!(!cli.passthrough);
        assert_eq!(cli.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.log_format, TracingFormat::Compact);
    }

    #[test]
    fn path_is_required() {
        let err = Cli::try_parse_from(["secrets-init"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["secrets-init", "-p", "azure", "out.sh"]).is_err());
    }

    #[test]
    fn ini_mode_and_passthrough() {
        let cli =
            Cli::try_parse_from(["secrets-init", "--mode", "ini", "--passthrough", "app.ini"])
                .unwrap();
        assert_eq!(cli.mode, OutputMode::Ini);
        assert!(cli.passthrough);
    }

    #[test]
    fn resolve_config_follows_flags() {
        let cli = Cli::try_parse_from([
            "secrets-init",
            "--concurrency",
            "0",
            "--timeout",
            "5",
            "out.sh",
        ])
        .unwrap();
        let config = cli.resolve_config();
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn tracing_config_follows_flags() {
        let cli = Cli::try_parse_from([
            "secrets-init",
            "-L",
            "debug",
            "--log-format",
            "json",
            "out.sh",
        ])
        .unwrap();
        let config = cli.tracing_config();
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, TracingFormat::Json);
    }

    #[test]
    fn provider_arg_maps_to_kind() {
        assert_eq!(ProviderKind::from(ProviderArg::Aws), ProviderKind::Aws);
    }
}
