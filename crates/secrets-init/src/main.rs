//! secrets-init binary
//!
//! Parses the command line, installs logging and signal handling, runs one
//! resolution pass and maps the outcome to the process exit code.

// Fatal errors are rendered to stderr before tracing is guaranteed to be up
#![allow(clippy::print_stderr)]

use secrets_init::cli;
use secrets_init::errors::{CliError, EXIT_OK, exit_code_for};
use secrets_init::shutdown::install_signal_handlers;
use secrets_init::tracing::init_tracing;

fn main() {
    // Tracing may be unusable during a panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let exit_code = match execute(&cli) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            let code = exit_code_for(&err);
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(exit_code);
}

fn execute(cli: &cli::Cli) -> Result<(), CliError> {
    init_tracing(cli.tracing_config())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime(e.to_string()))?;

    runtime.block_on(async {
        let cancel = install_signal_handlers();
        secrets_init::run(cli, &cancel).await.map(|_| ())
    })
}
