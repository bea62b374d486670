//! Signal handling for a secrets-init run

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Install signal handlers that cancel the returned token.
///
/// SIGTERM and SIGINT on unix, Ctrl+C elsewhere. In-flight backend calls observe the
/// token and fail as transient, so the run still writes whatever resolved.
/// Must be called from within a tokio runtime.
#[must_use]
pub fn install_signal_handlers() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        if wait_for_signal().await {
            trigger.cancel();
        }
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() -> bool {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "Failed to install signal handlers; run cannot be interrupted");
            return false;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, cancelling outstanding lookups"),
        _ = sigint.recv() => info!("Received SIGINT, cancelling outstanding lookups"),
    }
    true
}

#[cfg(not(unix))]
async fn wait_for_signal() -> bool {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, cancelling outstanding lookups");
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to install Ctrl+C handler; run cannot be interrupted");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_starts_uncancelled() {
        let token = install_signal_handlers();
        assert!(!token.is_cancelled());
    }
}
