//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl+C) or SIGTERM
//! - Trigger graceful shutdown
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A handler that fails to install is logged and never fires

use tokio::signal;

use crate::lifecycle::Shutdown;

/// Resolve once a termination signal arrives.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "SIGINT", "Signal received"),
        _ = terminate => tracing::info!(signal = "SIGTERM", "Signal received"),
    }
}

/// Trigger `shutdown` when a termination signal arrives.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    wait_for_signal().await;
    shutdown.trigger();
}
