//! Process lifecycle hooks
//!
//! `on_startup` runs once before the listener accepts connections and leaves
//! the upload directory present and empty. `on_shutdown` runs once after the
//! server has drained.

use tracing::{info, warn};

use crate::storage::{ClearReport, StorageDir};
use crate::types::AppResult;

/// Create the upload directory and clear out anything left from a previous run.
///
/// Only a failure to create the directory is returned. Cleanup problems are
/// logged by [`StorageDir::clear`] and reported, but never stop startup.
pub async fn on_startup(storage: &StorageDir) -> AppResult<ClearReport> {
    storage.ensure_exists().await?;

    let report = storage.clear().await;
    if !report.is_clean() {
        warn!(
            failed = report.failed,
            "Continuing startup with leftover entries in the upload directory"
        );
    }

    info!(path = %storage.root().display(), "Upload directory ready");
    Ok(report)
}

/// Nothing is torn down at shutdown; stored files stay until the next start.
pub async fn on_shutdown(storage: &StorageDir) {
    info!(path = %storage.root().display(), "File transfer server stopped");
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
