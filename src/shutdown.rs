use tokio_util::sync::CancellationToken;

/// Install an interrupt handler for the regression run.
///
/// Returns a `CancellationToken` that is cancelled on SIGINT or SIGTERM
/// (Ctrl-C on non-Unix platforms). The coordinator aborts its current
/// configuration as soon as the token fires; in-flight jobs are abandoned.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if wait_for_signal().await {
            token_clone.cancel();
        }
    });

    token
}

/// Resolves `true` once an interrupt arrives, `false` if no handler could be installed.
#[cfg(unix)]
async fn wait_for_signal() -> bool {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler");
            return false;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGINT handler");
            return false;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, aborting regression run");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT, aborting regression run");
        }
    }
    true
}

#[cfg(not(unix))]
async fn wait_for_signal() -> bool {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl-C, aborting regression run");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            false
        }
    }
}
