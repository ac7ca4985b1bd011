use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Token cancelled on SIGTERM, SIGINT, or once `deadline` has elapsed.
///
/// Every external call of a discovery run watches this token, so firing it
/// kills in-flight child processes.
pub fn install_shutdown_handler(deadline: Option<Duration>) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Could not install signal handlers");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, cancelling discovery");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, cancelling discovery");
            }
        }

        token_clone.cancel();
    });

    if let Some(deadline) = deadline {
        let token_clone = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => {
                    tracing::warn!(timeout_secs = deadline.as_secs(), "Run deadline reached, cancelling discovery");
                    token_clone.cancel();
                }
                _ = token_clone.cancelled() => {}
            }
        });
    }

    token
}
