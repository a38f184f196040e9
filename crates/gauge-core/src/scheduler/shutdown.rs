use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl-C), then cancel `token`.
///
/// Returns an error if the SIGTERM handler cannot be registered. The token is
/// cancelled either way so the scheduler never outlives a broken handler.
pub async fn wait_for_shutdown_signal(token: CancellationToken) -> std::io::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    token.cancel();
                    return Err(e);
                }
            };

        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            _ = ctrl_c => {
                info!(event = "core.scheduler.signal_received", signal = "SIGINT");
            }
            _ = sigterm.recv() => {
                info!(event = "core.scheduler.signal_received", signal = "SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            _ = ctrl_c => {
                info!(event = "core.scheduler.signal_received", signal = "SIGINT");
            }
        }
    }

    token.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_when_token_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        wait_for_shutdown_signal(token.clone()).await.unwrap();
        assert!(token.is_cancelled());
    }
}
