//! Signal handling for graceful shutdown

use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, warn};

/// Handles shutdown signals (SIGTERM, SIGINT)
#[derive(Debug, Default)]
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Wait for SIGTERM or SIGINT.
    ///
    /// If the handlers cannot be registered, falls back to Ctrl-C.
    pub async fn wait(&self) {
        let handlers = signal(SignalKind::terminate())
            .and_then(|term| signal(SignalKind::interrupt()).map(|int| (term, int)));

        match handlers {
            Ok((mut sigterm, mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        debug!("received SIGTERM");
                    }
                    _ = sigint.recv() => {
                        debug!("received SIGINT");
                    }
                }
            }
            Err(e) => {
                warn!(?e, "failed to register signal handlers, waiting for Ctrl-C");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(?e, "failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}
