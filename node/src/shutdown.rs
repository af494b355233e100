//! Graceful shutdown on SIGINT/SIGTERM.

use tokio::signal;
use tokio::sync::watch;

/// Fans a single shutdown signal out to every task that asked for it.
///
/// A `watch` channel is used so that tasks subscribing after the signal
/// still observe it.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Future that resolves once shutdown has been triggered.
    pub fn signalled(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            // An error means the controller is gone, which is shutdown too.
            let _ = rx.wait_for(|stop| *stop).await;
        }
    }

    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Wait for SIGTERM or SIGINT (or a programmatic shutdown), then
    /// trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cannot install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
            _ = terminate => tracing::info!("received SIGTERM, shutting down"),
            _ = self.signalled() => {}
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
