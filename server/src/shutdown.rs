//! Graceful shutdown signal shared by every listener of a process.

use tokio::signal;
use tokio::sync::watch;

/// Fires every [`Shutdown`] made from the same channel.
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    /// Signal shutdown.
    pub fn fire(&self) {
        self.0.send_replace(true);
    }
}

/// Cloneable handle that resolves once shutdown was signalled.
#[derive(Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    /// A trigger and its first handle.
    #[must_use]
    pub fn channel() -> (ShutdownTrigger, Self) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger(tx), Self(rx))
    }

    /// A handle fired by Ctrl+C or SIGTERM.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn on_signal() -> Self {
        let (trigger, shutdown) = Self::channel();
        tokio::spawn(async move {
            wait_for_signal().await;
            trigger.fire();
        });
        shutdown
    }

    /// Wait for shutdown.
    pub async fn wait(mut self) {
        // A dropped trigger also ends the wait.
        let _ = self.0.wait_for(|stop| *stop).await;
    }
}

/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn wait_for_signal() {
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
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn every_handle_observes_the_trigger() {
        let (trigger, shutdown) = Shutdown::channel();
        let first = tokio::spawn(shutdown.clone().wait());
        let second = tokio::spawn(shutdown.wait());

        trigger.fire();

        tokio::time::timeout(Duration::from_secs(1), first)
            .await
            .unwrap()
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), second)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn handle_made_after_firing_resolves_immediately() {
        let (trigger, shutdown) = Shutdown::channel();
        trigger.fire();
        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pending_until_fired() {
        let (_trigger, shutdown) = Shutdown::channel();
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown.wait()).await;
        assert!(waited.is_err());
    }
}
