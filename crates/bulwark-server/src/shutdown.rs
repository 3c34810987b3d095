//! Graceful shutdown signalling.
//!
//! A [`ShutdownSignal`] is a cloneable flag backed by a `tokio::sync::watch`
//! channel. Waiters registered before or after the trigger both complete.
//!
//! # Example
//!
//! ```rust,ignore
//! use bulwark_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::with_os_signals();
//! shutdown.wait().await;
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable, trigger-once shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Creates a signal triggered by SIGINT/SIGTERM (Ctrl+C elsewhere).
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });

        signal
    }

    /// Triggers shutdown. Later calls are no-ops.
    pub fn trigger(&self) {
        if !self.sender.send_replace(true) {
            tracing::info!("Shutdown requested");
        }
    }

    /// Returns `true` once triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes when the signal is triggered.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT"),
                }
                return;
            }
            Err(error) => {
                tracing::warn!(error = %error, "SIGTERM handler unavailable, listening for Ctrl+C only");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C"),
        Err(error) => {
            tracing::error!(error = %error, "Ctrl+C handler unavailable, shutdown must be triggered programmatically");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_signal_is_untriggered() {
        assert!(!ShutdownSignal::new().is_shutdown());
    }

    #[test]
    fn test_trigger_is_shared_between_clones() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();

        clone.trigger();
        clone.trigger();

        assert!(signal.is_shutdown());
        assert!(clone.is_shutdown());
    }

    #[tokio::test]
    async fn test_wait_completes_after_trigger() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("wait should complete");
    }

    #[tokio::test]
    async fn test_wait_completes_immediately_when_already_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(10), signal.wait())
            .await
            .expect("wait should complete immediately");
    }

    #[tokio::test]
    async fn test_wait_pends_while_untriggered() {
        let signal = ShutdownSignal::new();
        let result = tokio::time::timeout(Duration::from_millis(20), signal.wait()).await;
        assert!(result.is_err());
    }
}
