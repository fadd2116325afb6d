// src/shutdown.rs
//
// Write-once shutdown signal plus the adapter that bridges OS interrupts to
// it. The publish loop only ever sees the observer side.

use futures::future;
use tokio::sync::watch;
use tracing::{error, info};

/// Creates the trigger/observer pair for one graceful-shutdown signal.
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

/// Trigger side. Setting the signal is idempotent; once set it can never be
/// unset.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side, cloneable so several tasks could watch the same signal.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Suspends until shutdown has been requested. If the handle is dropped
    /// without ever triggering, shutdown can no longer happen and this stays
    /// pending forever.
    pub async fn requested(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            future::pending::<()>().await;
        }
    }
}

/// Spawns the lightweight listener that maps Ctrl+C (and SIGTERM on unix)
/// onto the shutdown handle, then exits.
pub fn listen_for_interrupt(handle: ShutdownHandle) {
    tokio::spawn(async move {
        if let Err(e) = interrupted().await {
            error!("failed to listen for interrupt signals: {}", e);
            return;
        }
        info!("interrupt received, requesting shutdown");
        handle.trigger();
    });
}

#[cfg(unix)]
async fn interrupted() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn interrupted() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_starts_unset() {
        let (_handle, signal) = shutdown_channel();
        assert!(!signal.is_requested());
    }

    #[tokio::test]
    async fn trigger_is_observed_and_idempotent() {
        let (handle, mut signal) = shutdown_channel();

        handle.trigger();
        handle.trigger();

        assert!(signal.is_requested());
        signal.requested().await;
    }

    #[tokio::test]
    async fn all_clones_observe_the_same_signal() {
        let (handle, signal) = shutdown_channel();
        let mut first = signal.clone();
        let mut second = signal;

        handle.trigger();

        first.requested().await;
        second.requested().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_does_not_fake_a_shutdown() {
        let (handle, mut signal) = shutdown_channel();
        drop(handle);

        let wait = tokio::time::timeout(Duration::from_secs(5), signal.requested()).await;
        assert!(wait.is_err(), "requested() must stay pending");
        assert!(!signal.is_requested());
    }
}
