//! Background release of expired reservation holds.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::StockLedger;

/// Periodically releases expired, uncommitted holds so that an interrupted
/// placement cannot keep stock locked forever.
pub struct ReservationSweeper;

impl ReservationSweeper {
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// The loop runs until [`SweeperHandle::shutdown`] is called or the
    /// handle is dropped.
    pub fn spawn<L>(ledger: L, interval: Duration) -> SweeperHandle
    where
        L: StockLedger + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_ms = interval.as_millis() as u64, "reservation sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match ledger.release_expired(Utc::now()).await {
                            Ok(0) => {}
                            Ok(released) => {
                                tracing::info!(released, "expired reservations swept");
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "reservation sweep failed");
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("reservation sweeper stopped");
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }
}

/// Owns a running sweeper task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stops the sweeper and waits for the current sweep to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "reservation sweeper task ended abnormally");
        }
    }

    /// Returns true while the sweep loop is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
