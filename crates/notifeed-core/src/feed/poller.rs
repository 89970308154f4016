//! Snapshot poll loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::Error;
use crate::backend::NotificationBackend;
use crate::record::RawNotification;

/// A listing fetched by the poll loop.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Poll number, starting at 1 for the initial load.
    pub poll: u64,
    /// Records exactly as the backend returned them.
    pub records: Vec<RawNotification>,
}

/// Handle to a running poll task.
///
/// Dropping the handle signals the task to stop.
#[derive(Debug)]
pub(crate) struct Poller {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Spawns the poll loop on the current tokio runtime.
    ///
    /// The first poll fires immediately.
    pub(crate) fn spawn<B>(
        backend: Arc<B>,
        interval: Duration,
        snapshots: watch::Sender<Option<Snapshot>>,
    ) -> Self
    where
        B: NotificationBackend + 'static,
    {
        let (cancel, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(run(backend, interval, snapshots, cancel_rx));
        Self { cancel, task }
    }

    /// Stops the loop and waits for the task to finish.
    ///
    /// A fetch still in flight is dropped, never delivered.
    pub(crate) async fn shutdown(mut self) {
        self.cancel.send_replace(true);
        match (&mut self.task).await {
            Err(e) if e.is_panic() => warn!("Poll task panicked: {e}"),
            _ => {}
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

async fn run<B>(
    backend: Arc<B>,
    interval: Duration,
    snapshots: watch::Sender<Option<Snapshot>>,
    mut cancel: watch::Receiver<bool>,
) where
    B: NotificationBackend,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut poll = 0_u64;

    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            _ = ticker.tick() => {}
        }

        poll += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.changed() => break,
            result = backend.list_active() => result,
        };

        match result {
            Ok(records) => {
                debug!(poll, count = records.len(), "Fetched snapshot");
                // Replaces any snapshot the feed has not applied yet.
                if snapshots.send(Some(Snapshot { poll, records })).is_err() {
                    break;
                }
            }
            Err(e) => warn!(poll, "{}", Error::SnapshotFetch(e)),
        }
    }

    debug!(polls = poll, "Poller stopped");
}
