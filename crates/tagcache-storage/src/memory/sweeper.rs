//! Background eviction of expired entries

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::backend::Store;

/// Handle to the periodic sweep task of one memory store.
///
/// The task stops on [`Sweeper::shutdown`], when this handle is dropped
/// (the stop sender goes with it), or once the store itself is gone.
pub(crate) struct Sweeper {
    stop: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Start sweeping `store` every `period` on the current runtime.
    ///
    /// Returns `None` outside a tokio runtime.
    pub(crate) fn spawn(store: &Arc<Store>, period: Duration) -> Option<Self> {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    target: "tagcache::memory",
                    "no tokio runtime, expired entries will only be removed on demand"
                );
                return None;
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = handle.spawn(run(Arc::downgrade(store), period, stop_rx));
        debug!(target: "tagcache::memory", period_ms = period.as_millis() as u64, "sweeper started");

        Some(Self {
            stop: Mutex::new(Some(stop_tx)),
            task: Mutex::new(Some(task)),
        })
    }

    /// Stop the task and wait for it to exit. Later calls return at once.
    pub(crate) async fn shutdown(&self) {
        if let Some(stop) = self.stop.lock().take() {
            let _ = stop.send(());
        }

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(target: "tagcache::memory", error = %e, "sweeper task ended abnormally");
            }
        }
    }
}

async fn run(store: Weak<Store>, period: Duration, mut stop: oneshot::Receiver<()>) {
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else { break };
                let evicted = store.delete_expired();
                trace!(target: "tagcache::memory", evicted, "sweep finished");
            }
        }
    }

    debug!(target: "tagcache::memory", "sweeper stopped");
}
