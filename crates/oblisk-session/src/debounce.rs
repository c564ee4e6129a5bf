//! Per-window debounce
//!
//! Each window gets one worker task fed by a channel. A signal arms the
//! worker; every further signal inside the quiet period restarts it. When the
//! period passes without a signal the action runs once. Signals that arrive
//! while the action is running are held in the channel and start the next
//! cycle, so a window never has two actions in flight.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use oblisk_tabs::WindowId;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);

pub struct Debouncer {
    quiet_period: Duration,
    workers: Arc<RwLock<HashMap<WindowId, mpsc::UnboundedSender<()>>>>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            workers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Arm or re-arm `window`. `action` is only used when no worker is
    /// running for the window yet.
    pub fn signal<F, Fut>(&self, window: WindowId, action: F)
    where
        F: Fn(WindowId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut workers = self.workers.write();

        if let Some(worker) = workers.get(&window) {
            if worker.send(()).is_ok() {
                return;
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(());
        workers.insert(window, tx);

        tracing::debug!(window_id = window, "Debounce worker started");
        tokio::spawn(run_worker(window, self.quiet_period, rx, action));
    }

    /// Drop the pending cycle for `window`. An action already running
    /// finishes.
    pub fn cancel(&self, window: WindowId) {
        if self.workers.write().remove(&window).is_some() {
            tracing::debug!(window_id = window, "Debounce cancelled");
        }
    }

    pub fn cancel_all(&self) {
        self.workers.write().clear();
    }

    pub fn is_armed(&self, window: WindowId) -> bool {
        self.workers.read().contains_key(&window)
    }
}

impl Clone for Debouncer {
    fn clone(&self) -> Self {
        Self {
            quiet_period: self.quiet_period,
            workers: Arc::clone(&self.workers),
        }
    }
}

async fn run_worker<F, Fut>(
    window: WindowId,
    quiet_period: Duration,
    mut signals: mpsc::UnboundedReceiver<()>,
    action: F,
) where
    F: Fn(WindowId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    while signals.recv().await.is_some() {
        loop {
            tokio::select! {
                signal = signals.recv() => {
                    if signal.is_none() {
                        return;
                    }
                }
                _ = tokio::time::sleep(quiet_period) => break,
            }
        }

        action(window).await;
    }
}
