//! Configuration file watcher for hot reload.
//!
//! One `notify` watcher observes the config directory. Its callback only
//! forwards matching events into a channel; a single tokio task consumes
//! them, debounces bursts per file and performs validate-and-swap on the
//! owning store. Failed revalidations keep the old document and are logged.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::config::store::ConfigStore;

/// Default quiet period before a changed file is reloaded.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to create file watcher: {0}")]
    Init(#[from] notify::Error),
}

/// Running watcher. Dropping it stops file notifications.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
    reloads: watch::Receiver<u64>,
}

impl ConfigWatcher {
    /// Watch `dir` and keep `stores` in sync with their files.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        dir: &Path,
        stores: Vec<Arc<ConfigStore>>,
        debounce: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Self, WatcherError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (reload_tx, reloads) = watch::channel(0u64);

        let names: Vec<Option<OsString>> = stores
            .iter()
            .map(|s| s.path().file_name().map(|n| n.to_os_string()))
            .collect();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !is_content_change(&event.kind) {
                        return;
                    }
                    for (idx, name) in names.iter().enumerate() {
                        let hit = event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == *name);
                        if hit {
                            let _ = event_tx.send(idx);
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %dir.display(), files = stores.len(), "Config watcher started");

        let task = tokio::spawn(consume(stores, event_rx, reload_tx, debounce, shutdown));

        Ok(Self {
            _watcher: watcher,
            task,
            reloads,
        })
    }

    /// Receiver that ticks once per successful cache swap.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.reloads.clone()
    }

    /// Stop watching and wait for the consumer task to finish.
    pub async fn stop(self) {
        let ConfigWatcher {
            _watcher: watcher,
            task,
            ..
        } = self;
        // Closing the event channel ends the consumer loop.
        drop(watcher);
        let _ = task.await;
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}

/// Single consumer: debounce per store, then revalidate.
async fn consume(
    stores: Vec<Arc<ConfigStore>>,
    mut events: mpsc::UnboundedReceiver<usize>,
    reloads: watch::Sender<u64>,
    debounce: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut pending: HashMap<usize, Instant> = HashMap::new();

    loop {
        let next_due = pending.values().min().copied();

        tokio::select! {
            msg = events.recv() => match msg {
                Some(idx) => {
                    pending.insert(idx, Instant::now() + debounce);
                }
                None => break,
            },
            _ = wait_until(next_due) => {
                let now = Instant::now();
                let due: Vec<usize> = pending
                    .iter()
                    .filter(|(_, at)| **at <= now)
                    .map(|(idx, _)| *idx)
                    .collect();
                for idx in due {
                    pending.remove(&idx);
                    if let Some(store) = stores.get(idx) {
                        revalidate(store, &reloads);
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Config watcher received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

fn revalidate(store: &ConfigStore, reloads: &watch::Sender<u64>) {
    tracing::info!(section = %store.section(), "Config file change detected, reloading...");
    match store.revalidate() {
        Ok(()) => {
            reloads.send_modify(|generation| *generation += 1);
            tracing::info!(section = %store.section(), "Config reloaded");
        }
        Err(e) => {
            tracing::warn!(
                section = %store.section(),
                error = %e,
                "Failed to reload config. Keeping current configuration."
            );
        }
    }
}
