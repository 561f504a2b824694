use crate::services::storage::{StorageArea, StorageService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Background task that periodically deletes anything older than the
/// retention window from all three storage areas. Failures in one area or
/// on one entry never stop the rest of the sweep.
pub struct RetentionSweeper {
    storage: Arc<StorageService>,
    retention: Duration,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl RetentionSweeper {
    pub fn new(
        storage: Arc<StorageService>,
        retention: Duration,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            storage,
            retention,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            "🧹 Retention sweeper started (window: {:?}, interval: {:?})",
            self.retention,
            self.interval
        );

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Retention sweeper shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.sweep().await;
                }
            }
        }
    }

    /// One full pass over every area. Returns the number of deleted entries.
    pub async fn sweep(&self) -> usize {
        let mut removed = 0;
        for area in StorageArea::ALL {
            removed += self.sweep_area(area).await;
        }
        tracing::info!("Retention sweep completed, removed {} entries", removed);
        removed
    }

    async fn sweep_area(&self, area: StorageArea) -> usize {
        let root = self.storage.root(area);
        let mut entries = match tokio::fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Skipping {} area, cannot list {}: {}",
                    area.as_str(),
                    root.display(),
                    e
                );
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Listing error in {} area: {}", area.as_str(), e);
                    break;
                }
            };

            let age = match entry.metadata().await.and_then(|m| {
                m.modified()
                    .map(|modified| modified.elapsed().unwrap_or_default())
            }) {
                Ok(age) => age,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            if age <= self.retention {
                continue;
            }

            let path = entry.path();
            let result = if path.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };

            match result {
                Ok(()) => {
                    tracing::info!("Expired {}", path.display());
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to delete {}: {}", path.display(), e);
                }
            }
        }
        removed
    }
}
