use docpipe::services::storage::{StorageArea, StorageService};
use docpipe::services::sweeper::RetentionSweeper;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

fn storage_in(dir: &Path) -> Arc<StorageService> {
    Arc::new(StorageService::new(
        dir.join("incoming"),
        dir.join("output"),
        dir.join("preview"),
    ))
}

fn sweeper_with_window(storage: Arc<StorageService>, retention: Duration) -> RetentionSweeper {
    let (_tx, rx) = watch::channel(false);
    // Interval is irrelevant here; tests drive sweeps directly
    RetentionSweeper::new(storage, retention, Duration::from_secs(3600), rx)
}

#[tokio::test]
async fn test_expired_entries_are_deleted_in_all_areas() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(dir.path());
    storage.ensure_all().await.unwrap();

    std::fs::write(storage.resolve(StorageArea::Incoming, "upload.bin"), b"x").unwrap();
    std::fs::write(storage.resolve(StorageArea::Output, "report.docx"), b"x").unwrap();
    // Preview bundles are directories
    let bundle = storage.resolve(StorageArea::Preview, "report-abc");
    std::fs::create_dir(&bundle).unwrap();
    std::fs::write(bundle.join("preview.html"), b"x").unwrap();
    std::fs::write(bundle.join("p_1.png"), b"x").unwrap();

    // Everything is already older than a zero-length window
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sweeper = sweeper_with_window(storage.clone(), Duration::ZERO);
    let removed = sweeper.sweep().await;

    assert_eq!(removed, 3);
    assert!(!storage.resolve(StorageArea::Incoming, "upload.bin").exists());
    assert!(!storage.resolve(StorageArea::Output, "report.docx").exists());
    assert!(!bundle.exists());
}

#[tokio::test]
async fn test_young_entries_survive() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(dir.path());
    storage.ensure_all().await.unwrap();

    let fresh = storage.resolve(StorageArea::Output, "fresh.pdf");
    std::fs::write(&fresh, b"x").unwrap();

    let sweeper = sweeper_with_window(storage.clone(), Duration::from_secs(3600));
    let removed = sweeper.sweep().await;

    assert_eq!(removed, 0);
    assert!(fresh.exists());
}

#[tokio::test]
async fn test_missing_area_does_not_stop_sibling_sweeps() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(dir.path());

    // Incoming is deliberately absent; only output and preview exist
    storage.ensure(StorageArea::Output).await.unwrap();
    storage.ensure(StorageArea::Preview).await.unwrap();

    let stale_output = storage.resolve(StorageArea::Output, "old.docx");
    std::fs::write(&stale_output, b"x").unwrap();
    let stale_bundle = storage.resolve(StorageArea::Preview, "old-bundle");
    std::fs::create_dir(&stale_bundle).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let sweeper = sweeper_with_window(storage.clone(), Duration::ZERO);
    let removed = sweeper.sweep().await;

    assert_eq!(removed, 2);
    assert!(!stale_output.exists());
    assert!(!stale_bundle.exists());
}

#[tokio::test]
async fn test_sweep_is_repeatable_after_partial_failures() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(dir.path());
    storage.ensure_all().await.unwrap();

    std::fs::write(storage.resolve(StorageArea::Output, "old.pdf"), b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sweeper = sweeper_with_window(storage.clone(), Duration::ZERO);
    assert_eq!(sweeper.sweep().await, 1);
    // Nothing left, next tick is a no-op rather than an error
    assert_eq!(sweeper.sweep().await, 0);
}
