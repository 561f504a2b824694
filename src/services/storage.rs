use crate::api::error::AppError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// The three independently-rooted storage areas backing the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Raw uploads
    Incoming,
    /// Conversion and merge results
    Output,
    /// Per-artifact preview bundles
    Preview,
}

impl StorageArea {
    pub const ALL: [StorageArea; 3] = [
        StorageArea::Incoming,
        StorageArea::Output,
        StorageArea::Preview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Incoming => "incoming",
            StorageArea::Output => "output",
            StorageArea::Preview => "preview",
        }
    }
}

/// Filesystem-backed storage for the pipeline. Pure path conventions:
/// no cross-area operations, no locking.
pub struct StorageService {
    incoming: PathBuf,
    output: PathBuf,
    preview: PathBuf,
}

impl StorageService {
    pub fn new(incoming: PathBuf, output: PathBuf, preview: PathBuf) -> Self {
        Self {
            incoming,
            output,
            preview,
        }
    }

    pub fn root(&self, area: StorageArea) -> &Path {
        match area {
            StorageArea::Incoming => &self.incoming,
            StorageArea::Output => &self.output,
            StorageArea::Preview => &self.preview,
        }
    }

    /// Resolve a relative name inside one area. No I/O.
    pub fn resolve(&self, area: StorageArea, relative: &str) -> PathBuf {
        self.root(area).join(relative)
    }

    /// Idempotent directory creation for one area. Fails with
    /// `StorageUnavailable` when the path exists but is not a writable
    /// directory.
    pub async fn ensure(&self, area: StorageArea) -> Result<(), AppError> {
        let root = self.root(area);

        match fs::metadata(root).await {
            Ok(meta) => {
                if !meta.is_dir() {
                    return Err(AppError::StorageUnavailable(format!(
                        "{} area path {} exists but is not a directory",
                        area.as_str(),
                        root.display()
                    )));
                }
                if meta.permissions().readonly() {
                    return Err(AppError::StorageUnavailable(format!(
                        "{} area path {} is not writable",
                        area.as_str(),
                        root.display()
                    )));
                }
                Ok(())
            }
            Err(_) => fs::create_dir_all(root).await.map_err(|e| {
                AppError::StorageUnavailable(format!(
                    "failed to create {} area at {}: {}",
                    area.as_str(),
                    root.display(),
                    e
                ))
            }),
        }
    }

    pub async fn ensure_all(&self) -> Result<(), AppError> {
        for area in StorageArea::ALL {
            self.ensure(area).await?;
        }
        Ok(())
    }
}
