use crate::api::error::AppError;
use crate::models::PreviewBundle;
use crate::services::engine::{DocumentEngine, EngineError};
use crate::services::storage::{StorageArea, StorageService};
use crate::utils::validation::file_base_name;
use anyhow::anyhow;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the consolidated view file inside every bundle
pub const VIEW_FILE_NAME: &str = "preview.html";

/// Turns any artifact into a preview bundle: one consolidated view with
/// embedded resources plus one image per page.
pub struct PreviewService {
    storage: Arc<StorageService>,
    engine: Arc<dyn DocumentEngine>,
}

impl PreviewService {
    pub fn new(storage: Arc<StorageService>, engine: Arc<dyn DocumentEngine>) -> Self {
        Self { storage, engine }
    }

    /// Generate a bundle for `source`, filed under a key derived from
    /// `logical_name`. Keys carry a random suffix so two concurrent
    /// operations on files with the same original name never alias the
    /// same bundle.
    pub async fn generate(
        &self,
        source: &Path,
        logical_name: &str,
    ) -> Result<PreviewBundle, AppError> {
        self.storage.ensure(StorageArea::Preview).await?;

        let key = format!(
            "{}-{}",
            file_base_name(logical_name),
            Uuid::new_v4().simple()
        );
        let bundle_dir = self.storage.resolve(StorageArea::Preview, &key);

        // Never reuse a stale bundle for this key
        if bundle_dir.exists() {
            tokio::fs::remove_dir_all(&bundle_dir).await?;
        }
        tokio::fs::create_dir_all(&bundle_dir).await?;

        let view_path = bundle_dir.join(VIEW_FILE_NAME);
        self.engine
            .render_view(source, &view_path)
            .await
            .map_err(map_engine_error)?;

        let page_count = self
            .engine
            .render_pages(source, &bundle_dir)
            .await
            .map_err(map_engine_error)?;

        // The reported count must match what actually landed on disk
        let materialized = count_page_images(&bundle_dir).await?;
        if materialized != page_count {
            return Err(AppError::PreviewEngineFailure(anyhow!(
                "engine reported {} pages but wrote {} page images",
                page_count,
                materialized
            )));
        }

        tracing::info!(
            "Generated preview bundle {} ({} pages)",
            key,
            page_count
        );

        Ok(PreviewBundle {
            key,
            root_path: bundle_dir,
            page_count,
        })
    }
}

fn map_engine_error(e: EngineError) -> AppError {
    match e {
        EngineError::UnsupportedSource(name) => AppError::UnsupportedSourceFormat(name),
        EngineError::Failed(e) => AppError::PreviewEngineFailure(e),
    }
}

async fn count_page_images(bundle_dir: &Path) -> Result<usize, AppError> {
    let mut count = 0;
    let mut entries = tokio::fs::read_dir(bundle_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("p_") && name.ends_with(".png") {
            count += 1;
        }
    }
    Ok(count)
}
