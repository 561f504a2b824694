use crate::api::error::AppError;
use crate::models::{OutputArtifact, UploadedFile};
use crate::services::engine::DocumentEngine;
use crate::services::storage::{StorageArea, StorageService};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Turns an ordered list of uploads into one combined output artifact.
pub struct MergeService {
    storage: Arc<StorageService>,
    engine: Arc<dyn DocumentEngine>,
}

impl MergeService {
    pub fn new(storage: Arc<StorageService>, engine: Arc<dyn DocumentEngine>) -> Self {
        Self { storage, engine }
    }

    /// Merge `uploads` strictly in input order into a single artifact.
    /// The output name carries the creation timestamp plus a random
    /// component so concurrent merges can never target the same path.
    pub async fn merge(&self, uploads: &[UploadedFile]) -> Result<OutputArtifact, AppError> {
        if uploads.is_empty() {
            return Err(AppError::EmptyInputSet);
        }

        self.storage.ensure(StorageArea::Output).await?;

        let file_name = merged_file_name();
        let dest = self.storage.resolve(StorageArea::Output, &file_name);
        let sources: Vec<_> = uploads.iter().map(|u| u.path.clone()).collect();

        if let Err(e) = self.engine.merge(&sources, &dest).await {
            // Never expose a partial artifact on failure
            if dest.exists() {
                let _ = tokio::fs::remove_file(&dest).await;
            }
            return Err(AppError::MergeEngineFailure(e.into()));
        }

        tracing::info!("Merged {} files -> {}", uploads.len(), dest.display());

        Ok(OutputArtifact { file_name, path: dest })
    }
}

fn merged_file_name() -> String {
    format!(
        "merged_{}_{}.pdf",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}
