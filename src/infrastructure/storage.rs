use crate::api::error::AppError;
use crate::config::PipelineConfig;
use crate::services::storage::StorageService;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &PipelineConfig) -> Result<Arc<StorageService>, AppError> {
    let storage = StorageService::new(
        config.incoming_dir.clone(),
        config.output_dir.clone(),
        config.preview_dir.clone(),
    );

    storage.ensure_all().await?;

    info!(
        "📁 Storage areas ready: incoming={}, output={}, preview={}",
        config.incoming_dir.display(),
        config.output_dir.display(),
        config.preview_dir.display()
    );

    Ok(Arc::new(storage))
}
