use crate::config::PipelineConfig;
use crate::services::engine::{DocumentEngine, PdfEngine};
use std::sync::Arc;
use tracing::{info, warn};

pub fn setup_engine(config: &PipelineConfig) -> Arc<dyn DocumentEngine> {
    match config.engine_type.as_str() {
        "pdf" => {
            info!(
                "📄 Document engine: pdf (pdftocairo={}, soffice={})",
                config.pdftocairo_path, config.soffice_path
            );
            Arc::new(PdfEngine::new(
                config.pdftocairo_path.clone(),
                config.soffice_path.clone(),
            ))
        }
        other => {
            warn!("Unknown ENGINE_TYPE '{}', falling back to pdf", other);
            Arc::new(PdfEngine::new(
                config.pdftocairo_path.clone(),
                config.soffice_path.clone(),
            ))
        }
    }
}
