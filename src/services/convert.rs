use crate::api::error::AppError;
use crate::models::{OutputArtifact, UploadedFile};
use crate::services::engine::{ConversionProfile, DocumentEngine};
use crate::services::storage::{StorageArea, StorageService};
use crate::utils::validation::file_base_name;
use std::str::FromStr;
use std::sync::Arc;

/// The recognized, finite set of conversion targets. Anything else is
/// rejected before the engine is ever invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Docx,
    Xlsx,
    Pptx,
    Jpg,
    Png,
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docx" => Ok(OutputFormat::Docx),
            "xlsx" => Ok(OutputFormat::Xlsx),
            "pptx" => Ok(OutputFormat::Pptx),
            "jpg" => Ok(OutputFormat::Jpg),
            "png" => Ok(OutputFormat::Png),
            other => Err(AppError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Pptx => "pptx",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn profile(&self) -> ConversionProfile {
        match self {
            OutputFormat::Docx => ConversionProfile::WordProcessing,
            OutputFormat::Xlsx => ConversionProfile::Spreadsheet,
            OutputFormat::Pptx => ConversionProfile::Presentation,
            OutputFormat::Jpg | OutputFormat::Png => ConversionProfile::Image,
        }
    }
}

/// Turns one upload plus a requested output format into an output artifact.
pub struct ConvertService {
    storage: Arc<StorageService>,
    engine: Arc<dyn DocumentEngine>,
}

impl ConvertService {
    pub fn new(storage: Arc<StorageService>, engine: Arc<dyn DocumentEngine>) -> Self {
        Self { storage, engine }
    }

    /// Convert `upload` into `format`. Writes exactly one file under the
    /// output area on success; engine errors are wrapped without leaking
    /// internals to the caller.
    pub async fn convert(
        &self,
        upload: &UploadedFile,
        format: OutputFormat,
    ) -> Result<OutputArtifact, AppError> {
        self.storage.ensure(StorageArea::Output).await?;

        let base = file_base_name(&upload.original_name);
        let file_name = format!("{}.{}", base, format.extension());
        let dest = self.storage.resolve(StorageArea::Output, &file_name);

        self.engine
            .convert(&upload.path, &dest, format.profile())
            .await
            .map_err(|e| AppError::ConversionEngineFailure(e.into()))?;

        tracing::info!(
            "Converted {} -> {}",
            upload.original_name,
            dest.display()
        );

        Ok(OutputArtifact { file_name, path: dest })
    }
}
